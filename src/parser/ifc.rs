use std::path::Path;

use tracing::{debug, info};

use crate::error::ParseError;
use crate::graph::{attr, ifc, ElementId, MemoryModel, RelationKind, Value};
use crate::parser::step::{StepEntity, StepFile, StepValue};

/// Upper bound on `PlacementRelTo` hops when accumulating a placement.
const MAX_PLACEMENT_DEPTH: usize = 32;

/// Loads an IFC file into an in-memory element graph.
///
/// Supports both IFC2x3 and IFC4 schemas. Maps:
/// - GlobalId, Name and Description of rooted entities
/// - storey elevations and product placement points
/// - spatial containment, aggregation and nesting
/// - property sets with their single-value properties
/// - element connections, material associations and space boundaries
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read.
/// Returns [`ParseError::InvalidStep`] if the file has no DATA section.
///
/// # Example
///
/// ```no_run
/// use hvac_classifier::graph::ModelGraph;
/// use hvac_classifier::parser::load_ifc_file;
///
/// let model = load_ifc_file("model.ifc")?;
/// println!("pumps: {}", model.elements_of_type("IfcPump").len());
/// # Ok::<(), hvac_classifier::error::ParseError>(())
/// ```
pub fn load_ifc_file<P: AsRef<Path>>(path: P) -> Result<MemoryModel, ParseError> {
    let content = std::fs::read_to_string(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let step_file = StepFile::parse(&content)?;
    let model = model_from_step(&step_file);

    info!(
        path = %path.as_ref().display(),
        schema = %step_file.schema,
        entities = model.len(),
        "loaded IFC model"
    );
    Ok(model)
}

/// Maps parsed STEP entities onto a [`MemoryModel`].
#[must_use]
pub fn model_from_step(step: &StepFile) -> MemoryModel {
    let mut model = MemoryModel::new();

    // Nodes first so edges can point forward.
    for entity in step.entities() {
        add_node(&mut model, step, entity);
    }
    for entity in step.entities() {
        add_edges(&mut model, step, entity);
    }

    debug!(nodes = model.len(), "element graph built");
    model
}

fn add_node(model: &mut MemoryModel, step: &StepFile, entity: &StepEntity) {
    let id = entity.id;

    if entity.entity_type.starts_with("IFCRELSPACEBOUNDARY") {
        model.insert(id, ifc::REL_SPACE_BOUNDARY);
        return;
    }
    model.insert(id, entity.entity_type.as_str());

    match entity.entity_type.as_str() {
        "IFCPROPERTYSINGLEVALUE" => {
            set_value(model, id, attr::NAME, entity.value(0));
            set_value(model, id, attr::NOMINAL_VALUE, entity.value(2));
        }
        "IFCMATERIAL" => set_value(model, id, attr::NAME, entity.value(0)),
        "IFCMATERIALLAYER" => set_value(model, id, attr::LAYER_THICKNESS, entity.value(1)),
        _ if is_rooted(entity) => {
            set_value(model, id, attr::GLOBAL_ID, entity.value(0));
            set_value(model, id, attr::NAME, entity.value(2));
            set_value(model, id, attr::DESCRIPTION, entity.value(3));

            if entity.is(ifc::BUILDING_STOREY) {
                set_value(model, id, attr::ELEVATION, entity.value(9));
            }
            if let Some(point) = entity
                .value(5)
                .and_then(StepValue::as_reference)
                .and_then(|placement| placement_point(step, placement))
            {
                model.set_attribute(
                    id,
                    attr::PLACEMENT,
                    Value::List(point.into_iter().map(Value::Real).collect()),
                );
            }
        }
        _ => {}
    }
}

fn add_edges(model: &mut MemoryModel, step: &StepFile, entity: &StepEntity) {
    let id = entity.id;
    let refs = |index: usize| entity.value(index).map(StepValue::references).unwrap_or_default();

    match entity.entity_type.as_str() {
        "IFCRELCONTAINEDINSPATIALSTRUCTURE" => {
            relate_all(model, &refs(4), RelationKind::ContainedInStructure, &refs(5));
        }
        "IFCRELAGGREGATES" | "IFCRELNESTS" => {
            relate_all(model, &refs(5), RelationKind::Decomposes, &refs(4));
        }
        "IFCRELDEFINESBYPROPERTIES" => {
            relate_all(model, &refs(4), RelationKind::DefinedBy, &refs(5));
        }
        "IFCPROPERTYSET" => {
            relate_all(model, &[id], RelationKind::HasProperties, &refs(4));
        }
        "IFCRELCONNECTSELEMENTS" => {
            relate_all(model, &refs(5), RelationKind::ConnectedTo, &refs(6));
        }
        "IFCRELASSOCIATESMATERIAL" => {
            relate_all(model, &refs(4), RelationKind::AssociatedMaterial, &refs(5));
        }
        "IFCMATERIALLIST" | "IFCMATERIALLAYERSET" | "IFCMATERIALLAYER" => {
            relate_all(model, &[id], RelationKind::MaterialConstituents, &refs(0));
        }
        // A usage stands for the layers of its layer set.
        "IFCMATERIALLAYERSETUSAGE" => {
            let layers: Vec<ElementId> = refs(0)
                .into_iter()
                .filter_map(|set| step.get_entity(set))
                .flat_map(|set| set.value(0).map(StepValue::references).unwrap_or_default())
                .collect();
            relate_all(model, &[id], RelationKind::MaterialConstituents, &layers);
        }
        t if t.starts_with("IFCRELSPACEBOUNDARY") => {
            relate_all(model, &[id], RelationKind::RelatingSpace, &refs(4));
            relate_all(model, &[id], RelationKind::RelatedBuildingElement, &refs(5));
        }
        _ => {}
    }
}

fn relate_all(model: &mut MemoryModel, from: &[ElementId], kind: RelationKind, to: &[ElementId]) {
    for &source in from {
        for &target in to {
            model.relate(source, kind, target);
        }
    }
}

// IfcRoot subtypes start with a GlobalId string followed by the owner history.
fn is_rooted(entity: &StepEntity) -> bool {
    entity.values.len() >= 4
        && matches!(entity.value(0), Some(StepValue::String(_)))
        && matches!(
            entity.value(1),
            Some(StepValue::Reference(_) | StepValue::Null)
        )
}

fn set_value(model: &mut MemoryModel, id: ElementId, name: &str, value: Option<&StepValue>) {
    if let Some(value) = value.and_then(to_value) {
        model.set_attribute(id, name, value);
    }
}

fn to_value(value: &StepValue) -> Option<Value> {
    match value {
        StepValue::String(s) | StepValue::Enum(s) => Some(Value::Text(s.clone())),
        StepValue::Integer(i) => Some(Value::Integer(*i)),
        StepValue::Real(f) => Some(Value::Real(*f)),
        StepValue::Boolean(b) => Some(Value::Boolean(*b)),
        StepValue::Typed(_, inner) => to_value(inner),
        StepValue::List(items) => Some(Value::List(items.iter().filter_map(to_value).collect())),
        StepValue::Reference(_) | StepValue::Null | StepValue::Derived => None,
    }
}

/// Origin of an `IFCLOCALPLACEMENT`, with the translations of every
/// `PlacementRelTo` ancestor added. Rotations are not applied.
fn placement_point(step: &StepFile, placement: u64) -> Option<[f64; 3]> {
    let mut total = [0.0; 3];
    let mut current = Some(placement);
    let mut found = false;

    for _ in 0..MAX_PLACEMENT_DEPTH {
        let Some(entity) = current.and_then(|id| step.get_entity(id)) else {
            break;
        };
        if !entity.is("IFCLOCALPLACEMENT") {
            break;
        }
        if let Some(offset) = entity
            .value(1)
            .and_then(StepValue::as_reference)
            .and_then(|axis| axis_location(step, axis))
        {
            for (sum, part) in total.iter_mut().zip(offset) {
                *sum += part;
            }
            found = true;
        }
        current = entity.value(0).and_then(StepValue::as_reference);
    }

    found.then_some(total)
}

fn axis_location(step: &StepFile, axis: u64) -> Option<[f64; 3]> {
    let axis = step.get_entity(axis)?;
    if !axis.is("IFCAXIS2PLACEMENT3D") {
        return None;
    }
    let point = step.get_entity(axis.value(0)?.as_reference()?)?;
    let coords: Vec<f64> = point
        .value(0)?
        .as_list()?
        .iter()
        .filter_map(StepValue::as_f64)
        .collect();
    match coords.as_slice() {
        [x, y, z, ..] => Some([*x, *y, *z]),
        [x, y] => Some([*x, *y, 0.0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bas::Standard;
    use crate::classify::Classifier;
    use crate::graph::ModelGraph;
    use crate::rules::Rules;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const BUILDING: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#10=IFCBUILDINGSTOREY('1st$Storey0000000000',$,'OG 2',$,$,#20,$,$,.ELEMENT.,7.);
#11=IFCSPACE('1sp$Space00000000000',$,'Raum 5','B\\X\\FCro',$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#12=IFCRELAGGREGATES('agg',$,$,$,#10,(#11));
#20=IFCLOCALPLACEMENT($,#21);
#21=IFCAXIS2PLACEMENT3D(#22,$,$);
#22=IFCCARTESIANPOINT((0.,0.,7.));
#30=IFCVALVE('2va$Valve00000000000',$,'Regelventil 12',$,$,#31,$,$,$);
#31=IFCLOCALPLACEMENT(#20,#32);
#32=IFCAXIS2PLACEMENT3D(#33,$,$);
#33=IFCCARTESIANPOINT((1.,2.,0.5));
#40=IFCRELCONTAINEDINSPATIALSTRUCTURE('c',$,$,$,(#30),#11);
#50=IFCPROPERTYSET('ps',$,'Pset_ValveTypeCommon',$,(#51));
#51=IFCPROPERTYSINGLEVALUE('Size',$,IFCPOSITIVELENGTHMEASURE(50.),$);
#52=IFCRELDEFINESBYPROPERTIES('d',$,$,$,(#30),#50);
#60=IFCACTUATOR('3ac$Actuator00000000',$,'Stellantrieb',$,$,$,$,$,$);
#61=IFCRELCONNECTSELEMENTS('k',$,$,$,$,#30,#60);
#70=IFCMATERIAL('Messing',$,$);
#71=IFCRELASSOCIATESMATERIAL('m',$,$,$,(#30),#70);
#80=IFCMATERIALLAYERSETUSAGE(#81,.AXIS2.,.POSITIVE.,0.,$);
#81=IFCMATERIALLAYERSET((#82),'Wand',$);
#82=IFCMATERIALLAYER(#70,0.2,$,$,$,$,$);
#90=IFCRELSPACEBOUNDARY2NDLEVEL('b',$,$,$,#11,#30,$,.PHYSICAL.,.INTERNAL.,$,$);
ENDSEC;
END-ISO-10303-21;
";

    fn load() -> MemoryModel {
        model_from_step(&StepFile::parse(BUILDING).unwrap())
    }

    #[test]
    fn maps_rooted_attributes_and_storey_elevation() {
        let model = load();

        assert_eq!(model.text(10, attr::NAME).as_deref(), Some("OG 2"));
        assert_eq!(model.attribute(10, attr::ELEVATION), Some(Value::Real(7.0)));
        assert_eq!(model.text(11, attr::DESCRIPTION).as_deref(), Some("Büro"));
        assert_eq!(
            model.text(30, attr::GLOBAL_ID).as_deref(),
            Some("2va$Valve00000000000")
        );
        assert!(model.is_a(30, "IfcValve"));
        assert_eq!(model.elements_of_type("IfcValve"), vec![30]);
    }

    #[test]
    fn accumulates_relative_placements() {
        let model = load();

        assert_eq!(
            model.attribute(30, attr::PLACEMENT),
            Some(Value::List(vec![
                Value::Real(1.0),
                Value::Real(2.0),
                Value::Real(7.5)
            ]))
        );
        assert_eq!(model.placement_z(10), Some(7.0));
        assert_eq!(model.attribute(60, attr::PLACEMENT), None);
    }

    #[test]
    fn maps_relationships() {
        let model = load();

        assert_eq!(model.relationships(11, RelationKind::Decomposes), vec![10]);
        assert_eq!(
            model.relationships(30, RelationKind::ContainedInStructure),
            vec![11]
        );
        assert_eq!(model.relationships(30, RelationKind::DefinedBy), vec![50]);
        assert_eq!(model.relationships(50, RelationKind::HasProperties), vec![51]);
        assert_eq!(model.text(51, attr::NAME).as_deref(), Some("Size"));
        assert_eq!(model.attribute(51, attr::NOMINAL_VALUE), Some(Value::Real(50.0)));
        assert_eq!(model.relationships(30, RelationKind::ConnectedTo), vec![60]);
        assert!(model.relationships(60, RelationKind::ConnectedTo).is_empty());
        assert_eq!(
            model.relationships(30, RelationKind::AssociatedMaterial),
            vec![70]
        );
        assert_eq!(
            model.relationships(80, RelationKind::MaterialConstituents),
            vec![82]
        );
        assert_eq!(
            model.relationships(82, RelationKind::MaterialConstituents),
            vec![70]
        );
        assert_eq!(
            model.attribute(82, attr::LAYER_THICKNESS),
            Some(Value::Real(0.2))
        );
    }

    #[test]
    fn space_boundaries_become_boundary_nodes() {
        let model = load();

        assert_eq!(model.elements_of_type(ifc::REL_SPACE_BOUNDARY), vec![90]);
        assert_eq!(model.relationships(90, RelationKind::RelatingSpace), vec![11]);
        assert_eq!(
            model.relationships(90, RelationKind::RelatedBuildingElement),
            vec![30]
        );
    }

    #[test]
    fn connections_point_from_relating_to_related() {
        let step = StepFile::parse(
            "DATA;
#1=IFCACTUATOR('1ac',$,'Antrieb',$,$,$,$,$,$);
#2=IFCDUCTSEGMENT('2du',$,'Kanal',$,$,$,$,$,$);
#3=IFCRELCONNECTSELEMENTS('k1',$,$,$,$,#1,#2);
#4=IFCDUCTSEGMENT('4du',$,'Kanal',$,$,$,$,$,$);
#5=IFCACTUATOR('5ac',$,'Antrieb',$,$,$,$,$,$);
#6=IFCRELCONNECTSELEMENTS('k2',$,$,$,$,#4,#5);
ENDSEC;
",
        )
        .unwrap();
        let model = model_from_step(&step);
        let rules = Rules::default();
        let classifier = Classifier::new(&model, &rules);

        assert_eq!(model.relationships(1, RelationKind::ConnectedTo), vec![2]);
        assert!(model.relationships(2, RelationKind::ConnectedTo).is_empty());

        let related = classifier.classify(2, Standard::Amev, false).unwrap().unwrap();
        assert!(!related.is_electronic);
        let relating = classifier.classify(4, Standard::Amev, false).unwrap().unwrap();
        assert!(relating.is_electronic);
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILDING.as_bytes()).unwrap();

        let model = load_ifc_file(file.path()).unwrap();
        assert!(model.contains(30));

        let missing = load_ifc_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ParseError::FileRead { .. })));
    }
}
