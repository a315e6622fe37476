use pretty_assertions::assert_eq;
use std::io::Write;

use hvac_classifier::bas::{self, Standard};
use hvac_classifier::classify::Classifier;
use hvac_classifier::export::{export_csv, export_json};
use hvac_classifier::inventory::Inventory;
use hvac_classifier::model::{Location, UNKNOWN_STOREY};
use hvac_classifier::parser::load_ifc_file;
use hvac_classifier::rules::Rules;

const MODEL: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('haustechnik.ifc','2024-03-01T10:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCBUILDINGSTOREY('0st$EG00000000000000',$,'EG',$,$,#100,$,$,.ELEMENT.,0.);
#2=IFCBUILDINGSTOREY('0st$OG2000000000000',$,'OG 2',$,$,#110,$,$,.ELEMENT.,7.);
#3=IFCSPACE('0sp$R500000000000000',$,'Raum 5',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#4=IFCSPACE('0sp$R900000000000000',$,'Raum 9',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#5=IFCRELAGGREGATES('agg1',$,$,$,#2,(#3,#4));
#100=IFCLOCALPLACEMENT($,#101);
#101=IFCAXIS2PLACEMENT3D(#102,$,$);
#102=IFCCARTESIANPOINT((0.,0.,0.));
#110=IFCLOCALPLACEMENT($,#111);
#111=IFCAXIS2PLACEMENT3D(#112,$,$);
#112=IFCCARTESIANPOINT((0.,0.,7.));
/* contained directly in a space */
#10=IFCENERGYCONVERSIONDEVICE('1ec$Regelventil000000',$,'Regelventil 12',$,$,$,$,$);
#11=IFCRELCONTAINEDINSPATIALSTRUCTURE('c1',$,$,$,(#10),#3);
/* located only through a space boundary */
#20=IFCDAMPER('1da$Klappe00000000000',$,'Brandschutzklappe 4',$,$,$,$,$,$);
#21=IFCRELSPACEBOUNDARY('b1',$,$,$,#4,#20,$,.PHYSICAL.,.INTERNAL.);
/* located only by height */
#30=IFCPUMP('1pu$Pumpe0000000000',$,'Heizungspumpe 3',
  'Umw\\X\\E4lzpumpe mit Motor',$,#130,$,$,.CIRCULATOR.);
#130=IFCLOCALPLACEMENT(#100,#131);
#131=IFCAXIS2PLACEMENT3D(#132,$,$);
#132=IFCCARTESIANPOINT((4.,2.,1.2));
/* passive, electronic only through its property set */
#40=IFCPIPESEGMENT('1pi$Rohr000000000000',$,'Vorlauf',$,$,$,$,$,$);
#41=IFCPROPERTYSET('ps1',$,'Pset_PipeSegmentTypeCommon',$,(#42));
#42=IFCPROPERTYSINGLEVALUE('Begleitheizung',$,IFCLABEL('Thermostat geregelt'),$);
#43=IFCRELDEFINESBYPROPERTIES('d1',$,$,$,(#40),#41);
/* passive, nowhere */
#50=IFCDUCTSEGMENT('1du$Kanal00000000000',$,'Kanal 8',$,$,$,$,$,$);
/* not HVAC */
#60=IFCWALL('1wa$Wand000000000000',$,'Wand mit Sensor',$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
";

fn model_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MODEL.as_bytes()).unwrap();
    file
}

#[test]
fn classifies_electronic_elements_from_an_ifc_file() {
    let file = model_file();
    let model = load_ifc_file(file.path()).unwrap();
    let rules = Rules::default();

    let run = Classifier::new(&model, &rules).classify_all(Standard::Amev, true);

    let rows: Vec<(&str, &str)> = run
        .flat_results
        .iter()
        .map(|r| (r.element_name.as_str(), r.bas_code.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Vorlauf", "KLI_40_ERH_HZV_S000_R000_T~~01_MW-01_TL"),
            ("Heizungspumpe 3", "LTA_03_ERH_HZV_S000_R000_T~~01_MW-01_TL"),
            ("Regelventil 12", "HEI_12_ERH_HZV_S002_R005_T~~01_MW-01_TL"),
            ("Brandschutzklappe 4", "REG_04_ERH_HZV_S002_R009_T~~01_MW-01_TL"),
        ]
    );
    assert!(run.diagnostics.is_empty());

    let pump = &run.flat_results[1];
    assert_eq!(
        pump.location,
        Some(Location {
            storey_name: Some("EG".to_string()),
            storey_id: Some(1),
            space_name: None,
            space_id: None,
        })
    );

    assert_eq!(run.hierarchy.len(), 3);
    assert_eq!(run.hierarchy.element_count(), 4);
    let og2 = run.hierarchy.get("OG 2").unwrap();
    assert_eq!(og2.id, Some(2));
    assert_eq!(og2.spaces.len(), 2);
    assert!(run.hierarchy.get(UNKNOWN_STOREY).unwrap().elements.contains_key(&40));
}

#[test]
fn all_elements_mode_adds_passive_equipment() {
    let file = model_file();
    let model = load_ifc_file(file.path()).unwrap();
    let rules = Rules::default();

    let run = Classifier::new(&model, &rules).classify_all(Standard::Vdi, false);

    assert_eq!(run.flat_results.len(), 5);
    assert_eq!(run.electronic_count(), 4);
    let duct = run
        .flat_results
        .iter()
        .find(|r| r.element_id == 50)
        .unwrap();
    assert!(!duct.is_electronic);
    assert_eq!(duct.bas_code, "KLI_08_S00_R00_U1_101");
}

#[test]
fn generated_codes_convert_between_standards() {
    let file = model_file();
    let model = load_ifc_file(file.path()).unwrap();
    let rules = Rules::default();
    let classifier = Classifier::new(&model, &rules);

    let amev = classifier
        .classify(20, Standard::Amev, true)
        .unwrap()
        .unwrap();
    let vdi = bas::convert(&amev.bas_code, Standard::Amev, Standard::Vdi);
    assert_eq!(vdi, "REG_04_S00_R00_U1_101");
    assert_eq!(
        bas::convert(&vdi, Standard::Vdi, Standard::Amev),
        "REG_04_ERH_HZV_S000_R000_T~~01_MW-01_TL"
    );
    assert!(bas::convert_named(&vdi, "VDI", "knx").is_err());
}

#[test]
fn exports_and_inventory_agree_with_the_run() {
    let file = model_file();
    let model = load_ifc_file(file.path()).unwrap();
    let rules = Rules::default();
    let run = Classifier::new(&model, &rules).classify_all(Standard::Amev, false);
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("run.csv");
    export_csv(&run, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), run.flat_results.len() + 1);
    assert!(csv.contains("Regelventil 12,IfcEnergyConversionDevice,yes,OG 2,Raum 5,"));

    let json_path = dir.path().join("run.json");
    export_json(&run, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["flat_results"].as_array().unwrap().len(), 5);

    let inventory = Inventory::new(&model, &rules);
    let stats = inventory.statistics();
    assert_eq!(stats.total_elements, 5);
    assert_eq!(stats.electronic_elements, run.electronic_count());

    let pump = inventory.search_by_name("PUMPE").unwrap();
    assert_eq!(pump.len(), 1);
    assert_eq!(pump[0].metadata.description.as_deref(), Some("Umwälzpumpe mit Motor"));
    assert_eq!(pump[0].position.map(|p| p.z), Some(1.2));
}
