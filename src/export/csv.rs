use crate::error::ExportError;
use crate::model::ClassificationRun;
use std::fs::File;
use std::path::Path;

const HEADER: [&str; 8] = [
    "Element ID",
    "Name",
    "Type",
    "Electronic",
    "Storey",
    "Space",
    "BAS Code",
    "Standard",
];

/// Writes the flat results of a run, one row per element.
pub fn export_csv<P: AsRef<Path>>(run: &ClassificationRun, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(HEADER)?;

    for result in &run.flat_results {
        let (storey, space) = result
            .location
            .as_ref()
            .map_or(("", ""), |l| (l.storey_name_or_empty(), l.space_name_or_empty()));
        writer.write_record([
            result.element_id.to_string().as_str(),
            result.element_name.as_str(),
            result.element_type.as_str(),
            if result.is_electronic { "yes" } else { "no" },
            storey,
            space,
            result.bas_code.as_str(),
            result.standard.as_str(),
        ])?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
