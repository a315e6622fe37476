//! Error types for the HVAC classifier.

use std::path::PathBuf;
use thiserror::Error;

use crate::graph::ElementId;

/// Errors that can occur when loading IFC files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// A BAS standard name that is neither `amev` nor `vdi`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StandardError {
    #[error("unsupported BAS standard '{name}' (expected 'amev' or 'vdi')")]
    Unsupported { name: String },
}

/// Data faults local to a single element during classification.
///
/// A batch run logs these and carries on with the next element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The element id is referenced but has no type record in the model.
    #[error("element #{id} has no type record")]
    DanglingElement { id: ElementId },

    /// An attribute is present but does not hold the expected kind of value.
    #[error("element #{id}: attribute '{attribute}' should be text, found {found}")]
    MalformedAttribute {
        id: ElementId,
        attribute: &'static str,
        found: String,
    },
}

/// Errors that can occur when loading a rules override file.
#[derive(Debug, Error)]
pub enum RulesError {
    /// Failed to read the rules file from disk.
    #[error("failed to read rules file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The rules file is not valid JSON for the rules schema.
    #[error("invalid rules file '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}
