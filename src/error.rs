use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Source {name} is not valid. List of valid sources: [ {valid} ]")]
    InvalidSource { name: String, valid: String },

    #[error("Date format {format} is not valid. List of valid dateformats: [ {allowed} ]")]
    InvalidDateFormat { format: String, allowed: String },

    #[error("{date} is not a valid date for {format} date format")]
    InvalidCutoffDate { date: String, format: String },

    #[error("A valid {0} needs to be provided")]
    MissingInput(&'static str),

    #[error("File provided does not have a .csv extension: {}", .0.display())]
    InvalidExtension(PathBuf),

    #[error("CSV file is empty")]
    EmptyInput,

    #[error("CSV headers are not the same as the source config headers. Expected header rows: [ {expected} ]")]
    HeaderMismatch { expected: String },

    #[error("{file} - No matching source found. List of valid sources: [{sources}]")]
    NoMatchingSource { file: String, sources: String },

    #[error("CSV file only contains the header row")]
    EmptyHeaderOnly,

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upload to YNAB failed: {0}")]
    Upload(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
