//! Error type shared by the renderer, source reader and writer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TitleSheetError {
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("source has no column named {name:?}")]
    MissingColumn { name: String },

    #[error("source format error: {0}")]
    SourceFormat(String),

    #[error("unsupported source file: {0}")]
    UnsupportedSource(String),

    #[error("index overflow: {0}")]
    IndexOverflow(String),

    #[error("writer state error: {0}")]
    WriterState(&'static str),

    #[error("failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("spreadsheet read error: {0}")]
    Calamine(#[from] calamine::Error),

    #[error("dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, TitleSheetError>;
