//! `bankform_xlsx` v1:
//! Bank-account disclosure title sheet (Form 67f, KND 1120499) renderer.
//!
//! Modules:
//! - `conf`   : form literals, layout constants, default presets
//! - `spec`   : inputs, cell formats, document model, reports
//! - `error`  : shared error type
//! - `util`   : pure layout/text helpers
//! - `render` : header + accounts -> document model
//! - `source` : account export -> records
//! - `writer` : document model -> xlsx file
pub mod conf;
pub mod error;
pub mod render;
pub mod source;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_NCOLS_TABLE, N_NROWS_PER_ACCOUNT, N_ROW_TABLE_HEADER, STR_OUTPUT_SUFFIX, STR_SHEET_NAME,
};
pub use error::{Result, TitleSheetError};
pub use render::{render_title_sheet, render_title_sheet_with_report};
pub use source::{
    SpecAccountHolder, SpecSourceOptions, derive_accounts, derive_holder, read_source,
};
pub use spec::{
    EnumCellContent, EnumDocumentNumber, EnumRunStyle, SpecAccountRecord, SpecCellFormat,
    SpecDocumentCell, SpecHeaderMetadata, SpecHeaderMetadataBuilder, SpecMergeRange,
    SpecRenderReport, SpecTextRun, SpecTitleDocument, SpecTitleFormPreset, SpecTitleFormats,
};
pub use util::{derive_column_width, derive_output_path, derive_table_header_height};
pub use writer::{SpecWriteReport, TitleSheetWriter, derive_title_sheet_bytes, save_title_sheet};
