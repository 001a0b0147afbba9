//! Title sheet specification models: inputs, cell formats, document model.

use std::collections::BTreeMap;
use std::fmt;

use crate::conf::{
    N_HEIGHT_LINE, N_HEIGHT_TABLE_HEADER_MIN, N_LEN_FORMATION_SPACER, N_WIDTH_FACTOR,
    N_WIDTH_MAX, N_WIDTH_PADDING, STR_FORM_CODE, STR_FORM_NUMBER, STR_REPORT_TITLE,
    STR_SHEET_NAME, derive_default_title_formats,
};
use crate::error::{Result, TitleSheetError};
use crate::util::{count_text_chars, derive_birth_line, derive_column_letter};

////////////////////////////////////////////////////////////////////////////////
// #region Inputs

/// Document number printed after the `№` label.
///
/// The source may carry it as text or as an integer; either way it is
/// rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumDocumentNumber {
    /// Verbatim text (may be blank padding).
    Text(String),
    /// Integer number.
    Integer(i64),
}

impl Default for EnumDocumentNumber {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for EnumDocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(val) => f.write_str(val),
            Self::Integer(val) => write!(f, "{val}"),
        }
    }
}

impl From<&str> for EnumDocumentNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EnumDocumentNumber {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for EnumDocumentNumber {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Header metadata of one title sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeaderMetadata {
    /// Form code line, e.g. `Форма по КНД 1120499`.
    pub form_code: String,
    /// Form number line, e.g. `Форма 67ф`.
    pub form_number: String,
    /// Report title; may contain a line break.
    pub report_title: String,
    /// "As of" date text.
    pub as_of_date: String,
    /// Formation date text.
    pub formation_date: String,
    /// Document number.
    pub document_number: EnumDocumentNumber,
    /// Holder full name.
    pub full_name: String,
    /// Holder tax id (INN).
    pub tax_id: String,
    /// Holder date of birth.
    pub date_of_birth: Option<String>,
    /// Holder place of birth.
    pub place_of_birth: Option<String>,
}

impl SpecHeaderMetadata {
    /// Start a builder pre-filled with the form literals of `preset`.
    pub fn builder(preset: &SpecTitleFormPreset) -> SpecHeaderMetadataBuilder {
        SpecHeaderMetadataBuilder {
            form_code: Some(preset.form_code.clone()),
            form_number: Some(preset.form_number.clone()),
            report_title: Some(preset.report_title.clone()),
            ..Default::default()
        }
    }

    /// Birth line text; empty unless both date and place are known.
    pub fn birth_line(&self) -> String {
        derive_birth_line(self.date_of_birth.as_deref(), self.place_of_birth.as_deref())
    }
}

/// Mutable accumulator for [`SpecHeaderMetadata`].
///
/// Required fields left unset make [`Self::build`] fail.
#[derive(Debug, Default, Clone)]
pub struct SpecHeaderMetadataBuilder {
    /// See [`SpecHeaderMetadata::form_code`].
    pub form_code: Option<String>,
    /// See [`SpecHeaderMetadata::form_number`].
    pub form_number: Option<String>,
    /// See [`SpecHeaderMetadata::report_title`].
    pub report_title: Option<String>,
    /// See [`SpecHeaderMetadata::as_of_date`].
    pub as_of_date: Option<String>,
    /// See [`SpecHeaderMetadata::formation_date`].
    pub formation_date: Option<String>,
    /// See [`SpecHeaderMetadata::document_number`].
    pub document_number: Option<EnumDocumentNumber>,
    /// See [`SpecHeaderMetadata::full_name`].
    pub full_name: Option<String>,
    /// See [`SpecHeaderMetadata::tax_id`].
    pub tax_id: Option<String>,
    /// See [`SpecHeaderMetadata::date_of_birth`].
    pub date_of_birth: Option<String>,
    /// See [`SpecHeaderMetadata::place_of_birth`].
    pub place_of_birth: Option<String>,
}

impl SpecHeaderMetadataBuilder {
    pub fn form_code(mut self, value: impl Into<String>) -> Self {
        self.form_code = Some(value.into());
        self
    }

    pub fn form_number(mut self, value: impl Into<String>) -> Self {
        self.form_number = Some(value.into());
        self
    }

    pub fn report_title(mut self, value: impl Into<String>) -> Self {
        self.report_title = Some(value.into());
        self
    }

    pub fn as_of_date(mut self, value: impl Into<String>) -> Self {
        self.as_of_date = Some(value.into());
        self
    }

    pub fn formation_date(mut self, value: impl Into<String>) -> Self {
        self.formation_date = Some(value.into());
        self
    }

    pub fn document_number(mut self, value: impl Into<EnumDocumentNumber>) -> Self {
        self.document_number = Some(value.into());
        self
    }

    pub fn full_name(mut self, value: impl Into<String>) -> Self {
        self.full_name = Some(value.into());
        self
    }

    pub fn tax_id(mut self, value: impl Into<String>) -> Self {
        self.tax_id = Some(value.into());
        self
    }

    pub fn date_of_birth(mut self, value: Option<String>) -> Self {
        self.date_of_birth = value;
        self
    }

    pub fn place_of_birth(mut self, value: Option<String>) -> Self {
        self.place_of_birth = value;
        self
    }

    /// Finalize builder; the first absent required field is reported.
    pub fn build(self) -> Result<SpecHeaderMetadata> {
        Ok(SpecHeaderMetadata {
            form_code: require_field(self.form_code, "form_code")?,
            form_number: require_field(self.form_number, "form_number")?,
            report_title: require_field(self.report_title, "report_title")?,
            as_of_date: require_field(self.as_of_date, "as_of_date")?,
            formation_date: require_field(self.formation_date, "formation_date")?,
            document_number: require_field(self.document_number, "document_number")?,
            full_name: require_field(self.full_name, "full_name")?,
            tax_id: require_field(self.tax_id, "tax_id")?,
            date_of_birth: self.date_of_birth,
            place_of_birth: self.place_of_birth,
        })
    }
}

fn require_field<T>(value: Option<T>, name: &'static str) -> Result<T> {
    value.ok_or(TitleSheetError::MissingRequiredField(name))
}

/// One disclosed bank account or e-wallet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecAccountRecord {
    /// Credit organisation name.
    pub bank_name: String,
    /// Pre-formatted registration number, INN/KPP and BIK line.
    pub bank_details: String,
    /// Credit organisation address.
    pub address: String,
    /// Account or e-wallet number.
    pub account_number: String,
    /// Open / grant date text.
    pub open_date: String,
    /// Account status text.
    pub status: String,
    /// Account type text.
    pub account_type: String,
    /// Close / termination date text.
    pub close_date: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
///
/// Every property is optional so formats can be layered with [`Self::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            underline: other.underline.or(self.underline),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
        }
    }

    /// Whether an all-sides border is set.
    pub fn has_border(&self) -> bool {
        self.border.unwrap_or(0) != 0
    }
}

/// Named formats used by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTitleFormats {
    /// Right-aligned form code / number lines.
    pub form_line: SpecCellFormat,
    /// Bold, centered, wrapped report title.
    pub report_title: SpecCellFormat,
    /// Centered plain line.
    pub centered: SpecCellFormat,
    /// Centered bold line.
    pub centered_bold: SpecCellFormat,
    /// Table header cell.
    pub table_header: SpecCellFormat,
    /// Bordered account data cell.
    pub table_cell: SpecCellFormat,
    /// Thin all-sides border patch.
    pub border_thin: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RichText

/// Style of one rich-text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRunStyle {
    /// Cell font without emphasis.
    #[default]
    Plain,
    /// Single underline.
    Underline,
}

/// One styled segment of a mixed-run cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTextRun {
    /// Segment text.
    pub text: String,
    /// Segment style.
    pub style: EnumRunStyle,
}

impl SpecTextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: EnumRunStyle::Plain,
        }
    }

    pub fn underline(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: EnumRunStyle::Underline,
        }
    }
}

/// Displayed content of one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCellContent {
    /// Single-style text; may be empty.
    Text(String),
    /// Ordered runs concatenated into one value.
    RichText(Vec<SpecTextRun>),
}

impl EnumCellContent {
    /// Concatenated plain text of the cell.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(val) => val.clone(),
            Self::RichText(l_runs) => l_runs.iter().map(|run| run.text.as_str()).collect(),
        }
    }

    /// Character count of [`Self::to_text`].
    pub fn len_chars(&self) -> usize {
        match self {
            Self::Text(val) => count_text_chars(val),
            Self::RichText(l_runs) => l_runs.iter().map(|run| count_text_chars(&run.text)).sum(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentModel

/// One populated cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocumentCell {
    /// Displayed content.
    pub content: EnumCellContent,
    /// Cell format.
    pub format: SpecCellFormat,
}

/// Inclusive merge region, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecMergeRange {
    pub row_first: u32,
    pub col_first: u16,
    pub row_last: u32,
    pub col_last: u16,
}

impl fmt::Display for SpecMergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            derive_column_letter(self.col_first),
            self.row_first,
            derive_column_letter(self.col_last),
            self.row_last
        )
    }
}

/// In-memory single-sheet document handed to the writer.
///
/// Rows and columns are 1-based, as printed on the paper form.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTitleDocument {
    /// Sheet name.
    pub sheet_name: String,
    /// Populated cells by `(row, col)`.
    pub dict_cells: BTreeMap<(u32, u16), SpecDocumentCell>,
    /// Merge regions in insertion order.
    pub l_merges: Vec<SpecMergeRange>,
    /// Explicit row heights in points.
    pub dict_row_heights: BTreeMap<u32, f64>,
    /// Explicit column widths in character units.
    pub dict_col_widths: BTreeMap<u16, f64>,
}

impl SpecTitleDocument {
    /// Create an empty document.
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            dict_cells: BTreeMap::new(),
            l_merges: Vec::new(),
            dict_row_heights: BTreeMap::new(),
            dict_col_widths: BTreeMap::new(),
        }
    }

    /// Store one cell, replacing any previous content.
    pub fn set_cell(&mut self, row: u32, col: u16, content: EnumCellContent, format: &SpecCellFormat) {
        self.dict_cells.insert(
            (row, col),
            SpecDocumentCell {
                content,
                format: format.clone(),
            },
        );
    }

    /// Store single-style text.
    pub fn set_text(&mut self, row: u32, col: u16, text: impl Into<String>, format: &SpecCellFormat) {
        self.set_cell(row, col, EnumCellContent::Text(text.into()), format);
    }

    /// Merge a region and store `content` in its top-left cell.
    pub fn merge_cells(&mut self, range: SpecMergeRange, content: EnumCellContent, format: &SpecCellFormat) {
        self.l_merges.push(range);
        self.set_cell(range.row_first, range.col_first, content, format);
    }

    /// Overlay `patch` onto an existing cell format. No-op for empty cells.
    pub fn apply_format_patch(&mut self, row: u32, col: u16, patch: &SpecCellFormat) {
        if let Some(cell) = self.dict_cells.get_mut(&(row, col)) {
            cell.format = cell.format.merge(patch);
        }
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.dict_row_heights.insert(row, height);
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.dict_col_widths.insert(col, width);
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&SpecDocumentCell> {
        self.dict_cells.get(&(row, col))
    }

    /// Concatenated text of a cell, `None` when unpopulated.
    pub fn text_at(&self, row: u32, col: u16) -> Option<String> {
        self.cell(row, col).map(|cell| cell.content.to_text())
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.dict_row_heights.get(&row).copied()
    }

    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.dict_col_widths.get(&col).copied()
    }

    /// Largest populated row number, 0 for an empty document.
    pub fn max_row(&self) -> u32 {
        self.dict_cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    /// Longest cell text (in characters) stored in column `col`.
    pub fn max_text_len_in_column(&self, col: u16) -> usize {
        self.dict_cells
            .iter()
            .filter(|((_, n_col), _)| *n_col == col)
            .map(|(_, cell)| cell.content.len_chars())
            .max()
            .unwrap_or(0)
    }

    /// Merge region whose top-left cell is `(row, col)`.
    pub fn merge_anchored_at(&self, row: u32, col: u16) -> Option<&SpecMergeRange> {
        self.l_merges
            .iter()
            .find(|range| range.row_first == row && range.col_first == col)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

/// Immutable form configuration passed into the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTitleFormPreset {
    /// Output sheet name.
    pub sheet_name: String,
    /// Default form code line.
    pub form_code: String,
    /// Default form number line.
    pub form_number: String,
    /// Default report title.
    pub report_title: String,
    /// Natural height of one text line.
    pub height_line: f64,
    /// Lower bound of the table header row height.
    pub height_table_header_min: f64,
    /// Characters added to the longest value before scaling.
    pub width_padding: usize,
    /// Scale applied to padded character count.
    pub width_factor: f64,
    /// Column width ceiling.
    pub width_max: f64,
    /// Spaces between formation date and number label.
    pub len_formation_spacer: usize,
    /// Base format merged under every named format.
    pub base_format: SpecCellFormat,
}

impl Default for SpecTitleFormPreset {
    fn default() -> Self {
        Self {
            sheet_name: STR_SHEET_NAME.to_string(),
            form_code: STR_FORM_CODE.to_string(),
            form_number: STR_FORM_NUMBER.to_string(),
            report_title: STR_REPORT_TITLE.to_string(),
            height_line: N_HEIGHT_LINE,
            height_table_header_min: N_HEIGHT_TABLE_HEADER_MIN,
            width_padding: N_WIDTH_PADDING,
            width_factor: N_WIDTH_FACTOR,
            width_max: N_WIDTH_MAX,
            len_formation_spacer: N_LEN_FORMATION_SPACER,
            base_format: SpecCellFormat::default(),
        }
    }
}

impl SpecTitleFormPreset {
    /// Named formats derived from [`Self::base_format`].
    pub fn formats(&self) -> SpecTitleFormats {
        derive_default_title_formats(&self.base_format)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-render report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRenderReport {
    /// Number of account blocks rendered.
    pub cnt_accounts: usize,
    /// First body row, one below the table header.
    pub row_body_first: u32,
    /// Last populated row.
    pub row_last: u32,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecRenderReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Number of body rows (4 per account).
    pub fn cnt_body_rows(&self) -> usize {
        if self.cnt_accounts == 0 {
            0
        } else {
            (self.row_last - self.row_body_first + 1) as usize
        }
    }
}

impl fmt::Display for SpecRenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[RENDER] accounts={} body_rows={} last_row={} warnings={}",
            self.cnt_accounts,
            self.cnt_body_rows(),
            self.row_last,
            self.warnings.len()
        )
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
