//! XLSX writer kernel that persists a rendered title sheet document.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet};
use tracing::{debug, info};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NROWS_EXCEL_MAX};
use crate::error::{Result, TitleSheetError};
use crate::spec::{EnumCellContent, EnumRunStyle, SpecCellFormat, SpecTitleDocument};
use crate::util::{cast_col_num, cast_row_num};

/// Per-save summary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecWriteReport {
    /// Sheet name written.
    pub sheet_name: String,
    /// Number of cells written (merge anchors included).
    pub cnt_cells: usize,
    /// Number of merge regions written.
    pub cnt_merges: usize,
}

/// Single-sheet workbook writer bound to an output path.
///
/// The workbook is buffered in memory until [`Self::close`] is called.
pub struct TitleSheetWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    report: Option<SpecWriteReport>,
    if_closed: bool,
}

impl TitleSheetWriter {
    /// Create writer bound to output path.
    pub fn new(path_file_out: impl Into<PathBuf>) -> Self {
        Self {
            path_file_out: path_file_out.into(),
            workbook: Workbook::new(),
            report: None,
            if_closed: false,
        }
    }

    /// Report of the written document, if any.
    pub fn report(&self) -> Option<&SpecWriteReport> {
        self.report.as_ref()
    }

    /// Lay out `document` as the workbook's only sheet.
    pub fn write_document(&mut self, document: &SpecTitleDocument) -> Result<()> {
        if self.if_closed {
            return Err(TitleSheetError::WriterState("cannot write after close()"));
        }
        if self.report.is_some() {
            return Err(TitleSheetError::WriterState(
                "title sheet workbook holds a single sheet",
            ));
        }
        let report = write_document_sheet(&mut self.workbook, document)?;
        debug!(
            sheet = %report.sheet_name,
            cells = report.cnt_cells,
            merges = report.cnt_merges,
            "sheet laid out"
        );
        self.report = Some(report);
        Ok(())
    }

    /// Flush workbook to disk, overwriting any existing file. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.if_closed {
            return Ok(());
        }
        if self.report.is_none() {
            return Err(TitleSheetError::WriterState("no document written"));
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(|source| TitleSheetError::Persistence {
                path: self.path_file_out.clone(),
                source,
            })?;
        self.if_closed = true;
        info!(
            path = %self.path_file_out.display(),
            cells = self.report.as_ref().map_or(0, |report| report.cnt_cells),
            "workbook saved"
        );
        Ok(())
    }
}

/// Write `document` to `path_file_out` in one call.
pub fn save_title_sheet(
    document: &SpecTitleDocument,
    path_file_out: impl Into<PathBuf>,
) -> Result<SpecWriteReport> {
    let mut writer = TitleSheetWriter::new(path_file_out);
    writer.write_document(document)?;
    writer.close()?;
    Ok(writer.report.unwrap_or_default())
}

/// Serialize `document` into in-memory xlsx bytes.
pub fn derive_title_sheet_bytes(document: &SpecTitleDocument) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    write_document_sheet(&mut workbook, document)?;
    Ok(workbook.save_to_buffer()?)
}

fn write_document_sheet(
    workbook: &mut Workbook,
    document: &SpecTitleDocument,
) -> Result<SpecWriteReport> {
    validate_document(document)?;

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&document.sheet_name)?;

    let mut set_cells_written: BTreeSet<(u32, u16)> = BTreeSet::new();
    for merge in &document.l_merges {
        let (row, col) = (merge.row_first, merge.col_first);
        let Some(cell) = document.cell(row, col) else {
            continue;
        };
        let format = derive_rust_xlsx_format(&cell.format);
        let text_merge = match &cell.content {
            EnumCellContent::Text(val) => val.as_str(),
            EnumCellContent::RichText(_) => "",
        };
        worksheet.merge_range(
            cast_row_num(merge.row_first)?,
            cast_col_num(merge.col_first)?,
            cast_row_num(merge.row_last)?,
            cast_col_num(merge.col_last)?,
            text_merge,
            &format,
        )?;
        if let EnumCellContent::RichText(_) = &cell.content {
            write_cell_content(worksheet, row, col, &cell.content, &cell.format)?;
        }
        set_cells_written.insert((row, col));
    }

    for ((row, col), cell) in &document.dict_cells {
        if set_cells_written.contains(&(*row, *col)) {
            continue;
        }
        write_cell_content(worksheet, *row, *col, &cell.content, &cell.format)?;
    }

    for (row, height) in &document.dict_row_heights {
        worksheet.set_row_height(cast_row_num(*row)?, *height)?;
    }
    for (col, width) in &document.dict_col_widths {
        worksheet.set_column_width(cast_col_num(*col)?, *width)?;
    }

    Ok(SpecWriteReport {
        sheet_name: document.sheet_name.clone(),
        cnt_cells: document.dict_cells.len(),
        cnt_merges: document.l_merges.len(),
    })
}

fn validate_document(document: &SpecTitleDocument) -> Result<()> {
    if document.sheet_name.chars().count() > N_LEN_EXCEL_SHEET_NAME_MAX {
        return Err(TitleSheetError::IndexOverflow(format!(
            "sheet name longer than {N_LEN_EXCEL_SHEET_NAME_MAX} chars: {}",
            document.sheet_name
        )));
    }
    let n_row_max = document.max_row() as usize;
    if n_row_max > N_NROWS_EXCEL_MAX {
        return Err(TitleSheetError::IndexOverflow(format!(
            "document needs {n_row_max} rows, Excel allows {N_NROWS_EXCEL_MAX}"
        )));
    }
    Ok(())
}

fn write_cell_content(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    content: &EnumCellContent,
    spec_format: &SpecCellFormat,
) -> Result<()> {
    let format = derive_rust_xlsx_format(spec_format);
    let n_row = cast_row_num(row)?;
    let n_col = cast_col_num(col)?;
    match content {
        EnumCellContent::Text(val) if val.is_empty() => {
            worksheet.write_blank(n_row, n_col, &format)?;
        }
        EnumCellContent::Text(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, &format)?;
        }
        EnumCellContent::RichText(l_runs) => {
            let l_run_formats: Vec<Format> = l_runs
                .iter()
                .map(|run| derive_run_format(spec_format, run.style))
                .collect();
            let l_segments: Vec<(&Format, &str)> = l_run_formats
                .iter()
                .zip(l_runs.iter())
                .filter(|(_, run)| !run.text.is_empty())
                .map(|(fmt_run, run)| (fmt_run, run.text.as_str()))
                .collect();
            if l_segments.is_empty() {
                worksheet.write_blank(n_row, n_col, &format)?;
            } else {
                worksheet.write_rich_string_with_format(n_row, n_col, &l_segments, &format)?;
            }
        }
    }
    Ok(())
}

/// Font-only format of one rich-text run, inheriting the cell's font.
fn derive_run_spec_format(spec_cell: &SpecCellFormat, style: EnumRunStyle) -> SpecCellFormat {
    SpecCellFormat {
        font_name: spec_cell.font_name.clone(),
        font_size: spec_cell.font_size,
        bold: spec_cell.bold,
        underline: Some(style == EnumRunStyle::Underline),
        ..Default::default()
    }
}

fn derive_run_format(spec_cell: &SpecCellFormat, style: EnumRunStyle) -> Format {
    derive_rust_xlsx_format(&derive_run_spec_format(spec_cell, style))
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.underline.unwrap_or(false) {
        format = format.set_underline(FormatUnderline::Single);
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{SpecMergeRange, SpecTextRun};

    fn derive_document() -> SpecTitleDocument {
        let mut document = SpecTitleDocument::new("Титульник");
        let fmt_border = SpecCellFormat {
            border: Some(1),
            ..Default::default()
        };
        document.merge_cells(
            SpecMergeRange {
                row_first: 6,
                col_first: 1,
                row_last: 6,
                col_last: 5,
            },
            EnumCellContent::RichText(vec![
                SpecTextRun::plain("По состоянию на "),
                SpecTextRun::underline("16.01.2025"),
            ]),
            &SpecCellFormat::default(),
        );
        document.set_text(18, 3, "", &fmt_border);
        document.set_text(18, 1, "123", &fmt_border);
        document.set_row_height(14, 30.0);
        document.set_column_width(1, 40.0);
        document
    }

    #[test]
    fn format_mapping() {
        assert_eq!(derive_format_border(1), FormatBorder::Thin);
        assert_eq!(derive_format_border(0), FormatBorder::None);
        assert_eq!(derive_format_align(" VCenter "), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align("sideways"), None);
    }

    #[test]
    fn run_format_keeps_font_and_drops_cell_layout() {
        let spec_cell = SpecCellFormat {
            font_name: Some("Times New Roman".to_string()),
            font_size: Some(12),
            bold: Some(true),
            align: Some("center".to_string()),
            border: Some(1),
            text_wrap: Some(true),
            ..Default::default()
        };
        let spec_run = derive_run_spec_format(&spec_cell, EnumRunStyle::Underline);
        assert_eq!(spec_run.underline, Some(true));
        assert_eq!(spec_run.font_name.as_deref(), Some("Times New Roman"));
        assert_eq!(spec_run.font_size, Some(12));
        assert_eq!(spec_run.bold, Some(true));
        assert!(!spec_run.has_border());
        assert_eq!(spec_run.align, None);
        assert_eq!(spec_run.text_wrap, None);

        let spec_run = derive_run_spec_format(&spec_cell, EnumRunStyle::Plain);
        assert_eq!(spec_run.underline, Some(false));
    }

    #[test]
    fn document_serializes_to_xlsx_bytes() {
        let v_bytes = derive_title_sheet_bytes(&derive_document()).expect("bytes");
        // xlsx is a zip container.
        assert_eq!(&v_bytes[..2], b"PK");
    }

    #[test]
    fn writer_rejects_second_document_and_write_after_close() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.xlsx");
        let mut writer = TitleSheetWriter::new(&path);
        writer.write_document(&derive_document()).expect("write");
        assert!(matches!(
            writer.write_document(&derive_document()),
            Err(TitleSheetError::WriterState(_))
        ));
        writer.close().expect("close");
        writer.close().expect("close is idempotent");
        assert!(path.exists());
        assert!(matches!(
            writer.write_document(&derive_document()),
            Err(TitleSheetError::WriterState(_))
        ));
        assert_eq!(writer.report().map(|report| report.cnt_merges), Some(1));
    }

    #[test]
    fn close_without_document_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut writer = TitleSheetWriter::new(tmp.path().join("empty.xlsx"));
        assert!(matches!(writer.close(), Err(TitleSheetError::WriterState(_))));
    }

    #[test]
    fn unwritable_target_is_a_persistence_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("missing_dir").join("out.xlsx");
        let err = save_title_sheet(&derive_document(), &path).expect_err("must fail");
        assert!(matches!(err, TitleSheetError::Persistence { .. }));
    }

    #[test]
    fn overlong_sheet_name_is_rejected() {
        let document = SpecTitleDocument::new("x".repeat(40));
        assert!(matches!(
            derive_title_sheet_bytes(&document),
            Err(TitleSheetError::IndexOverflow(_))
        ));
    }
}
