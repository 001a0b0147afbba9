//! Title sheet renderer: header metadata + account records -> document model.
//!
//! Rows are addressed by their fixed numbers on the paper form:
//! 1, 2, 3-4, 6, 8, 10, 11, 12, 14 and 15+ for account blocks.

use tracing::{debug, warn};

use crate::conf::{
    N_NCOLS_TABLE, N_NROWS_PER_ACCOUNT, N_ROW_AS_OF, N_ROW_BIRTH, N_ROW_FORM_CODE,
    N_ROW_FORM_NUMBER, N_ROW_FORMATION, N_ROW_FULL_NAME, N_ROW_REPORT_TITLE_FIRST,
    N_ROW_REPORT_TITLE_LAST, N_ROW_TABLE_HEADER, N_ROW_TAX_ID, STR_ADDRESS_PREFIX,
    STR_AS_OF_PREFIX, STR_FORMATION_LABEL, STR_NUMBER_LABEL, STR_TAX_ID_PREFIX,
    TUP_TABLE_HEADERS,
};
use crate::spec::{
    EnumCellContent, SpecAccountRecord, SpecCellFormat, SpecHeaderMetadata, SpecMergeRange,
    SpecRenderReport, SpecTextRun, SpecTitleDocument, SpecTitleFormPreset, SpecTitleFormats,
};
use crate::util::{derive_column_width, derive_table_header_height};

/// Render the title sheet.
pub fn render_title_sheet(
    header: &SpecHeaderMetadata,
    accounts: &[SpecAccountRecord],
    preset: &SpecTitleFormPreset,
) -> SpecTitleDocument {
    render_title_sheet_with_report(header, accounts, preset).0
}

/// Render the title sheet and return a summary of the rendered body.
pub fn render_title_sheet_with_report(
    header: &SpecHeaderMetadata,
    accounts: &[SpecAccountRecord],
    preset: &SpecTitleFormPreset,
) -> (SpecTitleDocument, SpecRenderReport) {
    let formats = preset.formats();
    let mut document = SpecTitleDocument::new(preset.sheet_name.clone());
    let mut report = SpecRenderReport {
        row_body_first: N_ROW_TABLE_HEADER + 1,
        ..Default::default()
    };

    write_form_block(&mut document, header, preset, &formats);
    write_identity_block(&mut document, header, &formats);
    write_table_header(&mut document, preset, &formats);

    if accounts.is_empty() {
        warn!("no account records; rendering table header only");
        report.warn("account list is empty");
    }

    let mut n_row = N_ROW_TABLE_HEADER;
    for account in accounts {
        n_row = write_account_block(&mut document, n_row + 1, account, &formats);
        if account.close_date.is_none() {
            debug!(account = %account.account_number, "close date absent");
        }
    }
    report.cnt_accounts = accounts.len();
    report.row_last = n_row;
    debug!(
        accounts = accounts.len(),
        row_last = n_row,
        "account blocks written"
    );

    apply_column_autofit(&mut document, preset);
    apply_table_header_borders(&mut document, &formats);

    (document, report)
}

/// Full-width merge of one row.
fn derive_line_range(row: u32) -> SpecMergeRange {
    SpecMergeRange {
        row_first: row,
        col_first: 1,
        row_last: row,
        col_last: N_NCOLS_TABLE,
    }
}

fn write_line(
    document: &mut SpecTitleDocument,
    row: u32,
    content: EnumCellContent,
    format: &SpecCellFormat,
) {
    document.merge_cells(derive_line_range(row), content, format);
}

fn write_form_block(
    document: &mut SpecTitleDocument,
    header: &SpecHeaderMetadata,
    preset: &SpecTitleFormPreset,
    formats: &SpecTitleFormats,
) {
    write_line(
        document,
        N_ROW_FORM_CODE,
        EnumCellContent::Text(header.form_code.clone()),
        &formats.form_line,
    );
    write_line(
        document,
        N_ROW_FORM_NUMBER,
        EnumCellContent::Text(header.form_number.clone()),
        &formats.form_line,
    );

    document.merge_cells(
        SpecMergeRange {
            row_first: N_ROW_REPORT_TITLE_FIRST,
            col_first: 1,
            row_last: N_ROW_REPORT_TITLE_LAST,
            col_last: N_NCOLS_TABLE,
        },
        EnumCellContent::Text(header.report_title.clone()),
        &formats.report_title,
    );
    document.set_row_height(N_ROW_REPORT_TITLE_FIRST, preset.height_line * 2.0);

    write_line(
        document,
        N_ROW_AS_OF,
        EnumCellContent::RichText(vec![
            SpecTextRun::plain(STR_AS_OF_PREFIX),
            SpecTextRun::underline(header.as_of_date.clone()),
        ]),
        &formats.centered,
    );

    write_line(
        document,
        N_ROW_FORMATION,
        EnumCellContent::RichText(vec![
            SpecTextRun::plain(format!(
                "{STR_FORMATION_LABEL} {} ",
                header.formation_date
            )),
            SpecTextRun::plain(" ".repeat(preset.len_formation_spacer)),
            SpecTextRun::plain(STR_NUMBER_LABEL),
            SpecTextRun::underline(header.document_number.to_string()),
        ]),
        &formats.centered,
    );
    debug!("form block written");
}

fn write_identity_block(
    document: &mut SpecTitleDocument,
    header: &SpecHeaderMetadata,
    formats: &SpecTitleFormats,
) {
    write_line(
        document,
        N_ROW_FULL_NAME,
        EnumCellContent::Text(header.full_name.clone()),
        &formats.centered_bold,
    );
    write_line(
        document,
        N_ROW_TAX_ID,
        EnumCellContent::Text(format!("{STR_TAX_ID_PREFIX}{}", header.tax_id)),
        &formats.centered,
    );
    write_line(
        document,
        N_ROW_BIRTH,
        EnumCellContent::Text(header.birth_line()),
        &formats.centered,
    );
}

fn write_table_header(
    document: &mut SpecTitleDocument,
    preset: &SpecTitleFormPreset,
    formats: &SpecTitleFormats,
) {
    for (n_idx, text) in TUP_TABLE_HEADERS.iter().enumerate() {
        document.set_text(
            N_ROW_TABLE_HEADER,
            n_idx as u16 + 1,
            *text,
            &formats.table_header,
        );
    }
    let n_height = derive_table_header_height(preset.height_line, preset.height_table_header_min);
    document.set_row_height(N_ROW_TABLE_HEADER, n_height);
    debug!(height = n_height, "table header written");
}

/// Write one 4-row account block starting at `row_first`; return its last row.
fn write_account_block(
    document: &mut SpecTitleDocument,
    row_first: u32,
    account: &SpecAccountRecord,
    formats: &SpecTitleFormats,
) -> u32 {
    write_line(
        document,
        row_first,
        EnumCellContent::Text(account.bank_name.clone()),
        &formats.centered,
    );
    write_line(
        document,
        row_first + 1,
        EnumCellContent::Text(account.bank_details.clone()),
        &formats.centered,
    );
    write_line(
        document,
        row_first + 2,
        EnumCellContent::Text(format!("{STR_ADDRESS_PREFIX}{}", account.address)),
        &formats.centered,
    );

    let row_data = row_first + N_NROWS_PER_ACCOUNT - 1;
    let l_values = [
        account.account_number.as_str(),
        account.open_date.as_str(),
        account.close_date.as_deref().unwrap_or(""),
        account.status.as_str(),
        account.account_type.as_str(),
    ];
    for (n_idx, value) in l_values.iter().enumerate() {
        document.set_text(row_data, n_idx as u16 + 1, *value, &formats.table_cell);
    }
    row_data
}

fn apply_column_autofit(document: &mut SpecTitleDocument, preset: &SpecTitleFormPreset) {
    for col in 1..=N_NCOLS_TABLE {
        let n_len_max = document.max_text_len_in_column(col);
        let n_width = derive_column_width(
            n_len_max,
            preset.width_padding,
            preset.width_factor,
            preset.width_max,
        );
        document.set_column_width(col, n_width);
        debug!(col, len_max = n_len_max, width = n_width, "column autofit");
    }
}

/// Re-apply header borders after the body is laid out.
fn apply_table_header_borders(document: &mut SpecTitleDocument, formats: &SpecTitleFormats) {
    for col in 1..=N_NCOLS_TABLE {
        document.apply_format_patch(N_ROW_TABLE_HEADER, col, &formats.border_thin);
    }
}
