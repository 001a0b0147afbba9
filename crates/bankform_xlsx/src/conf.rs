//! Title sheet constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecTitleFormats};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;

////////////////////////////////////////////////////////////////////////////////
// #region FormLiterals

/// Name of the single output sheet.
pub const STR_SHEET_NAME: &str = "Титульник";
/// Default form code line (row 1).
pub const STR_FORM_CODE: &str = "Форма по КНД 1120499";
/// Default form number line (row 2).
pub const STR_FORM_NUMBER: &str = "Форма 67ф";
/// Default report title (rows 3-4), one embedded line break.
pub const STR_REPORT_TITLE: &str = "Сведения о банковских счетах (вкладах, электронных средствах \
платежа (ЭСП))\nфизического лица, не являющегося индивидуальным предпринимателем";

pub const STR_AS_OF_PREFIX: &str = "По состоянию на ";
pub const STR_FORMATION_LABEL: &str = "Дата формирования";
pub const STR_NUMBER_LABEL: &str = "№ ";
pub const STR_TAX_ID_PREFIX: &str = "ИНН: ";
pub const STR_ADDRESS_PREFIX: &str = "Адрес: ";
pub const STR_BIRTH_DATE_LABEL: &str = "Дата рождения: ";
pub const STR_BIRTH_PLACE_LABEL: &str = "Место рождения: ";

/// Table column headers (row 14), left to right.
pub const TUP_TABLE_HEADERS: [&str; N_NCOLS_TABLE as usize] = [
    "Номер счета/номер ЭСП",
    "Дата открытия/предоставления права",
    "Дата закрытия/прекращения права",
    "Состояние",
    "Вид счета",
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Layout

/// Number of table columns (A..E). Every merged line spans all of them.
pub const N_NCOLS_TABLE: u16 = 5;

pub const N_ROW_FORM_CODE: u32 = 1;
pub const N_ROW_FORM_NUMBER: u32 = 2;
pub const N_ROW_REPORT_TITLE_FIRST: u32 = 3;
pub const N_ROW_REPORT_TITLE_LAST: u32 = 4;
pub const N_ROW_AS_OF: u32 = 6;
pub const N_ROW_FORMATION: u32 = 8;
pub const N_ROW_FULL_NAME: u32 = 10;
pub const N_ROW_TAX_ID: u32 = 11;
pub const N_ROW_BIRTH: u32 = 12;
pub const N_ROW_TABLE_HEADER: u32 = 14;
/// Rows emitted per account: bank name, bank details, address, data line.
pub const N_NROWS_PER_ACCOUNT: u32 = 4;

/// Natural height of one text line in points.
pub const N_HEIGHT_LINE: f64 = 15.0;
/// Lower bound of the table header row height.
pub const N_HEIGHT_TABLE_HEADER_MIN: f64 = 20.0;
/// Characters added to the longest value before scaling.
pub const N_WIDTH_PADDING: usize = 8;
/// Scale applied to padded character count.
pub const N_WIDTH_FACTOR: f64 = 1.2;
/// Column width ceiling.
pub const N_WIDTH_MAX: f64 = 40.0;
/// Spaces between the formation date and the number label in row 8.
pub const N_LEN_FORMATION_SPACER: usize = 100;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SourceColumns

pub const STR_COL_BANK_NAME: &str = "КО: Наименование";
pub const STR_COL_BANK_ADDRESS: &str = "КО: Адрес";
pub const STR_COL_BANK_TAX_ID: &str = "КО: ИНН";
pub const STR_COL_BANK_KPP: &str = "КО: КПП";
pub const STR_COL_BANK_BIK: &str = "КО: БИК";
pub const STR_COL_ACCOUNT_REG_NUMBER: &str = "Счет: Регномер";
pub const STR_COL_ACCOUNT_NUMBER: &str = "Счет: Номер";
pub const STR_COL_ACCOUNT_OPEN_DATE: &str = "Счет: Дата открытия";
pub const STR_COL_ACCOUNT_CLOSE_DATE: &str = "Счет: Дата закрытия";
pub const STR_COL_ACCOUNT_STATUS: &str = "Счет: Состояние";
pub const STR_COL_ACCOUNT_TYPE: &str = "Счет: Вид";
pub const STR_COL_ACCOUNT_TYPE_FALLBACK: &str = "Счет: Вид (5.12)";
pub const STR_COL_HOLDER_NAME: &str = "Наименование правообладателя";
pub const STR_COL_HOLDER_TAX_ID: &str = "НП: ИНН";

/// Time part appended to dates by the source export.
pub const STR_MIDNIGHT_SUFFIX: &str = " 00:00:00";
/// Inserted before the extension of the input file name.
pub const STR_OUTPUT_SUFFIX: &str = "_формат";
/// Extension of the rendered file.
pub const STR_OUTPUT_EXTENSION: &str = "xlsx";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

/// Build the named cell formats used by the renderer on top of `base`.
pub fn derive_default_title_formats(base: &SpecCellFormat) -> SpecTitleFormats {
    let fmt_centered = base.with_(SpecCellFormat {
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    });
    let fmt_centered_bold = fmt_centered.with_(SpecCellFormat {
        bold: Some(true),
        ..Default::default()
    });

    SpecTitleFormats {
        form_line: base.with_(SpecCellFormat {
            align: Some("right".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
        report_title: fmt_centered_bold.with_(SpecCellFormat {
            text_wrap: Some(true),
            ..Default::default()
        }),
        table_header: fmt_centered_bold.with_(SpecCellFormat {
            text_wrap: Some(true),
            border: Some(1),
            ..Default::default()
        }),
        table_cell: base.with_(SpecCellFormat {
            border: Some(1),
            ..Default::default()
        }),
        border_thin: SpecCellFormat {
            border: Some(1),
            ..Default::default()
        },
        centered: fmt_centered,
        centered_bold: fmt_centered_bold,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
