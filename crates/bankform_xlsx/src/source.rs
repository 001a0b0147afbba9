//! Tabular source reader: account export -> string DataFrame -> records.
//!
//! Spreadsheets (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`) are read with
//! calamine; Arrow IPC dumps (`.arrow`, `.ipc`, `.feather`) with polars.
//! Either way every column ends up as nullable text.

use std::fs::File;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use polars::prelude::{Column, DataFrame, DataType, IntoSeries, IpcReader, SerReader, Series};
use tracing::{debug, warn};

use crate::conf::{
    STR_COL_ACCOUNT_CLOSE_DATE, STR_COL_ACCOUNT_NUMBER, STR_COL_ACCOUNT_OPEN_DATE,
    STR_COL_ACCOUNT_REG_NUMBER, STR_COL_ACCOUNT_STATUS, STR_COL_ACCOUNT_TYPE,
    STR_COL_ACCOUNT_TYPE_FALLBACK, STR_COL_BANK_ADDRESS, STR_COL_BANK_BIK, STR_COL_BANK_KPP,
    STR_COL_BANK_NAME, STR_COL_BANK_TAX_ID, STR_COL_HOLDER_NAME, STR_COL_HOLDER_TAX_ID,
};
use crate::error::{Result, TitleSheetError};
use crate::spec::SpecAccountRecord;
use crate::util::{derive_bank_details, strip_midnight_suffix};

/// Text layout of date-time source values.
const STR_SOURCE_DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
/// Text layout of date-only source values.
const STR_SOURCE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Source reading options.
#[derive(Debug, Clone, Default)]
pub struct SpecSourceOptions {
    /// Worksheet to read; the first one when `None`.
    pub sheet_name: Option<String>,
}

/// Account holder fields taken from the first source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAccountHolder {
    /// Holder full name.
    pub full_name: String,
    /// Holder tax id.
    pub tax_id: String,
}

////////////////////////////////////////////////////////////////////////////////
// #region Reading

/// Read the source file into a DataFrame of string columns.
pub fn read_source(path: &Path, options: &SpecSourceOptions) -> Result<DataFrame> {
    let ext = path
        .extension()
        .map(|val| val.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let df = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_source_spreadsheet(path, options)?,
        "arrow" | "ipc" | "feather" => read_source_ipc(path)?,
        _ => {
            return Err(TitleSheetError::UnsupportedSource(
                path.display().to_string(),
            ));
        }
    };
    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "source loaded");
    Ok(df)
}

fn read_source_spreadsheet(path: &Path, options: &SpecSourceOptions) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = match &options.sheet_name {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| TitleSheetError::SourceFormat("workbook has no sheets".to_string()))?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;
    derive_dataframe_from_range(&range)
}

fn read_source_ipc(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    Ok(IpcReader::new(file).finish()?)
}

/// Build a string DataFrame from a cell range whose first row holds column names.
pub fn derive_dataframe_from_range(range: &Range<Data>) -> Result<DataFrame> {
    let mut iter_rows = range.rows();
    let Some(row_header) = iter_rows.next() else {
        return Ok(DataFrame::empty());
    };

    let l_names = derive_column_names(row_header)?;
    let mut l_values: Vec<Vec<Option<String>>> = vec![Vec::new(); l_names.len()];
    for (n_idx_row, row) in iter_rows.enumerate() {
        for (n_idx_col, values) in l_values.iter_mut().enumerate() {
            let value = match row.get(n_idx_col) {
                Some(cell) => derive_text_from_cell(cell).map_err(|msg| {
                    TitleSheetError::SourceFormat(format!(
                        "row {}, column {:?}: {msg}",
                        n_idx_row + 2,
                        l_names[n_idx_col]
                    ))
                })?,
                None => None,
            };
            values.push(value);
        }
    }

    let l_columns: Vec<Column> = l_names
        .iter()
        .zip(l_values)
        .map(|(name, values)| Column::new(name.as_str().into(), values))
        .collect();
    Ok(DataFrame::new(l_columns)?)
}

fn derive_column_names(row_header: &[Data]) -> Result<Vec<String>> {
    let mut l_names: Vec<String> = Vec::with_capacity(row_header.len());
    for (n_idx, cell) in row_header.iter().enumerate() {
        let name = derive_text_from_cell(cell)
            .map_err(TitleSheetError::SourceFormat)?
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| format!("column_{}", n_idx + 1));
        if l_names.contains(&name) {
            return Err(TitleSheetError::SourceFormat(format!(
                "duplicate column name: {name:?}"
            )));
        }
        l_names.push(name);
    }
    Ok(l_names)
}

/// Text form of one cell; `Ok(None)` for empty cells.
fn derive_text_from_cell(cell: &Data) -> std::result::Result<Option<String>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::String(val) => Ok(Some(val.clone())),
        Data::Int(val) => Ok(Some(val.to_string())),
        Data::Float(val) => Ok(Some(derive_text_from_float(*val))),
        Data::Bool(val) => Ok(Some(val.to_string())),
        Data::DateTime(val) => val
            .as_datetime()
            .map(|dt| Some(dt.format(STR_SOURCE_DATETIME_FORMAT).to_string()))
            .ok_or_else(|| format!("unparseable date value {val:?}")),
        Data::DateTimeIso(val) => Ok(Some(
            NaiveDateTime::parse_from_str(val, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.format(STR_SOURCE_DATETIME_FORMAT).to_string())
                .unwrap_or_else(|_| val.clone()),
        )),
        Data::DurationIso(val) => Ok(Some(val.clone())),
        Data::Error(err) => Err(format!("cell error {err:?}")),
    }
}

/// Integral floats print without a fractional part (account numbers, INN).
fn derive_text_from_float(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < 1e15 {
        format!("{}", val as i64)
    } else {
        val.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Mapping

/// Map every source row to one account record, in source order.
pub fn derive_accounts(df: &DataFrame) -> Result<Vec<SpecAccountRecord>> {
    let l_bank_name = derive_text_column(df, STR_COL_BANK_NAME)?;
    let l_reg_number = derive_text_column(df, STR_COL_ACCOUNT_REG_NUMBER)?;
    let l_bank_tax_id = derive_text_column(df, STR_COL_BANK_TAX_ID)?;
    let l_bank_kpp = derive_text_column(df, STR_COL_BANK_KPP)?;
    let l_bank_bik = derive_text_column(df, STR_COL_BANK_BIK)?;
    let l_address = derive_text_column(df, STR_COL_BANK_ADDRESS)?;
    let l_number = derive_text_column(df, STR_COL_ACCOUNT_NUMBER)?;
    let l_open_date = derive_text_column(df, STR_COL_ACCOUNT_OPEN_DATE)?;
    let l_close_date = derive_text_column(df, STR_COL_ACCOUNT_CLOSE_DATE)?;
    let l_status = derive_text_column(df, STR_COL_ACCOUNT_STATUS)?;
    let l_type = derive_text_column(df, STR_COL_ACCOUNT_TYPE)?;
    let l_type_fallback = derive_optional_text_column(df, STR_COL_ACCOUNT_TYPE_FALLBACK)?;

    let mut l_accounts = Vec::with_capacity(df.height());
    for n_idx in 0..df.height() {
        let (account_type, origin) = derive_account_type(
            &l_type[n_idx],
            l_type_fallback.as_ref().map(|l_vals| &l_vals[n_idx]),
        );
        match origin {
            EnumAccountTypeOrigin::Primary => {}
            EnumAccountTypeOrigin::Fallback => warn!(
                row = n_idx,
                column = STR_COL_ACCOUNT_TYPE_FALLBACK,
                "account type taken from fallback column"
            ),
            EnumAccountTypeOrigin::Missing => {
                warn!(row = n_idx, "account type empty in both type columns")
            }
        }

        l_accounts.push(SpecAccountRecord {
            bank_name: derive_or_empty(&l_bank_name[n_idx]),
            bank_details: derive_bank_details(
                &derive_or_empty(&l_reg_number[n_idx]),
                &derive_or_empty(&l_bank_tax_id[n_idx]),
                &derive_or_empty(&l_bank_kpp[n_idx]),
                &derive_or_empty(&l_bank_bik[n_idx]),
            ),
            address: derive_or_empty(&l_address[n_idx]),
            account_number: derive_or_empty(&l_number[n_idx]),
            open_date: derive_non_empty(&l_open_date[n_idx])
                .map(|val| strip_midnight_suffix(val).to_string())
                .unwrap_or_default(),
            status: derive_or_empty(&l_status[n_idx]),
            account_type,
            close_date: derive_non_empty(&l_close_date[n_idx])
                .map(|val| strip_midnight_suffix(val).to_string()),
        });
    }
    Ok(l_accounts)
}

/// Column the account type was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumAccountTypeOrigin {
    Primary,
    Fallback,
    Missing,
}

/// Primary account type, else the fallback column's value, else empty.
fn derive_account_type(
    primary: &Option<String>,
    fallback: Option<&Option<String>>,
) -> (String, EnumAccountTypeOrigin) {
    if let Some(val) = derive_non_empty(primary) {
        return (val.to_string(), EnumAccountTypeOrigin::Primary);
    }
    match fallback.and_then(derive_non_empty) {
        Some(val) => (val.to_string(), EnumAccountTypeOrigin::Fallback),
        None => (String::new(), EnumAccountTypeOrigin::Missing),
    }
}

/// Holder name and tax id from the first row.
pub fn derive_holder(df: &DataFrame) -> Result<SpecAccountHolder> {
    let l_name = derive_text_column(df, STR_COL_HOLDER_NAME)?;
    let l_tax_id = derive_text_column(df, STR_COL_HOLDER_TAX_ID)?;
    Ok(SpecAccountHolder {
        full_name: l_name
            .first()
            .cloned()
            .flatten()
            .ok_or(TitleSheetError::MissingRequiredField("full_name"))?,
        tax_id: l_tax_id
            .first()
            .cloned()
            .flatten()
            .ok_or(TitleSheetError::MissingRequiredField("tax_id"))?,
    })
}

fn derive_text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    derive_optional_text_column(df, name)?.ok_or_else(|| TitleSheetError::MissingColumn {
        name: name.to_string(),
    })
}

fn derive_optional_text_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let Some(column) = df.get_columns().iter().find(|col| col.name().as_str() == name) else {
        return Ok(None);
    };
    let series = derive_text_series(column.as_materialized_series())?;
    let ca = series.str()?;
    Ok(Some(ca.into_iter().map(|val| val.map(str::to_string)).collect()))
}

/// Cast to text; temporal columns use the same layout as spreadsheet dates.
fn derive_text_series(series: &Series) -> Result<Series> {
    let series = match series.dtype() {
        DataType::Date => series
            .date()?
            .to_string(STR_SOURCE_DATE_FORMAT)?
            .into_series(),
        DataType::Datetime(_, _) => series
            .datetime()?
            .to_string(STR_SOURCE_DATETIME_FORMAT)?
            .into_series(),
        _ => series.cast(&DataType::String)?,
    };
    Ok(series)
}

fn derive_non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|val| !val.is_empty())
}

fn derive_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::TimeUnit;

    fn derive_source_df(l_type: Vec<Option<&str>>, with_fallback: bool) -> DataFrame {
        let n_rows = l_type.len();
        let fill = |val: &str| -> Vec<Option<String>> { vec![Some(val.to_string()); n_rows] };
        let mut l_columns = vec![
            Column::new(STR_COL_BANK_NAME.into(), fill("Банк")),
            Column::new(STR_COL_ACCOUNT_REG_NUMBER.into(), fill("1481/1945")),
            Column::new(STR_COL_BANK_TAX_ID.into(), fill("7707083893")),
            Column::new(STR_COL_BANK_KPP.into(), fill("381143001")),
            Column::new(STR_COL_BANK_BIK.into(), fill("042520607")),
            Column::new(STR_COL_BANK_ADDRESS.into(), fill("664011, г. Иркутск")),
            Column::new(STR_COL_ACCOUNT_NUMBER.into(), fill("40820810518351951840")),
            Column::new(STR_COL_ACCOUNT_OPEN_DATE.into(), fill("14.08.2023 00:00:00")),
            Column::new(
                STR_COL_ACCOUNT_CLOSE_DATE.into(),
                (0..n_rows)
                    .map(|n| (n == 0).then(|| "01.02.2024 00:00:00".to_string()))
                    .collect::<Vec<_>>(),
            ),
            Column::new(STR_COL_ACCOUNT_STATUS.into(), fill("открыт")),
            Column::new(
                STR_COL_ACCOUNT_TYPE.into(),
                l_type
                    .iter()
                    .map(|val| val.map(str::to_string))
                    .collect::<Vec<_>>(),
            ),
            Column::new(STR_COL_HOLDER_NAME.into(), fill("ИВАНОВ ИВАН")),
            Column::new(STR_COL_HOLDER_TAX_ID.into(), fill("384913640328")),
        ];
        if with_fallback {
            l_columns.push(Column::new(
                STR_COL_ACCOUNT_TYPE_FALLBACK.into(),
                fill("Депозитный счет"),
            ));
        }
        DataFrame::new(l_columns).expect("dataframe")
    }

    #[test]
    fn accounts_strip_suffix_and_build_details() {
        let df = derive_source_df(vec![Some("Текущий счет"), Some("Текущий счет")], true);
        let l_accounts = derive_accounts(&df).expect("accounts");
        assert_eq!(l_accounts.len(), 2);

        let account = &l_accounts[0];
        assert_eq!(account.open_date, "14.08.2023");
        assert_eq!(account.close_date.as_deref(), Some("01.02.2024"));
        assert_eq!(
            account.bank_details,
            "РегНом/НомФ: 1481/1945 ИНН/КПП: 7707083893/381143001 БИК(СВИФТ): 042520607"
        );
        assert_eq!(account.account_type, "Текущий счет");
        assert_eq!(l_accounts[1].close_date, None);
    }

    #[test]
    fn account_type_falls_back_to_secondary_column() {
        let df = derive_source_df(vec![None, Some("")], true);
        let l_accounts = derive_accounts(&df).expect("accounts");
        assert_eq!(l_accounts[0].account_type, "Депозитный счет");
        assert_eq!(l_accounts[1].account_type, "Депозитный счет");

        let df = derive_source_df(vec![None], false);
        let l_accounts = derive_accounts(&df).expect("accounts");
        assert_eq!(l_accounts[0].account_type, "");
    }

    #[test]
    fn account_type_origin_tracks_the_column_used() {
        let some = |val: &str| Some(val.to_string());
        assert_eq!(
            derive_account_type(&some("Текущий"), Some(&some("Депозитный"))),
            ("Текущий".to_string(), EnumAccountTypeOrigin::Primary)
        );
        assert_eq!(
            derive_account_type(&some(""), Some(&some("Депозитный"))),
            ("Депозитный".to_string(), EnumAccountTypeOrigin::Fallback)
        );
        assert_eq!(
            derive_account_type(&None, Some(&some(""))),
            (String::new(), EnumAccountTypeOrigin::Missing)
        );
        assert_eq!(
            derive_account_type(&None, None),
            (String::new(), EnumAccountTypeOrigin::Missing)
        );
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let df = derive_source_df(vec![Some("x")], false)
            .drop(STR_COL_BANK_BIK)
            .expect("drop");
        let err = derive_accounts(&df).expect_err("must fail");
        assert!(matches!(
            err,
            TitleSheetError::MissingColumn { ref name } if name == STR_COL_BANK_BIK
        ));
    }

    #[test]
    fn holder_comes_from_first_row() {
        let df = derive_source_df(vec![Some("x")], false);
        let holder = derive_holder(&df).expect("holder");
        assert_eq!(holder.full_name, "ИВАНОВ ИВАН");
        assert_eq!(holder.tax_id, "384913640328");
    }

    #[test]
    fn holder_of_empty_source_is_missing() {
        let df = derive_source_df(vec![], false);
        assert!(matches!(
            derive_holder(&df),
            Err(TitleSheetError::MissingRequiredField("full_name"))
        ));
    }

    #[test]
    fn range_becomes_string_dataframe() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Счет: Номер".to_string()));
        range.set_value((0, 1), Data::String("НП: ИНН".to_string()));
        range.set_value((1, 0), Data::Float(40820810518.0));
        range.set_value((1, 1), Data::Int(384913640328));
        range.set_value((2, 0), Data::String("abc".to_string()));

        let df = derive_dataframe_from_range(&range).expect("df");
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let l_numbers = derive_text_column(&df, "Счет: Номер").expect("column");
        assert_eq!(
            l_numbers,
            vec![Some("40820810518".to_string()), Some("abc".to_string())]
        );
        let l_tax = derive_text_column(&df, "НП: ИНН").expect("column");
        assert_eq!(l_tax, vec![Some("384913640328".to_string()), None]);
        assert!(derive_optional_text_column(&df, "column_3").expect("column").is_some());
    }

    #[test]
    fn duplicate_header_is_a_format_error() {
        let mut range: Range<Data> = Range::new((0, 0), (0, 1));
        range.set_value((0, 0), Data::String("a".to_string()));
        range.set_value((0, 1), Data::String("a".to_string()));
        assert!(matches!(
            derive_dataframe_from_range(&range),
            Err(TitleSheetError::SourceFormat(_))
        ));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = read_source(Path::new("accounts.txt"), &SpecSourceOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, TitleSheetError::UnsupportedSource(_)));
    }

    #[test]
    fn temporal_columns_use_spreadsheet_date_layout() {
        let col_date = Column::new(STR_COL_ACCOUNT_OPEN_DATE.into(), [Some(19583i32), None])
            .cast(&DataType::Date)
            .expect("date");
        let col_datetime = Column::new(
            STR_COL_ACCOUNT_CLOSE_DATE.into(),
            [Some(1617408000000i64), Some(1617442200000i64)],
        )
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .expect("datetime");
        let df = DataFrame::new(vec![col_date, col_datetime]).expect("df");

        assert_eq!(
            derive_text_column(&df, STR_COL_ACCOUNT_OPEN_DATE).expect("column"),
            vec![Some("14.08.2023".to_string()), None]
        );
        let l_close = derive_text_column(&df, STR_COL_ACCOUNT_CLOSE_DATE).expect("column");
        assert_eq!(
            l_close,
            vec![
                Some("03.04.2021 00:00:00".to_string()),
                Some("03.04.2021 09:30:00".to_string()),
            ]
        );
        assert_eq!(strip_midnight_suffix(l_close[0].as_deref().unwrap_or_default()), "03.04.2021");
    }

    #[test]
    fn float_text_drops_integral_fraction() {
        assert_eq!(derive_text_from_float(123.0), "123");
        assert_eq!(derive_text_from_float(1.5), "1.5");
    }
}
