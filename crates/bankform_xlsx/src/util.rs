//! Stateless helper utilities used by the renderer, source reader and writer.

use std::path::{Path, PathBuf};

use crate::conf::{
    STR_BIRTH_DATE_LABEL, STR_BIRTH_PLACE_LABEL, STR_MIDNIGHT_SUFFIX, STR_OUTPUT_EXTENSION,
};
use crate::error::{Result, TitleSheetError};

////////////////////////////////////////////////////////////////////////////////
// #region LayoutArithmetic

/// Table header row height: the natural height doubled, never below `height_min`.
pub fn derive_table_header_height(height_natural: f64, height_min: f64) -> f64 {
    f64::max(height_natural * 2.0, height_min)
}

/// Character-count width heuristic: `min((len + padding) * factor, width_max)`.
pub fn derive_column_width(len_max: usize, padding: usize, factor: f64, width_max: f64) -> f64 {
    f64::min((len_max + padding) as f64 * factor, width_max)
}

/// Count Unicode scalar values, matching the width heuristic's notion of length.
pub fn count_text_chars(s: &str) -> usize {
    s.chars().count()
}

/// Convert a 1-based column number to its letter name (`1 -> A`, `27 -> AA`).
pub fn derive_column_letter(col: u16) -> String {
    let mut n_rest = col as u32;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_rem as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Convert 1-based row number to the 0-based index used by the xlsx writer.
pub fn cast_row_num(row: u32) -> Result<u32> {
    row.checked_sub(1)
        .ok_or_else(|| TitleSheetError::IndexOverflow(format!("row number must be >= 1: {row}")))
}

/// Convert 1-based column number to the 0-based index used by the xlsx writer.
pub fn cast_col_num(col: u16) -> Result<u16> {
    col.checked_sub(1).ok_or_else(|| {
        TitleSheetError::IndexOverflow(format!("column number must be >= 1: {col}"))
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextHelpers

/// Birth line; empty unless both parts are present and non-empty.
pub fn derive_birth_line(date_of_birth: Option<&str>, place_of_birth: Option<&str>) -> String {
    match (date_of_birth, place_of_birth) {
        (Some(dob), Some(pob)) if !dob.is_empty() && !pob.is_empty() => {
            format!("{STR_BIRTH_DATE_LABEL}{dob}, {STR_BIRTH_PLACE_LABEL}{pob}")
        }
        _ => String::new(),
    }
}

/// Pre-formatted bank details line.
pub fn derive_bank_details(reg_number: &str, tax_id: &str, kpp: &str, bik: &str) -> String {
    format!("РегНом/НомФ: {reg_number} ИНН/КПП: {tax_id}/{kpp} БИК(СВИФТ): {bik}")
}

/// Drop the midnight time part appended by the source export.
pub fn strip_midnight_suffix(s: &str) -> &str {
    s.strip_suffix(STR_MIDNIGHT_SUFFIX).unwrap_or(s)
}

/// Sibling output path: `<dir>/<stem><suffix>.xlsx`.
pub fn derive_output_path(path_file_in: &Path, suffix: &str) -> PathBuf {
    let stem = path_file_in
        .file_stem()
        .map(|val| val.to_string_lossy().to_string())
        .unwrap_or_default();
    path_file_in.with_file_name(format!("{stem}{suffix}.{STR_OUTPUT_EXTENSION}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::conf::STR_OUTPUT_SUFFIX;

    fn assert_close(left: f64, right: f64) {
        assert!((left - right).abs() < 1e-9, "{left} != {right}");
    }

    #[test]
    fn table_header_height_doubles_with_floor() {
        assert_close(derive_table_header_height(10.0, 20.0), 20.0);
        assert_close(derive_table_header_height(12.0, 20.0), 24.0);
        assert_close(derive_table_header_height(15.0, 20.0), 30.0);
        assert_close(derive_table_header_height(5.0, 20.0), 20.0);
    }

    #[test]
    fn column_width_is_padded_scaled_and_capped() {
        assert_close(derive_column_width(3, 8, 1.2, 40.0), 11.0 * 1.2);
        assert_close(derive_column_width(0, 8, 1.2, 40.0), 9.6);
        assert_close(derive_column_width(25, 8, 1.2, 40.0), 39.6);
        assert_close(derive_column_width(26, 8, 1.2, 40.0), 40.0);
        assert_close(derive_column_width(300, 8, 1.2, 40.0), 40.0);
    }

    #[test]
    fn text_chars_count_cyrillic_as_one() {
        assert_eq!(count_text_chars("Адрес"), 5);
        assert_eq!(count_text_chars(""), 0);
    }

    #[test]
    fn column_letters() {
        assert_eq!(derive_column_letter(1), "A");
        assert_eq!(derive_column_letter(5), "E");
        assert_eq!(derive_column_letter(26), "Z");
        assert_eq!(derive_column_letter(27), "AA");
    }

    #[test]
    fn cast_rejects_zero() {
        assert_eq!(cast_row_num(14).expect("row"), 13);
        assert_eq!(cast_col_num(1).expect("col"), 0);
        assert!(cast_row_num(0).is_err());
        assert!(cast_col_num(0).is_err());
    }

    #[test]
    fn birth_line_requires_both_parts() {
        assert_eq!(
            derive_birth_line(Some("27.01.1975"), Some("СЫРДАРЬИНСКАЯ ОБЛ")),
            "Дата рождения: 27.01.1975, Место рождения: СЫРДАРЬИНСКАЯ ОБЛ"
        );
        assert_eq!(derive_birth_line(Some("27.01.1975"), None), "");
        assert_eq!(derive_birth_line(None, Some("x")), "");
        assert_eq!(derive_birth_line(Some(""), Some("x")), "");
    }

    #[test]
    fn midnight_suffix_is_stripped_once() {
        assert_eq!(strip_midnight_suffix("14.08.2023 00:00:00"), "14.08.2023");
        assert_eq!(strip_midnight_suffix("14.08.2023 12:30:00"), "14.08.2023 12:30:00");
        assert_eq!(strip_midnight_suffix("14.08.2023"), "14.08.2023");
    }

    #[test]
    fn output_path_is_sibling_with_suffix() {
        let path = derive_output_path(Path::new("/data/Счета.xlsx"), STR_OUTPUT_SUFFIX);
        assert_eq!(path, Path::new("/data/Счета_формат.xlsx"));
        let path = derive_output_path(Path::new("dump.arrow"), STR_OUTPUT_SUFFIX);
        assert_eq!(path, Path::new("dump_формат.xlsx"));
    }

    #[test]
    fn bank_details_layout() {
        assert_eq!(
            derive_bank_details("1481/1945", "7707083893", "381143001", "042520607"),
            "РегНом/НомФ: 1481/1945 ИНН/КПП: 7707083893/381143001 БИК(СВИФТ): 042520607"
        );
    }
}
