//! Spreadsheet parsing for bulk upload
//!
//! Converts the first sheet of an .xlsx workbook into raw row records
//! using a fixed header-to-field mapping. Parsing is storage-agnostic
//! and deliberately decoupled from validation: malformed rows are
//! retained (with their row number) so the validator can attach
//! field-level errors downstream. Only structural problems abort.

use calamine::{DataType, Reader, Xlsx};
use std::io::Cursor;
use thiserror::Error;

use crate::models::RawRecord;

/// The fixed upload template headers, in template order
pub const EXPECTED_HEADERS: [&str; 16] = [
    "Surname",
    "Name",
    "Father/Husband Name",
    "Gender",
    "Age",
    "Qualification",
    "Caste",
    "Sub-Caste",
    "PC",
    "AC",
    "Mandal/Ward/Division",
    "Panchayat Name",
    "Village Name",
    "Booth",
    "VoterID",
    "PhoneNumber-10digit",
];

/// Structural spreadsheet problem; aborts the whole ingestion before
/// any persistence. Recoverable by re-upload.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("File must contain at least a header row and one data row")]
    MissingData,

    #[error("Missing required headers: {}", missing.join(", "))]
    MissingHeaders { missing: Vec<String> },

    #[error("Failed to read workbook: {0}")]
    Workbook(String),
}

type FieldSetter = fn(&mut RawRecord, Option<String>);

/// Static header → field binding table, validated once per parse
/// against the header row. Header name decides the mapping, never
/// column position.
const HEADER_BINDINGS: [(&str, FieldSetter); 16] = [
    ("Surname", |r, v| r.surname = v),
    ("Name", |r, v| r.name = v),
    ("Father/Husband Name", |r, v| r.father_husband_name = v),
    ("Gender", |r, v| r.gender = v),
    ("Age", |r, v| r.age = v),
    ("Qualification", |r, v| r.qualification = v),
    ("Caste", |r, v| r.caste = v),
    ("Sub-Caste", |r, v| r.sub_caste = v),
    ("PC", |r, v| r.pc = v),
    ("AC", |r, v| r.ac = v),
    ("Mandal/Ward/Division", |r, v| r.mandal_ward_division = v),
    ("Panchayat Name", |r, v| r.panchayat_name = v),
    ("Village Name", |r, v| r.village_name = v),
    ("Booth", |r, v| r.booth = v),
    ("VoterID", |r, v| r.voter_id = v),
    ("PhoneNumber-10digit", |r, v| {
        r.phone_number = v.map(strip_to_digits).filter(|s| !s.is_empty())
    }),
];

/// Parse the first sheet into raw records
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawRecord>, FormatError> {
    let mut workbook =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| FormatError::Workbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let first_sheet = sheet_names.first().ok_or(FormatError::MissingData)?;
    let range = workbook
        .worksheet_range(first_sheet)
        .ok_or(FormatError::MissingData)?
        .map_err(|e| FormatError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(FormatError::MissingData)?;

    // Resolve each expected header to its column index, exact match.
    // Extra/unknown columns are ignored.
    let header_cells: Vec<Option<String>> = header_row.iter().map(cell_to_string).collect();
    let mut bindings: Vec<(usize, FieldSetter)> = Vec::with_capacity(HEADER_BINDINGS.len());
    let mut missing: Vec<String> = Vec::new();

    for (header, setter) in HEADER_BINDINGS {
        match header_cells
            .iter()
            .position(|cell| cell.as_deref() == Some(header))
        {
            Some(column) => bindings.push((column, setter)),
            None => missing.push(header.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(FormatError::MissingHeaders { missing });
    }

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        // Row 1 is the header; the first data row is row 2
        let mut record = RawRecord {
            row_number: index + 2,
            ..RawRecord::default()
        };

        for (column, setter) in &bindings {
            let value = row.get(*column).and_then(cell_to_string);
            setter(&mut record, value);
        }

        records.push(record);
    }

    if records.is_empty() {
        return Err(FormatError::MissingData);
    }

    Ok(records)
}

/// Render one cell as a trimmed string, empty normalized to None
///
/// Integral floats come back without the trailing ".0" so an Age cell
/// stored numerically reads as "34", not "34.0".
fn cell_to_string(cell: &DataType) -> Option<String> {
    let text = match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(f) => f.to_string(),
        DataType::Empty | DataType::Error(_) => return None,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn strip_to_digits(value: String) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    /// Build an .xlsx workbook with the given header row and data rows
    pub(crate) fn build_workbook(headers: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        for (row_idx, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet
                    .write_string(row_idx as u32 + 1, col as u16, *value)
                    .unwrap();
            }
        }

        workbook.save_to_buffer().unwrap()
    }

    fn template_row(voter_id: &str, name: &str, phone: &str) -> Vec<String> {
        EXPECTED_HEADERS
            .iter()
            .map(|h| match *h {
                "VoterID" => voter_id.to_string(),
                "Name" => name.to_string(),
                "PhoneNumber-10digit" => phone.to_string(),
                "Gender" => "Male".to_string(),
                "Age" => "34".to_string(),
                other => format!("{} value", other),
            })
            .collect()
    }

    #[test]
    fn maps_headers_by_name_not_position() {
        // Reverse the template order; mapping must still hold
        let mut headers: Vec<&str> = EXPECTED_HEADERS.to_vec();
        headers.reverse();
        let row = template_row("ABC1234567", "Lakshmi", "9876543210");
        let reversed: Vec<&str> = row.iter().rev().map(String::as_str).collect();

        let bytes = build_workbook(&headers, &[reversed]);
        let records = parse_workbook(&bytes).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.row_number, 2);
        assert_eq!(record.voter_id.as_deref(), Some("ABC1234567"));
        assert_eq!(record.name.as_deref(), Some("Lakshmi"));
        assert_eq!(record.phone_number.as_deref(), Some("9876543210"));
        assert_eq!(record.gender.as_deref(), Some("Male"));
        assert_eq!(record.age.as_deref(), Some("34"));
    }

    #[test]
    fn phone_cell_is_stripped_to_digits() {
        let row = template_row("ABC1234567", "Ravi", "98-76 543210");
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        let bytes = build_workbook(&EXPECTED_HEADERS, &[row]);

        let records = parse_workbook(&bytes).unwrap();
        assert_eq!(records[0].phone_number.as_deref(), Some("9876543210"));
    }

    #[test]
    fn numeric_age_cell_reads_as_integer_text() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, header) in EXPECTED_HEADERS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        for (col, header) in EXPECTED_HEADERS.iter().enumerate() {
            match *header {
                "Age" => {
                    worksheet.write_number(1, col as u16, 45.0).unwrap();
                }
                "VoterID" => {
                    worksheet.write_string(1, col as u16, "XYZ0001").unwrap();
                }
                "Name" => {
                    worksheet.write_string(1, col as u16, "Sita").unwrap();
                }
                "PhoneNumber-10digit" => {
                    worksheet.write_string(1, col as u16, "9000000001").unwrap();
                }
                _ => {}
            }
        }
        let bytes = workbook.save_to_buffer().unwrap();

        let records = parse_workbook(&bytes).unwrap();
        assert_eq!(records[0].age.as_deref(), Some("45"));
        assert_eq!(records[0].surname, None);
    }

    #[test]
    fn missing_header_lists_the_missing_names() {
        let headers: Vec<&str> = EXPECTED_HEADERS
            .iter()
            .copied()
            .filter(|h| *h != "VoterID")
            .collect();
        let rows = vec![vec!["x"; headers.len()]];
        let bytes = build_workbook(&headers, &rows);

        match parse_workbook(&bytes) {
            Err(FormatError::MissingHeaders { missing }) => {
                assert_eq!(missing, vec!["VoterID".to_string()]);
            }
            other => panic!("expected MissingHeaders, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn header_only_file_is_rejected() {
        let bytes = build_workbook(&EXPECTED_HEADERS, &[]);
        assert!(matches!(
            parse_workbook(&bytes),
            Err(FormatError::MissingData)
        ));
    }

    #[test]
    fn unknown_extra_columns_are_ignored() {
        let mut headers: Vec<&str> = EXPECTED_HEADERS.to_vec();
        headers.push("Remarks");
        let mut row = template_row("DEF7654321", "Arun", "9123456789");
        row.push("should be dropped".to_string());
        let row: Vec<&str> = row.iter().map(String::as_str).collect();

        let bytes = build_workbook(&headers, &[row]);
        let records = parse_workbook(&bytes).unwrap();
        assert_eq!(records[0].voter_id.as_deref(), Some("DEF7654321"));
    }

    #[test]
    fn row_numbers_start_at_two_and_increment() {
        let rows: Vec<Vec<String>> = (0..3)
            .map(|i| template_row(&format!("VID{:07}", i), "Name", "9000000000"))
            .collect();
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let bytes = build_workbook(&EXPECTED_HEADERS, &rows);

        let records = parse_workbook(&bytes).unwrap();
        let row_numbers: Vec<usize> = records.iter().map(|r| r.row_number).collect();
        assert_eq!(row_numbers, vec![2, 3, 4]);
    }
}
