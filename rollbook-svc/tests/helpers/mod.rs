//! Shared test support: in-memory database, identity contexts, and
//! .xlsx fixture generation

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use sqlx::SqlitePool;

use rollbook_svc::models::{RequestContext, Role};
use rollbook_svc::services::spreadsheet::EXPECTED_HEADERS;

pub async fn test_pool() -> SqlitePool {
    rollbook_svc::db::init_memory_pool()
        .await
        .expect("Failed to create in-memory database")
}

pub fn submitter(user_id: &str) -> RequestContext {
    RequestContext {
        user_id: user_id.to_string(),
        role: Role::Submitter,
    }
}

pub fn approver(user_id: &str) -> RequestContext {
    RequestContext {
        user_id: user_id.to_string(),
        role: Role::Approver,
    }
}

pub fn admin(user_id: &str) -> RequestContext {
    RequestContext {
        user_id: user_id.to_string(),
        role: Role::Admin,
    }
}

/// Build an .xlsx workbook with the given header row and data rows
pub fn build_workbook(headers: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32 + 1, col as u16, value.as_str())
                .unwrap();
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// One template row with the given identity; all other fields filled
/// with plausible values
pub fn template_row(voter_id: &str, name: &str, phone: &str) -> Vec<String> {
    row_with(voter_id, name, phone, "34")
}

pub fn row_with(voter_id: &str, name: &str, phone: &str, age: &str) -> Vec<String> {
    EXPECTED_HEADERS
        .iter()
        .map(|h| match *h {
            "VoterID" => voter_id.to_string(),
            "Name" => name.to_string(),
            "PhoneNumber-10digit" => phone.to_string(),
            "Gender" => "Male".to_string(),
            "Age" => age.to_string(),
            "Surname" => "Kumar".to_string(),
            other => format!("{} value", other),
        })
        .collect()
}

/// A workbook of `count` distinct valid rows
pub fn valid_workbook(count: usize) -> Vec<u8> {
    let rows: Vec<Vec<String>> = (0..count)
        .map(|i| {
            template_row(
                &format!("VID{:07}", i),
                &format!("Voter {}", i),
                &format!("9{:09}", i),
            )
        })
        .collect();
    build_workbook(&EXPECTED_HEADERS, &rows)
}
