//! Business logic for rollbook-svc

pub mod approval;
pub mod dedup;
pub mod ingestor;
pub mod spreadsheet;
pub mod validator;
