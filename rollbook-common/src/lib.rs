//! # Rollbook Common Library
//!
//! Shared code for the Rollbook voter-record service:
//! - Error types
//! - Domain event types (RollbookEvent enum) and the EventBus
//! - Configuration and data-directory resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
