//! HTTP API handlers for rollbook-svc

pub mod events;
pub mod health;
pub mod identity;
pub mod ingest;
pub mod submissions;

pub use events::event_stream;
pub use health::health_routes;
pub use ingest::batch_routes;
pub use submissions::submission_routes;
