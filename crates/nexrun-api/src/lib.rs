// nexrun-api: Async Rust client for the Nexpose / InsightVM v3 REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod reports;
pub mod scans;
pub mod sites;
pub mod transport;

pub use auth::BasicCredentials;
pub use client::NexposeClient;
pub use error::Error;
pub use models::{Link, Page, Reference, ResourceId};
pub use reports::ReportOutput;
pub use transport::{TlsMode, TransportConfig};
