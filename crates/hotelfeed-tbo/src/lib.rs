//! TBO hotel static-data ingestion
//!
//! Authenticates against the TBO API, lists destinations for every enabled
//! country, fetches per-destination hotel detail with bounded concurrency,
//! normalizes the embedded XML payload, and persists one document per
//! destination.

pub mod api;
pub mod config;
pub mod countries;
pub mod normalize;
pub mod record;
pub mod runner;
pub mod stats;

pub use api::{AuthToken, Destination, HotelApi, TboClient};
pub use config::TboConfig;
pub use record::{WorkItem, build_record};
pub use runner::{RunOptions, run};
pub use stats::IngestSummary;
