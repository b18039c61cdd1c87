pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FileCarrierSource, HttpCarrierSource};
pub use config::CargoConfig;
pub use crate::core::{
    arbiter::CargoArbiter,
    hub::{NotifyReport, SubscriptionId},
    ingest::{ingest_from, ingest_payload, ingest_records, IngestReport},
    journal::{CargoMonitor, JournalOutcome, MonitorSettings},
};
pub use domain::model::{CargoTally, InventorySnapshot, Mutation};
pub use utils::error::{CargoError, Result};
