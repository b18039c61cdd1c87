pub mod arbiter;
pub mod detector;
pub mod hub;
pub mod ingest;
pub mod journal;
pub mod store;

pub use crate::domain::model::{CargoTally, InventorySnapshot, Mutation};
pub use crate::domain::ports::CarrierSource;
pub use crate::utils::error::Result;
