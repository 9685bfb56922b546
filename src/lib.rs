pub mod config;
pub mod error;
pub mod filter;
pub mod interval;
pub mod journal;
pub mod ledger;
pub mod models;
pub mod record;
pub mod store;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{StoreError, StoreResult};
pub use interval::{TimeStamp, ValidityInterval};
pub use record::{EntityId, Record, Version};
pub use store::VersionStore;
