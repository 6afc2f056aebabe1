//! Core library for ccline: cache refresh concurrency, session logging,
//! and the snapshot/config data model.
//!
//! Everything here is invocation-agnostic: components take their cache
//! directory and settings as parameters and hold no global state, so
//! multiple short-lived processes can race on the same directory safely.

pub mod cache;
pub mod config;
pub mod pricing;
pub mod refresh;
pub mod session;
pub mod snapshot;

pub use cache::{default_cache_dir, CacheStore, ResourceKey};
pub use config::Settings;
pub use pricing::ModelPricing;
pub use session::{SessionLogger, SessionRecord};
pub use snapshot::{ModelFamily, Snapshot};
