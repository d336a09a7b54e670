#![warn(clippy::unwrap_used)]

pub mod baseline;
pub mod client;
pub mod events;
pub mod granger;
pub mod keys;
pub mod local;
pub mod registry;
pub mod weights;

pub use baseline::BaselineStore;
pub use client::TieredStore;
pub use events::EventsStore;
pub use granger::GrangerStore;
pub use local::LocalCache;
pub use registry::{TenantRegistry, TenantState};
pub use weights::WeightsStore;
