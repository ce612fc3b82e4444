//! Metrics store module.
//!
//! Provides SQLite storage with embedded migrations, the abstract
//! `MetricsStore` trait consumed by the dashboard layer, and the bounded
//! retry applied at the store boundary.

mod models;
mod retry;
mod store;

pub use models::*;
pub use retry::*;
pub use store::*;
