//! Deployment metrics aggregation core.
//!
//! Pure, store-independent transformations: window generation, status
//! classification, gap-filled bucketed counting, change-rate policies,
//! per-entity aggregation and growth trends. The dashboard layer wires
//! these to the metrics store.

mod entity;
mod growth;
mod rate;
mod series;
mod status;
mod window;

pub use entity::*;
pub use growth::*;
pub use rate::*;
pub use series::*;
pub use status::*;
pub use window::*;
