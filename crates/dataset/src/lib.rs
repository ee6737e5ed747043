//! Tabular ingestion for the conversion workflow: CSV loading with schema
//! validation, the sessions-to-campaigns left join, and last-touch revenue
//! attribution.

pub mod attribution;
pub mod loader;
pub mod merge;
pub mod schema;

pub use attribution::attribute_revenue;
pub use loader::{load_campaigns, load_orders, load_sessions};
pub use merge::merge_sessions;
