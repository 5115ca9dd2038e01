//! Data layer of the EV adoption dashboard: ingest and validation of the two
//! source tables, pure aggregation, the shared interaction state and the
//! render coordination the chart adapters plug into.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod dashboard;
pub mod fetch;
pub mod load;
pub mod plot;
pub mod schema;
pub mod state;
