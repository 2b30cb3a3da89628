//! Query layer - read-only SQL over the soil survey schema, shaped for charting

pub mod aggregate;
pub mod lookup;
pub mod overview;
pub mod predicate;
pub mod samples;
pub mod types;
pub mod utils;

pub use types::*;
