//! Aggregation model: load benchmark result files into pivot frames and
//! assemble the comparison charts.

pub mod aggregation;
pub mod frame;

pub use aggregation::{AggregationInputs, ChartData, build_charts};
pub use frame::Frame;
