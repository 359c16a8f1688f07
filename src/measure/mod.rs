//! Benchmark measurement rows: filtering raw output lines and decomposing test names.

pub mod filter;
pub mod name;
pub mod row;

pub use filter::measurement_lines;
pub use name::{NameRule, NameTokenizer, PathShape};
pub use row::{Column, MeasurementRow};
