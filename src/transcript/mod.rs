//! Reading for benchmark harness transcripts (one JSON object per line).

pub mod read;
pub mod record;

pub use read::{ReadMode, open_log_file};
pub use record::LogRecord;
