//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - The values a [`Record`] can hold
//! * [`Recorder`] - The interface for writing and aggregating records
//! * [`RecordStorage`] - Aggregation of stored records
//! * [`BufferedRecorder`] - Keeps every record in memory
//! * [`LogRecorder`] - Prints aggregated records as a table through the `log` crate
//! * [`NullRecorder`] - Discards all records
//!
//! ```rust
//! use hindsight_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode_reward", RecordValue::Scalar(21.0));
//! record.insert("episode", RecordValue::Scalar(3.0));
//! assert_eq!(record.get_scalar("episode").unwrap(), 3.0);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;
