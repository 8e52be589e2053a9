//! Kernel log collection.
//!
//! This module reads error-level-and-worse kernel messages through an
//! external `dmesg` command and turns each one into a line of the sender's
//! input file format.

pub mod collector;
pub mod record;
pub mod traits;

// Re-export commonly used items
pub use collector::{collect_records, collect_to_buffer, DmesgSource};
pub use record::LogRecord;
pub use traits::LogSource;
