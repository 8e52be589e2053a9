//! Traits for metric sinks.

use crate::error::Result;
use std::path::Path;

/// Result of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Exit status reported by the sender, always `0` on success
    pub status: i32,
}

/// Something that can deliver a buffer file of records.
pub trait MetricSink {
    /// Resolve whatever the sink needs before any data is collected.
    ///
    /// Called once per run, after the boot guard and before collection.
    fn prepare(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Deliver the records in `buffer`.
    fn send(&self, buffer: &Path) -> impl std::future::Future<Output = Result<SendReport>> + Send;
}
