//! Traits for kernel log sources.

use crate::error::Result;
use futures_util::stream::BoxStream;

/// A source of raw kernel log lines.
///
/// The returned stream is lazy and finite, and can be consumed only once.
/// Implementations report a failure to start as an error from `lines`;
/// errors while reading surface as items of the stream.
pub trait LogSource {
    /// Start the source and return its lines.
    fn lines(
        &mut self,
    ) -> impl std::future::Future<Output = Result<BoxStream<'static, Result<String>>>> + Send;
}
