//! Error types surfaced on the crawl error stream
//!
//! Every failure a crawl can produce flows through [`CrawlError`]. None of
//! the variants terminate the engine; they are reported to the consumer and
//! the crawl moves on. The only ways a crawl ends are external cancellation
//! and the natural drain of the work queue.
//!
//! [`CrawlError::TooManyRequests`] is a sentinel: a distinguished,
//! equality-comparable value the consumer can match on to decide whether to
//! cancel the crawl. The engine itself never cancels on rate limiting.

/// Errors reported on the error stream while a crawl is running
///
/// The variants are `Clone + PartialEq` so consumers can compare against
/// the [`TooManyRequests`](CrawlError::TooManyRequests) sentinel directly.
///
/// # Examples
///
/// ```ignore
/// while let Some(err) = errors.next().await {
///     if err == CrawlError::TooManyRequests {
///         cancel.cancel();
///     }
///     tracing::error!("{err}");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrawlError {
    /// Network-layer failure: DNS, TCP, TLS or timeout
    ///
    /// The failing URL is not retried.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-200 status
    ///
    /// The message carries the response body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The server answered 429; the caller decides whether to stop
    #[error("too many requests")]
    TooManyRequests,

    /// The bounded URL queue was full; the discovered URL was dropped
    ///
    /// The URL stays recorded in the unique set and is never retried.
    #[error("queue limit reached")]
    QueueFull,
}
