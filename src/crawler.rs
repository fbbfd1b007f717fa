//! Concurrent single-host crawl engine
//!
//! This module provides a bounded, cancellable crawl engine with:
//! - **At-most-once fetching**: a [`UniqueSet`] gate in front of the work
//!   queue guarantees every reachable URL is fetched at most once
//! - **Bounded resources**: the URL queue and both output streams are
//!   bounded channels, so a slow consumer throttles the whole crawl
//! - **Graceful cancellation**: an external `CancellationToken` stops idle
//!   workers immediately and lets in-flight pages finish
//! - **Proper completion detection**: no polling; an outstanding-work
//!   counter with explicit drain signalling
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//! use hostcrawl::{Crawler, HtmlParser, HttpFetcher};
//! use tokio_util::sync::CancellationToken;
//! use futures_util::StreamExt;
//!
//! let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(10))?);
//! let crawler = Crawler::builder()
//!     .concurrency(5)
//!     .build(fetcher, Arc::new(HtmlParser::new()))?;
//!
//! crawler.enqueue(seed)?;
//!
//! let cancel = CancellationToken::new();
//! let (mut pages, mut errors) = crawler.run(cancel.clone());
//!
//! while let Some(page) = pages.next().await {
//!     println!("{} ({} links)", page.url, page.links.len());
//! }
//! ```
//!
//! Consumers should drain both streams concurrently: pages are emitted
//! through a bounded channel, and a full channel blocks the workers by
//! design.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::{Mutex, Notify, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::CrawlError;
use crate::fetcher::{FetchError, Fetcher};
use crate::parser::Parser;
use crate::unique_set::UniqueSet;

/// One crawled page, immutable once emitted
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was fetched
    pub url: Url,
    /// Links whose host equals the page's host, in document order
    ///
    /// Duplicates from the document are preserved; deduplication applies
    /// to what gets crawled, not to what is reported.
    pub links: Vec<Url>,
    /// Linked stylesheets, scripts and images, in document order
    ///
    /// Assets are not host-filtered.
    pub assets: Vec<Url>,
}

/// Errors that can occur during crawler configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Concurrency must be greater than 0
    #[error("concurrency must be greater than 0, got {0}")]
    InvalidConcurrency(usize),

    /// Queue length must be greater than 0
    #[error("max queue length must be greater than 0, got {0}")]
    InvalidQueueLength(usize),

    /// Result buffer length must be greater than 0
    #[error("result buffer length must be greater than 0, got {0}")]
    InvalidResultBufferLength(usize),
}

/// Tracks queued plus in-flight work and signals when both reach zero
///
/// Every URL admitted to the queue adds one unit; every completed crawl
/// (success or failure) removes exactly one. Zero outstanding units means
/// the queue is empty and no worker is processing, which is the engine's
/// normal termination signal.
#[derive(Clone)]
pub struct WorkTracker {
    outstanding: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl WorkTracker {
    pub fn new() -> Self {
        Self {
            outstanding: Arc::new(AtomicUsize::new(0)),
            drained: Arc::new(Notify::new()),
        }
    }

    /// Add one unit of outstanding work when a URL is queued
    pub fn url_queued(&self) {
        // SeqCst keeps the increment totally ordered with the zero checks
        // in url_completed and wait_for_drain.
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Remove one unit when a URL's crawl completes, on any outcome
    pub fn url_completed(&self) {
        let remaining = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        if remaining == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Current number of queued plus in-flight URLs
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Wait until no queued or in-flight work remains
    pub async fn wait_for_drain(&self) {
        loop {
            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }

            // Register interest before re-checking so a notify_waiters
            // between the check and the await cannot be missed.
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }

            notified.await;
        }
    }
}

impl Default for WorkTracker {
    fn default() -> Self {
        Self::new()
    }
}

// Configuration constants
const DEFAULT_CONCURRENCY: usize = 5;
const DEFAULT_MAX_QUEUE_LENGTH: usize = 1024;
const DEFAULT_RESULT_BUFFER_LENGTH: usize = 5;

/// Validated configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub(crate) concurrency: usize,
    pub(crate) max_queue_length: usize,
    pub(crate) result_buffer_length: usize,
}

impl CrawlerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if self.max_queue_length == 0 {
            return Err(ConfigError::InvalidQueueLength(0));
        }
        if self.result_buffer_length == 0 {
            return Err(ConfigError::InvalidResultBufferLength(0));
        }
        Ok(())
    }
}

/// Shared engine state reachable from every worker
struct Shared {
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn Parser>,
    unique: UniqueSet,
    queue_tx: mpsc::Sender<Url>,
    tracker: WorkTracker,
}

impl Shared {
    /// Admit a URL: dedup gate, then a non-blocking push onto the queue
    ///
    /// Invariant: callers either run before the workers are spawned or are
    /// themselves workers holding an undecremented work unit, so the
    /// counter cannot reach zero while an admitted URL exists.
    fn enqueue(&self, url: Url) -> Result<(), CrawlError> {
        // Making sure the same page is never crawled twice.
        if !self.unique.add_if_absent(&url) {
            return Ok(());
        }

        match self.queue_tx.try_send(url) {
            Ok(()) => {
                self.tracker.url_queued();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(CrawlError::QueueFull),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Workers are gone, the crawl is shutting down; the URL is
                // discarded along with the rest of the queue.
                Ok(())
            }
        }
    }
}

/// Web crawler that discovers every reachable page on a single host
///
/// Built with [`Crawler::builder`], seeded with [`Crawler::enqueue`], and
/// driven by [`Crawler::run`], which returns a page stream and an error
/// stream. The crawl ends when the reachable set is exhausted or when the
/// supplied cancellation token fires.
pub struct Crawler {
    config: CrawlerConfig,
    shared: Arc<Shared>,
    queue_rx: mpsc::Receiver<Url>,
}

impl Crawler {
    /// Create a crawler builder for custom configuration
    pub fn builder() -> CrawlerBuilder {
        CrawlerBuilder::default()
    }

    fn new_with_config(
        config: CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn Parser>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.max_queue_length);

        Self {
            config,
            shared: Arc::new(Shared {
                fetcher,
                parser,
                unique: UniqueSet::new(),
                queue_tx,
                tracker: WorkTracker::new(),
            }),
            queue_rx,
        }
    }

    /// Admit a URL to the crawl
    ///
    /// A URL already seen by the crawl is silently ignored. When the queue
    /// is at capacity the URL is dropped and [`CrawlError::QueueFull`] is
    /// returned; it will not be retried.
    pub fn enqueue(&self, url: Url) -> Result<(), CrawlError> {
        self.shared.enqueue(url)
    }

    /// Spawn the worker pool and return the page and error streams
    ///
    /// Both streams close exactly once, after every worker has exited,
    /// whether the outstanding work drained to zero or `cancel` fired.
    /// Idle workers observe cancellation immediately;
    /// a worker mid-fetch finishes its current page first.
    pub fn run(
        self,
        cancel: CancellationToken,
    ) -> (ReceiverStream<Page>, ReceiverStream<CrawlError>) {
        let (result_tx, result_rx) = mpsc::channel(self.config.result_buffer_length);
        let (error_tx, error_rx) = mpsc::channel(self.config.result_buffer_length);

        let drained = CancellationToken::new();
        let queue_rx = Arc::new(Mutex::new(self.queue_rx));

        debug!(
            concurrency = self.config.concurrency,
            outstanding = self.shared.tracker.outstanding(),
            "starting crawl workers"
        );

        // Termination watcher: flips the drained signal exactly once, when
        // no queued or in-flight work remains.
        {
            let tracker = self.shared.tracker.clone();
            let drained = drained.clone();
            tokio::spawn(async move {
                tracker.wait_for_drain().await;
                debug!("outstanding work drained");
                drained.cancel();
            });
        }

        let mut workers = Vec::with_capacity(self.config.concurrency);
        for _ in 0..self.config.concurrency {
            let worker = Worker {
                shared: self.shared.clone(),
                queue_rx: queue_rx.clone(),
                result_tx: result_tx.clone(),
                error_tx: error_tx.clone(),
                cancel: cancel.clone(),
                drained: drained.clone(),
            };
            workers.push(tokio::spawn(worker.run()));
        }

        // Stream closer: the only place the output streams are closed. The
        // channels stay open until every worker has exited, so no worker
        // can race a send against the close.
        tokio::spawn(async move {
            for worker in workers {
                let _ = worker.await;
            }
            drop(result_tx);
            drop(error_tx);
        });

        (ReceiverStream::new(result_rx), ReceiverStream::new(error_rx))
    }
}

/// One crawl worker; the pool shares the queue receiver behind a mutex
struct Worker {
    shared: Arc<Shared>,
    queue_rx: Arc<Mutex<mpsc::Receiver<Url>>>,
    result_tx: mpsc::Sender<Page>,
    error_tx: mpsc::Sender<CrawlError>,
    cancel: CancellationToken,
    drained: CancellationToken,
}

impl Worker {
    async fn run(self) {
        loop {
            // Cancellation wins over queued work even when both are ready.
            if self.cancel.is_cancelled() {
                return;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return,
                _ = self.drained.cancelled() => return,
                next = Self::next(&self.queue_rx) => {
                    match next {
                        Some(url) => self.process(url).await,
                        None => return,
                    }
                }
            }
        }
    }

    async fn next(queue_rx: &Mutex<mpsc::Receiver<Url>>) -> Option<Url> {
        queue_rx.lock().await.recv().await
    }

    /// Crawl one URL and decrement the tracker exactly once on every path
    async fn process(&self, url: Url) {
        match self.crawl(&url).await {
            Ok(page) => {
                let links = page.links.clone();

                // A full result buffer blocks here; back-pressure flows
                // from the consumer into the queue.
                if self.result_tx.send(page).await.is_ok() {
                    for link in links {
                        if let Err(err) = self.shared.enqueue(link) {
                            let _ = self.error_tx.send(err).await;
                        }
                    }
                }
            }
            Err(err) => {
                let _ = self.error_tx.send(err).await;
            }
        }

        self.shared.tracker.url_completed();
    }

    async fn crawl(&self, url: &Url) -> Result<Page, CrawlError> {
        let body = self
            .shared
            .fetcher
            .fetch(url.as_str())
            .await
            .map_err(|err| match err {
                FetchError::Http { status: 429, .. } => CrawlError::TooManyRequests,
                FetchError::Http { status, message } => CrawlError::Http { status, message },
                FetchError::Transport { message } => CrawlError::Transport {
                    url: url.to_string(),
                    message,
                },
            })?;

        let (links, assets) = self.shared.parser.parse(url, &body);

        let links = links
            .into_iter()
            .filter(|link| link.host_str() == url.host_str())
            .collect();

        Ok(Page {
            url: url.clone(),
            links,
            assets,
        })
    }
}

/// Builder for configuring a [`Crawler`]
pub struct CrawlerBuilder {
    config: CrawlerConfig,
}

impl Default for CrawlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig {
                concurrency: DEFAULT_CONCURRENCY,
                max_queue_length: DEFAULT_MAX_QUEUE_LENGTH,
                result_buffer_length: DEFAULT_RESULT_BUFFER_LENGTH,
            },
        }
    }

    /// Set the number of concurrent crawl workers (default: 5)
    ///
    /// This also caps the number of in-flight HTTP requests.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the capacity of the bounded URL queue (default: 1024)
    ///
    /// Links discovered while the queue is full are dropped with a
    /// [`CrawlError::QueueFull`] report.
    pub fn max_queue_length(mut self, length: usize) -> Self {
        self.config.max_queue_length = length;
        self
    }

    /// Set the capacity of the page and error streams (default: 5)
    pub fn result_buffer_length(mut self, length: usize) -> Self {
        self.config.result_buffer_length = length;
        self
    }

    /// Build the crawler with the configured settings
    pub fn build(
        self,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn Parser>,
    ) -> Result<Crawler, ConfigError> {
        self.config.validate()?;
        Ok(Crawler::new_with_config(self.config, fetcher, parser))
    }
}
