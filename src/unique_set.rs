//! Add-only membership test over normalized URLs
//!
//! The unique set is what makes crawling a cyclic link graph terminate: a
//! URL passes the gate exactly once, so the reachable set is visited as a
//! fixed point. Entries are never removed; memory grows with the number of
//! distinct URLs on the host, which is finite.

use std::collections::HashSet;
use std::sync::Mutex;

use url::Url;
use xxhash_rust::xxh64::xxh64;

/// Thread-safe, grow-only set of crawled URL identities
///
/// Two URLs are the same crawl target when `host ++ path ++ query` match;
/// the fragment is ignored (`/home` and `/home#headline` are one page) and
/// so is the scheme (`http://x/` and `https://x/` collapse; the crawl
/// stays on one host either way).
///
/// Only the 64-bit xxh64 checksum of the identity string is stored. A
/// collision makes two distinct URLs identical and silently drops a page;
/// at 64 bits that is negligible for any single-host crawl.
pub struct UniqueSet {
    seen: Mutex<HashSet<u64>>,
}

impl UniqueSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Record the URL's identity, returning whether it was newly added
    ///
    /// Returns `false` when the URL (or another URL with the same
    /// normalized identity) has been added before. Linearizable with
    /// respect to concurrent callers.
    pub fn add_if_absent(&self, url: &Url) -> bool {
        let checksum = xxh64(Self::identity(url).as_bytes(), 0);

        // A poisoned lock just means a panic elsewhere; the set itself
        // holds no invariant a half-finished insert could break.
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());

        seen.insert(checksum)
    }

    fn identity(url: &Url) -> String {
        let host = url.host_str().unwrap_or_default();
        let query = url.query().unwrap_or_default();

        format!("{}{}{}", host, url.path(), query)
    }
}

impl Default for UniqueSet {
    fn default() -> Self {
        Self::new()
    }
}
