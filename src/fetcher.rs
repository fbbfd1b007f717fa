//! Fetching page bodies over HTTP
//!
//! The engine consumes fetching through the [`Fetcher`] trait so tests can
//! substitute scripted responses. [`HttpFetcher`] is the production
//! implementation backed by a shared `reqwest` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect;

/// Redirect chains longer than this are returned as-is rather than chased.
const MAX_REDIRECT_HOPS: usize = 10;

/// Errors produced while fetching a single URL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-200 status; the message is the body
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response: DNS, TCP, TLS or timeout
    #[error("{message}")]
    Transport { message: String },
}

/// Capability to retrieve the body of a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` with a GET request and return the response body
    ///
    /// A 200 response yields `Ok(body)`; any other status yields
    /// [`FetchError::Http`] carrying the status code and body. Redirects to
    /// the same host are followed transparently; a redirect elsewhere is
    /// surfaced as the redirect response itself.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetcher`] backed by a pooled `reqwest` client
///
/// The client enforces a whole-request timeout and follows redirects only
/// while they stay on the host of the previous hop, so a crawl cannot be
/// led off its host by a `Location` header.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given whole-request timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::custom(same_host_redirects))
            .build()?;

        Ok(Self { client })
    }
}

fn same_host_redirects(attempt: redirect::Attempt) -> redirect::Action {
    if attempt.previous().len() > MAX_REDIRECT_HOPS {
        return attempt.stop();
    }

    let origin = attempt.previous().last().and_then(|url| url.host_str());

    if attempt.url().host_str() == origin {
        attempt.follow()
    } else {
        // Surface the redirect response instead of leaving the host.
        attempt.stop()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport {
                message: err.to_string(),
            })?;

        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}
