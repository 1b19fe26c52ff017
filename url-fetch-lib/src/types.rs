//! Core data types for fetch operations.
//!
//! This module defines the configuration passed to a fetcher, the
//! index-tagged request unit used while dispatching a batch, and the
//! strategy marker used when reporting timings.

use serde::Serialize;
use std::time::Duration;

/// Default number of retrievals allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Configuration options for a [`UrlFetcher`](crate::UrlFetcher).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Maximum number of concurrent retrievals used by the CLI and by
    /// callers that do not pass their own bound.
    /// Default: 8, must be at least 1
    pub max_concurrency: usize,

    /// Timeout for each individual retrieval (connect + full body)
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Timeout for establishing a connection
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// User-Agent header sent with HTTP requests
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("url-fetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Set the default concurrency bound. Zero is clamped to 1.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Set the per-retrieval timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// A resource tagged with its position in the caller's input.
///
/// Lives only while a batch is being dispatched; the index decides which
/// output slot the result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest<'a> {
    pub index: usize,
    pub resource: &'a str,
}

impl<'a> FetchRequest<'a> {
    /// Tag every resource with its input index, preserving input order.
    pub fn tag_all<S: AsRef<str>>(resources: &'a [S]) -> Vec<FetchRequest<'a>> {
        resources
            .iter()
            .enumerate()
            .map(|(index, resource)| FetchRequest {
                index,
                resource: resource.as_ref(),
            })
            .collect()
    }
}

/// How a batch was fetched.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One retrieval at a time, in input order
    #[serde(rename = "sequential")]
    Sequential,

    /// Up to the given number of retrievals in flight
    #[serde(rename = "throttled")]
    Throttled(usize),
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Sequential => write!(f, "sequential"),
            FetchStrategy::Throttled(limit) => write!(f, "throttled (max {})", limit),
        }
    }
}
