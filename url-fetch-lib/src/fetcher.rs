//! Main fetcher implementation.
//!
//! `UrlFetcher` retrieves batches of resources either one at a time or
//! with a bound on how many retrievals are in flight, and hashes single
//! resources. Batch results always come back in input order.

use crate::error::FetchError;
use crate::resource::ResourceClient;
use crate::types::{FetchConfig, FetchRequest};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetches resource content sequentially or with a concurrency throttle.
///
/// # Example
///
/// ```rust,no_run
/// use url_fetch_lib::UrlFetcher;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let fetcher = UrlFetcher::new()?;
///     let urls = ["https://example.com/", "https://example.org/"];
///     let pages = fetcher.fetch_throttled(&urls, 2).await?;
///     assert_eq!(pages.len(), urls.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct UrlFetcher {
    /// Configuration settings for this fetcher instance
    config: FetchConfig,
    /// Client used for every retrieval
    client: ResourceClient,
}

impl UrlFetcher {
    /// Create a fetcher with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use url_fetch_lib::{FetchConfig, UrlFetcher};
    /// use std::time::Duration;
    ///
    /// let config = FetchConfig::default()
    ///     .with_max_concurrency(4)
    ///     .with_timeout(Duration::from_secs(10));
    ///
    /// let fetcher = UrlFetcher::with_config(config).unwrap();
    /// assert_eq!(fetcher.config().max_concurrency, 4);
    /// ```
    pub fn with_config(config: FetchConfig) -> Result<Self, FetchError> {
        let client = ResourceClient::new(&config)?;
        Ok(Self { config, client })
    }

    /// Create a fetcher around a caller-supplied HTTP client.
    ///
    /// The client's own timeouts and TLS settings apply; `config.timeout`
    /// still bounds each retrieval.
    pub fn with_client(http_client: reqwest::Client, config: FetchConfig) -> Self {
        let client = ResourceClient::with_client(http_client, config.timeout);
        Self { config, client }
    }

    /// Get the current configuration for this fetcher.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Retrieve a single resource as text.
    pub async fn fetch_one(&self, resource: &str) -> Result<String, FetchError> {
        self.client.get_text(resource).await
    }

    /// Retrieve every resource one after another, in input order.
    ///
    /// This is the baseline the throttled fetch is compared against. The
    /// first failure ends the call; nothing fetched before it is returned.
    pub async fn fetch_sequential<S: AsRef<str>>(
        &self,
        resources: &[S],
    ) -> Result<Vec<String>, FetchError> {
        let start = Instant::now();
        let mut contents = Vec::with_capacity(resources.len());

        for resource in resources {
            let resource = resource.as_ref();
            match self.client.get_text(resource).await {
                Ok(content) => contents.push(content),
                Err(e) => {
                    warn!(resource, error = %e, "sequential fetch aborted");
                    return Err(e);
                }
            }
        }

        info!(
            count = contents.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sequential fetch complete"
        );
        Ok(contents)
    }

    /// Retrieve every resource with at most `max_concurrency` retrievals in
    /// flight, returning the texts in input order.
    ///
    /// Requests are admitted in input order; whenever one finishes the next
    /// pending one starts. Completion order does not affect the output.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `max_concurrency` is zero, before any I/O.
    /// - `FetchFailed` for the first retrieval that fails. Retrievals still
    ///   in flight are dropped and no partial results are returned.
    pub async fn fetch_throttled<S: AsRef<str>>(
        &self,
        resources: &[S],
        max_concurrency: usize,
    ) -> Result<Vec<String>, FetchError> {
        self.run_throttled(resources, max_concurrency, |resource| {
            self.client.get_text(resource)
        })
        .await
    }

    /// Like [`fetch_throttled`](Self::fetch_throttled) but returns raw bodies.
    pub async fn fetch_throttled_bytes<S: AsRef<str>>(
        &self,
        resources: &[S],
        max_concurrency: usize,
    ) -> Result<Vec<Vec<u8>>, FetchError> {
        self.run_throttled(resources, max_concurrency, |resource| {
            self.client.get_bytes(resource)
        })
        .await
    }

    /// Hash every resource under the same throttle, digests in input order.
    pub async fn hash_throttled<S: AsRef<str>>(
        &self,
        resources: &[S],
        max_concurrency: usize,
    ) -> Result<Vec<String>, FetchError> {
        self.run_throttled(resources, max_concurrency, |resource| {
            self.client.md5(resource)
        })
        .await
    }

    /// Throttled fetch that records each outcome in its own slot.
    ///
    /// Same bound and ordering as [`fetch_throttled`](Self::fetch_throttled),
    /// but one failing resource does not abort the others. Only an invalid
    /// concurrency bound fails the whole call.
    #[cfg(feature = "partial-results")]
    pub async fn fetch_throttled_each<S: AsRef<str>>(
        &self,
        resources: &[S],
        max_concurrency: usize,
    ) -> Result<Vec<Result<String, FetchError>>, FetchError> {
        ensure_concurrency(max_concurrency)?;

        let mut slots: Vec<Option<Result<String, FetchError>>> =
            (0..resources.len()).map(|_| None).collect();

        let mut in_flight = stream::iter(FetchRequest::tag_all(resources))
            .map(|request| async move {
                let outcome = self.client.get_text(request.resource).await;
                (request.index, outcome)
            })
            .buffer_unordered(max_concurrency);

        while let Some((index, outcome)) = in_flight.next().await {
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| FetchError::internal("throttled fetch left an output slot empty"))
    }

    /// Compute the MD5 digest of a resource's content.
    ///
    /// The body is hashed as it arrives, without text decoding. Returns a
    /// 32-character lowercase hex string.
    ///
    /// # Errors
    ///
    /// - `NullResource` when `resource` is `None` or blank.
    /// - `FetchFailed` when the resource cannot be retrieved.
    pub async fn hash_content(&self, resource: Option<&str>) -> Result<String, FetchError> {
        let resource = match resource {
            Some(r) if !r.trim().is_empty() => r,
            _ => return Err(FetchError::NullResource),
        };
        self.client.md5(resource).await
    }

    /// Bounded, order-preserving, first-error-wins dispatch.
    async fn run_throttled<'a, S, T, F, Fut>(
        &'a self,
        resources: &'a [S],
        max_concurrency: usize,
        retrieve: F,
    ) -> Result<Vec<T>, FetchError>
    where
        S: AsRef<str>,
        F: Fn(&'a str) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        ensure_concurrency(max_concurrency)?;
        if resources.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let total = resources.len();
        debug!(total, max_concurrency, "starting throttled fetch");

        // One slot per input; each is written once, by the request carrying its index.
        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();

        let mut in_flight = stream::iter(FetchRequest::tag_all(resources))
            .map(|request| {
                let retrieval = retrieve(request.resource);
                async move { retrieval.await.map(|content| (request.index, content)) }
            })
            .buffer_unordered(max_concurrency);

        loop {
            match in_flight.try_next().await {
                Ok(Some((index, content))) => slots[index] = Some(content),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "throttled fetch aborted");
                    return Err(e);
                }
            }
        }

        info!(
            count = total,
            max_concurrency,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "throttled fetch complete"
        );

        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| FetchError::internal("throttled fetch left an output slot empty"))
    }
}

fn ensure_concurrency(max_concurrency: usize) -> Result<(), FetchError> {
    if max_concurrency == 0 {
        return Err(FetchError::invalid_argument(
            "max_concurrency must be at least 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_zero_concurrency_is_invalid_argument() {
        let fetcher = UrlFetcher::new().unwrap();
        // The URL is unreachable; failing with InvalidArgument proves nothing was attempted.
        let err = fetcher
            .fetch_throttled(&["http://127.0.0.1:9/never"], 0)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_empty_input_yields_empty_output() {
        let fetcher = UrlFetcher::new().unwrap();
        let empty: [&str; 0] = [];
        assert!(fetcher.fetch_throttled(&empty, 4).await.unwrap().is_empty());
        assert!(fetcher.fetch_sequential(&empty).await.unwrap().is_empty());
    }

    #[test]
    fn test_hash_without_resource_is_null_resource() {
        let fetcher = UrlFetcher::new().unwrap();
        assert_eq!(
            tokio_test::block_on(fetcher.hash_content(None)),
            Err(FetchError::NullResource)
        );
        assert_eq!(
            tokio_test::block_on(fetcher.hash_content(Some("   "))),
            Err(FetchError::NullResource)
        );
    }

    #[test]
    fn test_hash_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello\n").unwrap();
        file.flush().unwrap();
        let url = reqwest::Url::from_file_path(file.path()).unwrap();

        let fetcher = UrlFetcher::new().unwrap();
        let digest = tokio_test::block_on(fetcher.hash_content(Some(url.as_str()))).unwrap();
        assert_eq!(digest, "b1946ac92492d2347c6235b4d2611184");
    }
}
