//! Retrieval of a single resource.
//!
//! `ResourceClient` resolves a resource identifier to a retrieval
//! mechanism (`http`/`https` through `reqwest`, `ftp` through `suppaftp`,
//! `file` through `tokio::fs`), reads the full body and releases the
//! connection before returning. Every other scheme is reported as a fetch
//! failure.

use crate::error::FetchError;
use crate::hash::ContentDigest;
use crate::types::FetchConfig;
use reqwest::Url;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tokio::io::AsyncReadExt;
use tracing::debug;

const FILE_BUF_SIZE: usize = 64 * 1024;
const FTP_DEFAULT_PORT: u16 = 21;
const FTP_ANONYMOUS_USER: &str = "anonymous";
const FTP_ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Where a resource identifier points to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    Http(Url),
    Ftp(Url),
    File(PathBuf),
}

/// Parse a resource identifier and pick how to retrieve it.
pub(crate) fn resolve(resource: &str) -> Result<Target, FetchError> {
    let url = Url::parse(resource.trim()).map_err(|e| {
        FetchError::fetch_failed_with_source(resource, "Invalid resource identifier", e)
    })?;

    match url.scheme() {
        "http" | "https" => Ok(Target::Http(url)),
        "ftp" => Ok(Target::Ftp(url)),
        "file" => url
            .to_file_path()
            .map(Target::File)
            .map_err(|_| FetchError::fetch_failed(resource, "File URL has no local path")),
        scheme => Err(FetchError::fetch_failed(
            resource,
            format!("Unsupported scheme '{}'", scheme),
        )),
    }
}

/// Client that retrieves whole resources.
///
/// Holds an explicit `reqwest::Client`; nothing here touches process-wide
/// client state. FTP sessions are opened per retrieval.
#[derive(Clone)]
pub struct ResourceClient {
    /// HTTP client for http/https resources
    http_client: reqwest::Client,
    /// Upper bound for one retrieval, body included
    timeout: Duration,
    /// Upper bound for opening an FTP control connection
    connect_timeout: Duration,
}

impl ResourceClient {
    /// Build a client from configuration.
    ///
    /// Idle connections are not kept, so every retrieval opens and closes
    /// its own connection.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| FetchError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            timeout: config.timeout,
            connect_timeout: config.connect_timeout,
        })
    }

    /// Wrap a caller-supplied HTTP client.
    ///
    /// `timeout` also bounds FTP connects, since the caller's client carries
    /// no settings for them.
    pub fn with_client(http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            http_client,
            timeout,
            connect_timeout: timeout,
        }
    }

    /// Retrieve the resource and decode it as text.
    ///
    /// HTTP bodies are decoded with the charset the response declares
    /// (UTF-8 when none is given); FTP downloads and files are read as
    /// UTF-8 with invalid sequences replaced.
    pub async fn get_text(&self, resource: &str) -> Result<String, FetchError> {
        self.bounded(resource, async {
            let text = match resolve(resource)? {
                Target::Http(url) => {
                    let response = self.open(resource, url).await?;
                    response
                        .text()
                        .await
                        .map_err(|e| transport_error(resource, e))?
                }
                Target::Ftp(url) => {
                    let bytes = self.retr(resource, url).await?;
                    String::from_utf8_lossy(&bytes).into_owned()
                }
                Target::File(path) => {
                    let bytes = read_file(resource, &path).await?;
                    String::from_utf8_lossy(&bytes).into_owned()
                }
            };
            debug!(resource, bytes = text.len(), "fetched text");
            Ok::<_, FetchError>(text)
        })
        .await
    }

    /// Retrieve the resource as raw bytes.
    pub async fn get_bytes(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        self.bounded(resource, async {
            let bytes = match resolve(resource)? {
                Target::Http(url) => {
                    let response = self.open(resource, url).await?;
                    response
                        .bytes()
                        .await
                        .map_err(|e| transport_error(resource, e))?
                        .to_vec()
                }
                Target::Ftp(url) => self.retr(resource, url).await?,
                Target::File(path) => read_file(resource, &path).await?,
            };
            debug!(resource, bytes = bytes.len(), "fetched bytes");
            Ok::<_, FetchError>(bytes)
        })
        .await
    }

    /// Stream the resource through MD5 and return the lowercase hex digest.
    pub async fn md5(&self, resource: &str) -> Result<String, FetchError> {
        self.bounded(resource, async {
            let mut digest = ContentDigest::new();
            match resolve(resource)? {
                Target::Http(url) => {
                    let mut response = self.open(resource, url).await?;
                    while let Some(chunk) = response
                        .chunk()
                        .await
                        .map_err(|e| transport_error(resource, e))?
                    {
                        digest.update(&chunk);
                    }
                }
                Target::Ftp(url) => {
                    let bytes = self.retr(resource, url).await?;
                    digest.update(&bytes);
                }
                Target::File(path) => {
                    let mut file = tokio::fs::File::open(&path)
                        .await
                        .map_err(|e| io_error(resource, e))?;
                    let mut buf = vec![0u8; FILE_BUF_SIZE];
                    loop {
                        let n = file.read(&mut buf).await.map_err(|e| io_error(resource, e))?;
                        if n == 0 {
                            break;
                        }
                        digest.update(&buf[..n]);
                    }
                }
            }
            debug!(resource, bytes = digest.bytes(), "hashed content");
            Ok::<_, FetchError>(digest.finish())
        })
        .await
    }

    /// Send the request and reject non-success statuses.
    async fn open(&self, resource: &str, url: Url) -> Result<reqwest::Response, FetchError> {
        debug!(resource, "sending request");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(resource, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::fetch_failed_with_status(
                resource,
                format!("Server returned {}", status),
                status.as_u16(),
            ));
        }

        Ok(response)
    }

    /// Download an FTP resource on the blocking pool.
    async fn retr(&self, resource: &str, url: Url) -> Result<Vec<u8>, FetchError> {
        debug!(resource, "opening ftp session");
        let owned = resource.to_string();
        let connect_timeout = self.connect_timeout;
        let io_timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            retr_blocking(&owned, &url, connect_timeout, io_timeout)
        })
        .await
        .map_err(|e| FetchError::internal(format!("FTP transfer task failed: {}", e)))?
    }

    /// Run one retrieval under the configured timeout.
    async fn bounded<T, F>(&self, resource: &str, retrieval: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        match tokio::time::timeout(self.timeout, retrieval).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::fetch_failed(
                resource,
                format!("Timed out after {:?}", self.timeout),
            )),
        }
    }
}

/// One FTP session: connect, log in, binary `RETR` of the URL path, quit.
fn retr_blocking(
    resource: &str,
    url: &Url,
    connect_timeout: Duration,
    io_timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let addr = url
        .socket_addrs(|| Some(FTP_DEFAULT_PORT))
        .map_err(|e| ftp_error(resource, "Failed to resolve host", e))?
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::fetch_failed(resource, "FTP host has no address"))?;

    let mut ftp = FtpStream::connect_timeout(addr, connect_timeout)
        .map_err(|e| ftp_error(resource, "Failed to connect", e))?;
    ftp.get_ref()
        .set_read_timeout(Some(io_timeout))
        .map_err(|e| ftp_error(resource, "Failed to connect", e))?;

    let (user, password) = if url.username().is_empty() {
        (FTP_ANONYMOUS_USER, FTP_ANONYMOUS_PASSWORD)
    } else {
        (url.username(), url.password().unwrap_or(""))
    };
    ftp.login(user, password)
        .map_err(|e| ftp_error(resource, "Login failed", e))?;
    ftp.transfer_type(FileType::Binary)
        .map_err(|e| ftp_error(resource, "Failed to set binary mode", e))?;

    let body = ftp
        .retr_as_buffer(url.path())
        .map_err(|e| ftp_error(resource, "Transfer failed", e))?
        .into_inner();

    if let Err(e) = ftp.quit() {
        debug!(resource, error = %e, "ftp quit failed");
    }
    Ok(body)
}

fn ftp_error<E: fmt::Display>(resource: &str, message: &str, err: E) -> FetchError {
    FetchError::fetch_failed_with_source(resource, message, err)
}

async fn read_file(resource: &str, path: &Path) -> Result<Vec<u8>, FetchError> {
    tokio::fs::read(path).await.map_err(|e| io_error(resource, e))
}

/// Re-label a reqwest error with the caller's resource identifier.
fn transport_error(resource: &str, err: reqwest::Error) -> FetchError {
    match FetchError::from(err) {
        FetchError::FetchFailed {
            message,
            status_code,
            source,
            ..
        } => FetchError::FetchFailed {
            resource: resource.to_string(),
            message,
            status_code,
            source,
        },
        other => other,
    }
}

fn io_error(resource: &str, err: std::io::Error) -> FetchError {
    FetchError::fetch_failed_with_source(resource, "Failed to read file", err)
}
