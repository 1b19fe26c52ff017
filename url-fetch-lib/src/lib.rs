//! # url-fetch Library
//!
//! Retrieve the content of many resources with a bound on concurrency,
//! keeping results in input order, or hash a single resource's content.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use url_fetch_lib::UrlFetcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = UrlFetcher::new()?;
//!
//!     let urls = vec![
//!         "https://example.com/".to_string(),
//!         "https://example.org/".to_string(),
//!     ];
//!     let pages = fetcher.fetch_throttled(&urls, 4).await?;
//!     for (url, page) in urls.iter().zip(&pages) {
//!         println!("{}: {} bytes", url, page.len());
//!     }
//!
//!     let digest = fetcher.hash_content(Some("https://example.com/")).await?;
//!     println!("md5: {}", digest);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Throttled fetch**: at most N retrievals in flight, output in input order
//! - **Sequential fetch**: one-at-a-time baseline for comparison
//! - **Content hashing**: MD5 over the raw body, streamed
//! - **Schemes**: `http`, `https` and `file`
//! - **partial-results** (cargo feature): per-item outcomes instead of first-error-wins

pub use config::{load_env_config, parse_timeout_string, ConfigManager, EnvConfig, FileConfig};
pub use error::FetchError;
pub use fetcher::UrlFetcher;
pub use hash::{md5_hex, MD5_HEX_LEN};
pub use resource::ResourceClient;
pub use types::{FetchConfig, FetchRequest, FetchStrategy, DEFAULT_MAX_CONCURRENCY};
pub use utils::{parse_url_list, read_url_list};

mod config;
mod error;
mod fetcher;
mod hash;
mod resource;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, FetchError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "partial-results")]
    features.push("partial-results");

    features
}
