//! Dataset Fetcher Module
//! Downloads the raw OWID CO2 CSV and memoizes the bytes in-process.

use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::info;

/// Public OWID CO2 emissions dataset.
pub const DATA_URL: &str =
    "https://raw.githubusercontent.com/owid/co2-data/master/owid-co2-data.csv";

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Owns the HTTP client and the memoized raw bytes.
///
/// The cache has no expiry; it is dropped only by `invalidate`, so the
/// caller controls staleness explicitly.
pub struct DatasetFetcher {
    client: Client,
    url: String,
    cached: Option<Vec<u8>>,
}

impl DatasetFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            cached: None,
        })
    }

    /// Fetcher for the well-known OWID dataset URL.
    pub fn owid() -> Result<Self, FetchError> {
        Self::new(DATA_URL)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Raw bytes of the last successful download, if any.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.cached.as_deref()
    }

    /// Drop the memoized bytes so the next `fetch` re-downloads.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Return the dataset bytes, downloading them on first use.
    pub fn fetch(&mut self) -> Result<Vec<u8>, FetchError> {
        if let Some(bytes) = &self.cached {
            info!("using cached dataset ({} bytes)", bytes.len());
            return Ok(bytes.clone());
        }

        let bytes = self.download()?;
        self.cached = Some(bytes.clone());
        Ok(bytes)
    }

    fn download(&self) -> Result<Vec<u8>, FetchError> {
        info!("downloading dataset from {}", self.url);

        let resp = self.client.get(&self.url).send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        let bytes = resp.bytes()?;
        info!("download finished ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_starts_without_cached_bytes() {
        let fetcher = DatasetFetcher::owid().unwrap();
        assert!(!fetcher.is_cached());
        assert!(fetcher.raw_bytes().is_none());
        assert_eq!(fetcher.url(), DATA_URL);
    }

    #[test]
    fn invalidate_on_empty_cache_is_a_no_op() {
        let mut fetcher = DatasetFetcher::owid().unwrap();
        fetcher.invalidate();
        assert!(!fetcher.is_cached());
    }

    #[test]
    #[ignore = "hits the live OWID endpoint"]
    fn download_returns_csv_bytes() {
        let mut fetcher = DatasetFetcher::owid().unwrap();
        let bytes = fetcher.fetch().unwrap();
        assert!(bytes.len() > 100);
        assert!(fetcher.is_cached());

        // Second call must serve the memoized copy.
        let again = fetcher.fetch().unwrap();
        assert_eq!(bytes, again);
    }
}
