//! The fetch primitive the queue dispatches against.
//!
//! The queue never fetches anything itself; it drives an [`ImageFetcher`],
//! which signals success or failure for one address. [`HttpImageFetcher`] is
//! the default backend for web-hosted pages.

use async_trait::async_trait;

use crate::prelude::*;

/// Asynchronously loads a single image by address.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, src: &str) -> Result<(), LoadError>;
}

/// HTTP fetcher for external image URLs.
///
/// Downloads the image and discards the body; the point of preloading is to
/// warm the HTTP cache so the view's own request is served locally.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Use an existing client (connection pool shared with the API layer).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, src: &str) -> Result<(), LoadError> {
        let resp = self
            .client
            .get(src)
            .send()
            .await
            .map_err(|e| LoadError::Network(format!("Failed to GET {}: {}", src, e)))?;

        if !resp.status().is_success() {
            return Err(LoadError::Network(format!(
                "HTTP error {} for {}",
                resp.status(),
                src
            )));
        }

        resp.bytes()
            .await
            .map_err(|e| LoadError::Network(format!("Failed to read bytes from {}: {}", src, e)))?;

        Ok(())
    }
}
