//! HTTP client for fetching a trail's static data.
//!
//! The three documents (`tracks.json`, `stages.json`, `pois.json`) are
//! requested concurrently from a base URL over one pooled client and parsed
//! into [`TrailData`].

use log::{info, warn};
use reqwest::Client;
use std::time::{Duration, Instant};

use crate::data::{TrailData, POIS_FILE, STAGES_FILE, TRACKS_FILE};
use crate::error::{Result, TrailError};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Downloads trail data documents from a static file server.
pub struct TrailDataFetcher {
    client: Client,
    base_url: String,
}

impl TrailDataFetcher {
    /// Create a fetcher for documents under `base_url`
    /// (e.g. `https://example.org/assets/nakahechi`).
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| TrailError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn document_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Fetch and parse all three documents.
    pub async fn fetch(&self) -> Result<TrailData> {
        let start = Instant::now();

        let (tracks, stages, pois) = futures::try_join!(
            self.fetch_document(TRACKS_FILE),
            self.fetch_document(STAGES_FILE),
            self.fetch_document(POIS_FILE),
        )?;

        info!(
            "[TrailDataFetcher] Downloaded {}KB from {} in {:?}",
            (tracks.len() + stages.len() + pois.len()) / 1024,
            self.base_url,
            start.elapsed()
        );

        TrailData::from_json(&tracks, &stages, &pois)
    }

    async fn fetch_document(&self, name: &str) -> Result<String> {
        let url = self.document_url(name);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("[TrailDataFetcher] {} failed: {}", url, e);
            TrailError::Http {
                message: format!("{}: {}", url, e),
                status_code: e.status().map(|s| s.as_u16()),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("[TrailDataFetcher] {} returned {}", url, status);
            return Err(TrailError::Http {
                message: format!("{} returned {}", url, status),
                status_code: Some(status.as_u16()),
            });
        }

        response.text().await.map_err(|e| TrailError::Http {
            message: format!("Body download error for {}: {}", url, e),
            status_code: Some(status.as_u16()),
        })
    }
}

/// Synchronous wrapper for FFI - runs the fetch on a tokio runtime
pub fn fetch_trail_data_sync(base_url: &str) -> Result<TrailData> {
    use tokio::runtime::Builder;

    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| TrailError::Http {
            message: format!("Runtime error: {}", e),
            status_code: None,
        })?;

    let fetcher = TrailDataFetcher::new(base_url)?;
    rt.block_on(fetcher.fetch())
}
