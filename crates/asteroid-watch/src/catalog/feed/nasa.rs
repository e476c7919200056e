use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::wire::{NeoRecord, NeoWsFeed};
use super::{FeedError, FeedProvider, FeedRange};
use crate::catalog::domain::{NearEarthObject, NeoId};
use crate::config::FeedConfig;

/// NeoWs REST client (`/feed` and `/neo/{id}`).
#[derive(Debug, Clone)]
pub struct NasaFeedClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NasaFeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| FeedError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn map_transport(err: reqwest::Error) -> FeedError {
        if err.is_decode() {
            FeedError::Decode(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }

    async fn status_error(response: reqwest::Response) -> FeedError {
        let status = response.status();
        let detail = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        FeedError::Status {
            status: status.as_u16(),
            detail,
        }
    }
}

#[async_trait]
impl FeedProvider for NasaFeedClient {
    async fn fetch_range(&self, range: FeedRange) -> Result<Vec<NearEarthObject>, FeedError> {
        let url = format!("{}/feed", self.base_url);
        let start = range.start.format("%Y-%m-%d").to_string();
        let end = range.end.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let feed: NeoWsFeed = response.json().await.map_err(Self::map_transport)?;
        debug!(%start, %end, element_count = feed.element_count, "feed page received");
        Ok(feed.into_objects())
    }

    async fn fetch_by_id(&self, id: &NeoId) -> Result<Option<NearEarthObject>, FeedError> {
        let url = format!("{}/neo/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(Self::map_transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let record: NeoRecord = response.json().await.map_err(Self::map_transport)?;
        Ok(Some(record.into_object()))
    }
}
