pub mod types;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::links::Links;
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use types::*;
use url::Url;

/// A single readiness check against the conversion service.
///
/// Implementations issue exactly one request per call and never retry;
/// failures are returned to the caller as-is.
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Ask whether `item` has been converted. `trigger_conversion` asks the
    /// server to enqueue the conversion job if it has not been already.
    async fn check_status(&self, item: &ItemId, trigger_conversion: bool) -> ClientResult<ReaderStatus>;
}

/// HTTP client for the library JSON API
pub struct LibraryClient {
    links: Links,
    http_client: reqwest::Client,
}

impl LibraryClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            links: Links::new(&config.api_root, &config.app_prefix)?,
            http_client: builder.build()?,
        })
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let response = self.http_client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the catalog, in the order the server returns it
    pub async fn fetch_items(&self) -> ClientResult<Vec<ItemRecord>> {
        let items: Vec<ItemRecord> = self.get_json(self.links.list_url()?).await?;
        debug!("Fetched {} catalog entries", items.len());
        Ok(items)
    }
}

#[async_trait]
impl StatusClient for LibraryClient {
    async fn check_status(&self, item: &ItemId, trigger_conversion: bool) -> ClientResult<ReaderStatus> {
        let url = self.links.status_url(item, trigger_conversion)?;
        let status: ReaderStatus = self.get_json(url).await?;
        debug!(
            "Status of item {}: ready={} (enqueue={})",
            item, status.is_ready, trigger_conversion
        );
        Ok(status)
    }
}
