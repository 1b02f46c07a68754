//! Endpoint and navigation targets derived from the two configured bases.

use crate::client::types::{ItemId, ItemRecord};
use crate::error::{ClientError, ClientResult};
use url::{form_urlencoded, Url};

/// A download link for one available format of an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub format: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct Links {
    api_root: Url,
    app_prefix: String,
}

impl Links {
    pub fn new(api_root: &str, app_prefix: &str) -> ClientResult<Self> {
        let api_root = Url::parse(api_root)?;
        if api_root.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!(
                "API root cannot be a base URL: {}",
                api_root
            )));
        }

        Ok(Self {
            api_root,
            app_prefix: app_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// `{root}/{id}/status.json`, with `?enqueue=0` unless `enqueue` is set
    pub fn status_url(&self, item: &ItemId, enqueue: bool) -> ClientResult<Url> {
        let mut url = self.api_url(&[item.as_str(), "status.json"])?;
        if !enqueue {
            url.query_pairs_mut().append_pair("enqueue", "0");
        }
        Ok(url)
    }

    /// `{root}/list.json`
    pub fn list_url(&self) -> ClientResult<Url> {
        self.api_url(&["list.json"])
    }

    /// `{appPrefix}/reader/{id}`
    pub fn reader_url(&self, item: &ItemId) -> String {
        format!("{}/reader/{}", self.app_prefix, encode_segment(item.as_str()))
    }

    /// `{appPrefix}/data/{id}/{extension}`
    pub fn download_url(&self, item: &ItemId, format: &str) -> String {
        format!(
            "{}/data/{}/{}",
            self.app_prefix,
            encode_segment(item.as_str()),
            encode_segment(format)
        )
    }

    /// One link per available format, in the order the server listed them
    pub fn download_links(&self, record: &ItemRecord) -> Vec<DownloadLink> {
        record
            .available_data
            .iter()
            .map(|format| DownloadLink {
                format: format.clone(),
                href: self.download_url(&record.id, format),
            })
            .collect()
    }

    fn api_url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.api_root.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}
