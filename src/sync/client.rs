//! Remote file share client (Microsoft Graph shares API)

use super::retry::{send_with_retry, RetryPolicy};
use crate::error::SyncResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Drive item metadata used for change detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItemMeta {
    #[serde(default)]
    pub name: String,
    pub e_tag: String,
    pub last_modified_date_time: String,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Where workbooks come from when they are not uploaded by hand
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_meta(&self, share_id: &str, token: &str) -> SyncResult<DriveItemMeta>;

    async fn fetch_content(&self, share_id: &str, token: &str) -> SyncResult<Vec<u8>>;
}

/// Bearer-authenticated Graph client with retry on throttling
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GraphClient {
    pub fn new() -> SyncResult<Self> {
        Self::with_base_url(GRAPH_BASE_URL)
    }

    /// Client against another endpoint (tests, national clouds)
    pub fn with_base_url(base_url: impl Into<String>) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("chartsheet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn item_url(&self, share_id: &str) -> String {
        format!("{}/shares/{}/driveItem", self.base_url, share_id)
    }
}

#[async_trait]
impl RemoteSource for GraphClient {
    async fn fetch_meta(&self, share_id: &str, token: &str) -> SyncResult<DriveItemMeta> {
        let url = self.item_url(share_id);
        debug!(%url, "fetching drive item metadata");
        let response =
            send_with_retry(&self.retry, || self.http.get(&url).bearer_auth(token).send()).await?;
        Ok(response.json::<DriveItemMeta>().await?)
    }

    async fn fetch_content(&self, share_id: &str, token: &str) -> SyncResult<Vec<u8>> {
        let url = format!("{}/content", self.item_url(share_id));
        debug!(%url, "downloading drive item content");
        let response =
            send_with_retry(&self.retry, || self.http.get(&url).bearer_auth(token).send()).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
