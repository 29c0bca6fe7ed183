//! Link Record Store: a thin key-value abstraction over the external
//! realtime database. Records are immutable after creation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{BotError, BotResult};

/// Server-assigned record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(pub String);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One generated download link. Create-once, read-many, delete-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub source_url: String,
    /// Direct-media URL; a pipe-separated video|audio composite when no
    /// muxed stream existed
    pub direct_url: String,
    pub short_url: String,
    pub title: String,
    pub format_id: String,
    /// Unix timestamp (seconds) at write time
    pub created_at: i64,
}

pub const UNKNOWN_TITLE: &str = "Unknown Title";

#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn create(&self, record: &LinkRecord) -> BotResult<RecordId>;
    async fn list_all(&self) -> BotResult<Vec<(RecordId, LinkRecord)>>;
    async fn delete(&self, id: &RecordId) -> BotResult<()>;

    /// Public URL of a stored record's metadata, when the backend has one.
    fn public_record_url(&self, _id: &RecordId) -> Option<String> {
        None
    }
}

/// Firebase Realtime Database REST client. The collection lives under
/// `{base}/downloads`; the backend assigns keys on POST.
pub struct FirebaseLinkStore {
    client: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseLinkStore {
    pub fn new(client: reqwest::Client, database_url: &str, auth: Option<String>) -> Self {
        Self {
            client,
            base_url: database_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    fn collection_url(&self) -> String {
        self.with_auth(format!("{}/downloads.json", self.base_url))
    }

    fn record_url(&self, id: &RecordId) -> String {
        self.with_auth(format!("{}/downloads/{}.json", self.base_url, id))
    }

    fn with_auth(&self, url: String) -> String {
        match &self.auth {
            Some(secret) => format!("{}?auth={}", url, secret),
            None => url,
        }
    }
}

#[async_trait]
impl LinkStore for FirebaseLinkStore {
    async fn create(&self, record: &LinkRecord) -> BotResult<RecordId> {
        let response = self
            .client
            .post(self.collection_url())
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::store_failure(format!(
                "create returned {}: {}",
                status, body
            )));
        }

        let push: PushResponse = response
            .json()
            .await
            .map_err(|e| BotError::store_failure(format!("bad create response: {}", e)))?;

        Ok(RecordId(push.name))
    }

    async fn list_all(&self) -> BotResult<Vec<(RecordId, LinkRecord)>> {
        let response = self.client.get(self.collection_url()).send().await?;

        if !response.status().is_success() {
            return Err(BotError::store_failure(format!(
                "list returned {}",
                response.status()
            )));
        }

        // Empty collections come back as JSON null
        let records: Option<HashMap<String, LinkRecord>> = response
            .json()
            .await
            .map_err(|e| BotError::store_failure(format!("bad list response: {}", e)))?;

        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(|(id, record)| (RecordId(id), record))
            .collect())
    }

    async fn delete(&self, id: &RecordId) -> BotResult<()> {
        let response = self.client.delete(self.record_url(id)).send().await?;

        if !response.status().is_success() {
            return Err(BotError::store_failure(format!(
                "delete {} returned {}",
                id,
                response.status()
            )));
        }

        Ok(())
    }

    fn public_record_url(&self, id: &RecordId) -> Option<String> {
        Some(format!("{}/downloads/{}.json", self.base_url, id))
    }
}
