//! HTTP implementation of [`NoteStore`].
//!
//! Each RPC is a JSON POST to `{endpoint}/{method}` with bearer auth. The
//! wire details beyond that are the service's business; this module only
//! cares about decoding the tagged error payload.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::api::NoteStore;
use crate::error::{ClientError, RawApiError};
use crate::models::{Note, Notebook, RemoteNote};

/// Upper bound on any single remote call. Timeouts surface as
/// `Unknown`-coded transport errors; retrying is the caller's decision.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpNoteStore {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpNoteStore {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .map_err(ClientError::transport)?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        debug!(%url, "note service call");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(ClientError::transport);
        }

        match response.json::<RawApiError>().await {
            Ok(raw) => Err(ClientError::from_raw(raw)),
            Err(_) => Err(ClientError::transport(format!(
                "service returned {status} with an undecodable error body"
            ))),
        }
    }
}

#[derive(Serialize)]
struct NameParams<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct GuidParams<'a> {
    guid: &'a str,
}

#[derive(Deserialize)]
struct ExpungeResult {
    count: u64,
}

#[async_trait]
impl NoteStore for HttpNoteStore {
    async fn list_notebooks(&self) -> Result<Vec<Notebook>, ClientError> {
        self.call("notebooks.list", &serde_json::json!({})).await
    }

    async fn create_notebook(&self, name: &str) -> Result<Notebook, ClientError> {
        self.call("notebooks.create", &NameParams { name }).await
    }

    async fn create_note(&self, note: &Note) -> Result<RemoteNote, ClientError> {
        self.call("notes.create", note).await
    }

    async fn update_note(&self, note: &Note) -> Result<RemoteNote, ClientError> {
        self.call("notes.update", note).await
    }

    async fn expunge_note(&self, guid: &str) -> Result<u64, ClientError> {
        self.call::<_, ExpungeResult>("notes.expunge", &GuidParams { guid })
            .await
            .map(|r| r.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_endpoint_slash() {
        let store = HttpNoteStore::new("https://notes.example.com/api/", "tok").unwrap();
        assert_eq!(store.endpoint, "https://notes.example.com/api");
    }
}
