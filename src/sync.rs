use serde::Deserialize;
use serde_json::Value;

use crate::models::Document;

pub const ENV_SYNC_URL: &str = "WORDQUIZ_SYNC_URL";

pub const GROUPS_COLLECTION: &str = "sharedGroups";
pub const PROBLEM_SETS_COLLECTION: &str = "sharedProblemSets";
pub const DATASET_COLLECTION: &str = "appData";
pub const DATASET_DOC_ID: &str = "global";

#[derive(Debug, Deserialize)]
struct CreatedDoc {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FetchedDoc {
    id: String,
    #[serde(default)]
    payload: Value,
}

/// Remote sharing over a small document server. Constructed only when
/// the server URL is configured; everything else in the app works
/// without it.
pub struct SyncClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl SyncClient {
    /// None when `WORDQUIZ_SYNC_URL` is unset or blank. Trailing slashes
    /// are trimmed so path joining stays predictable.
    pub fn from_env() -> Option<SyncClient> {
        let url = std::env::var(ENV_SYNC_URL).ok()?;
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(SyncClient {
            base_url: url.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        })
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    /// Publish a payload under `collection` and return the document id it
    /// lives under. With an explicit id the document is overwritten in
    /// place; otherwise a document with the same `name` field is reused,
    /// and a new one is created only when none exists.
    pub fn upload(
        &self,
        collection: &str,
        payload: &Value,
        id: Option<&str>,
    ) -> Result<String, String> {
        let target = match id {
            Some(id) => Some(id.to_string()),
            None => match payload.get("name").and_then(Value::as_str) {
                Some(name) => self.find_by_name(collection, name)?,
                None => None,
            },
        };

        let body = serde_json::json!({ "payload": payload });
        match target {
            Some(id) => {
                let resp = self
                    .http
                    .put(self.doc_url(collection, &id))
                    .json(&body)
                    .send()
                    .map_err(|e| format!("upload failed: {e}"))?;
                if !resp.status().is_success() {
                    return Err(format!("upload rejected: HTTP {}", resp.status()));
                }
                Ok(id)
            }
            None => {
                let resp = self
                    .http
                    .post(self.collection_url(collection))
                    .json(&body)
                    .send()
                    .map_err(|e| format!("upload failed: {e}"))?;
                if !resp.status().is_success() {
                    return Err(format!("upload rejected: HTTP {}", resp.status()));
                }
                let created: CreatedDoc = resp
                    .json()
                    .map_err(|e| format!("bad response from server: {e}"))?;
                Ok(created.id)
            }
        }
    }

    /// Fetch one payload by id. A missing document is Ok(None), not an
    /// error; only transport and server trouble surface as Err.
    pub fn download(&self, collection: &str, id: &str) -> Result<Option<Value>, String> {
        let resp = self
            .http
            .get(self.doc_url(collection, id))
            .send()
            .map_err(|e| format!("download failed: {e}"))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(format!("download rejected: HTTP {}", resp.status()));
        }
        let doc: FetchedDoc = resp
            .json()
            .map_err(|e| format!("bad response from server: {e}"))?;
        Ok(Some(doc.payload))
    }

    fn find_by_name(&self, collection: &str, name: &str) -> Result<Option<String>, String> {
        let resp = self
            .http
            .get(self.collection_url(collection))
            .query(&[("name", name)])
            .send()
            .map_err(|e| format!("lookup failed: {e}"))?;
        if !resp.status().is_success() {
            return Err(format!("lookup rejected: HTTP {}", resp.status()));
        }
        let docs: Vec<FetchedDoc> = resp
            .json()
            .map_err(|e| format!("bad response from server: {e}"))?;
        Ok(docs.into_iter().next().map(|d| d.id))
    }

    /// Replace the remote dataset with the whole local document.
    pub fn push_all(&self, doc: &Document) -> Result<(), String> {
        let payload =
            serde_json::to_value(doc).map_err(|e| format!("could not encode dataset: {e}"))?;
        self.upload(DATASET_COLLECTION, &payload, Some(DATASET_DOC_ID))?;
        Ok(())
    }

    /// The remote dataset, or None if it was never pushed. The caller
    /// decides whether to overwrite local state with it.
    pub fn pull_all(&self) -> Result<Option<Document>, String> {
        match self.download(DATASET_COLLECTION, DATASET_DOC_ID)? {
            Some(value) => {
                let doc = serde_json::from_value(value)
                    .map_err(|e| format!("remote dataset is malformed: {e}"))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // one test for all env states: tests in a binary run in parallel and
    // the variable is process-global
    #[test]
    fn test_from_env() {
        unsafe { std::env::remove_var(ENV_SYNC_URL) };
        assert!(SyncClient::from_env().is_none());

        unsafe { std::env::set_var(ENV_SYNC_URL, "   ") };
        assert!(SyncClient::from_env().is_none());

        unsafe { std::env::set_var(ENV_SYNC_URL, "http://localhost:8787/") };
        let client = SyncClient::from_env().unwrap();
        assert_eq!(
            client.doc_url(DATASET_COLLECTION, DATASET_DOC_ID),
            "http://localhost:8787/appData/global"
        );
        assert_eq!(
            client.collection_url(GROUPS_COLLECTION),
            "http://localhost:8787/sharedGroups"
        );
        unsafe { std::env::remove_var(ENV_SYNC_URL) };
    }
}
