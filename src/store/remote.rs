use crate::errors::{TrackerError, TrackerResult};
use reqwest::Client;

/// Supabase-style REST mirror over a single `user_data` table
/// (id TEXT PRIMARY KEY, content jsonb, updated_at timestamptz).
/// Last write wins at the remote; there is no merge strategy.
#[derive(Clone)]
pub struct RemoteMirror {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteMirror {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Upsert one collection blob. Caller logs failures; a failed
    /// mirror write never rolls back the local one.
    pub async fn push(&self, key: &str, content: &serde_json::Value, updated_at: &str) -> TrackerResult<()> {
        let url = format!("{}/rest/v1/user_data", self.base_url);
        let body = serde_json::json!({
            "id": key,
            "content": content,
            "updated_at": updated_at,
        });

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::Sync(format!("mirror request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TrackerError::Sync(format!("mirror HTTP {status}: {body}")));
        }
        Ok(())
    }

    /// Fetch one collection blob; `None` when the row does not exist.
    pub async fn fetch(&self, key: &str) -> TrackerResult<Option<serde_json::Value>> {
        let url = format!(
            "{}/rest/v1/user_data?id=eq.{key}&select=content",
            self.base_url
        );

        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| TrackerError::Sync(format!("mirror request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TrackerError::Sync(format!("mirror HTTP {status}: {body}")));
        }

        let rows: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| TrackerError::Sync(format!("mirror parse: {e}")))?;

        Ok(rows.into_iter().next().and_then(|mut row| {
            row.get_mut("content").map(serde_json::Value::take)
        }))
    }
}
