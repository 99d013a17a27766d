use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{ActivityEvent, ActivityLog, Error, Result};

/// Table activity rows live in unless configured otherwise.
pub const DEFAULT_TABLE: &str = "logs";

/// Connection settings for a PostgREST (Supabase) log store.
#[derive(Clone, Debug)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: Option<Url>,

    /// API key sent as `apikey` and bearer token.
    pub api_key: Option<String>,

    /// Table holding `{id, time, server, action}` rows.
    pub table: String,

    /// Request timeout.
    pub timeout: Duration,
}

impl Default for PostgrestConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            table: DEFAULT_TABLE.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Reads activity rows over the PostgREST HTTP interface.
///
/// Missing connection settings are not an error at construction: every read
/// reports [`Error::NotConfigured`] instead, so a monitor without log
/// credentials still runs.
#[derive(Clone, Debug)]
pub struct PostgrestActivityLog {
    client: Client,
    config: PostgrestConfig,
}

impl PostgrestActivityLog {
    /// Creates a new `PostgrestActivityLog`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: PostgrestConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(Error::Client)?;

        Ok(Self { client, config })
    }

    /// Whether both the URL and the API key are present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.url.is_some() && self.config.api_key.is_some()
    }

    fn table_url(&self, base: &Url) -> String {
        format!(
            "{}/rest/v1/{}",
            base.as_str().trim_end_matches('/'),
            self.config.table
        )
    }
}

#[async_trait]
impl ActivityLog for PostgrestActivityLog {
    async fn latest(&self, limit: usize) -> Result<Vec<ActivityEvent>> {
        let base = self.config.url.as_ref().ok_or(Error::NotConfigured("log store URL"))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(Error::NotConfigured("log store API key"))?;

        let limit = limit.to_string();
        let response = self
            .client
            .get(self.table_url(base))
            .query(&[
                ("select", "*"),
                ("order", "time.desc"),
                ("limit", limit.as_str()),
            ])
            .header("apikey", api_key)
            .bearer_auth(api_key)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Rejected { status, message });
        }

        let body = response.bytes().await.map_err(Error::Transport)?;
        let events: Vec<ActivityEvent> = serde_json::from_slice(&body)?;
        debug!("Read {} activity events", events.len());

        Ok(events)
    }
}
