//! Connection settings for the tables API.

use serde::{Deserialize, Serialize};

/// Configuration for [`PostgrestStore`](crate::PostgrestStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, without the `/rest/v1` suffix
    pub base_url: String,
    /// Anonymous (publishable) key, sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound for each HTTP call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// REST endpoint root.
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_url_trims_slash() {
        let config = StoreConfig {
            base_url: "https://abc.supabase.co/".into(),
            ..Default::default()
        };
        assert_eq!(config.rest_url(), "https://abc.supabase.co/rest/v1");
    }

    #[test]
    fn test_timeout_default_when_missing() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"base_url": "http://db"}"#).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.api_key.is_none());
    }
}
