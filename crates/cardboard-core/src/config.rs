//! Configuration for the Trello client and aggregator

use crate::error::{CoreError, CoreResult};
use std::time::Duration;

pub const DEFAULT_TRELLO_API_URL: &str = "https://api.trello.com/1";

/// Trello refuses batch requests with more than 10 URLs
pub const MAX_BATCH_SIZE: usize = 10;

pub const DEFAULT_RECENT_MONTHS: u32 = 3;

/// Environment variables read by the binary's flags
pub const ENV_API_KEY: &str = "TRELLO_API_KEY";
pub const ENV_TOKEN: &str = "TRELLO_TOKEN";
pub const ENV_API_URL: &str = "TRELLO_API_URL";
pub const ENV_BATCH_SIZE: &str = "CARDBOARD_BATCH_SIZE";
pub const ENV_RECENT_MONTHS: &str = "CARDBOARD_RECENT_MONTHS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CARDBOARD_REQUEST_TIMEOUT_SECS";

/// Configuration for talking to Trello and shaping the card view
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the REST API, without trailing slash
    pub api_url: String,

    pub api_key: String,

    pub token: String,

    /// URLs per batch request (1..=10)
    pub batch_size: usize,

    /// Cards idle for longer than this many months are hidden
    pub recent_months: u32,

    /// Per-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TRELLO_API_URL.to_string(),
            api_key: String::new(),
            token: String::new(),
            batch_size: MAX_BATCH_SIZE,
            recent_months: DEFAULT_RECENT_MONTHS,
            request_timeout: None,
        }
    }
}

impl DashboardConfig {
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.api_key.trim().is_empty() || self.token.trim().is_empty() {
            return Err(CoreError::invalid_config(
                "Trello API key and token must both be set",
            ));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(CoreError::invalid_config(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if self.recent_months == 0 {
            return Err(CoreError::invalid_config(
                "recent months window must be at least 1",
            ));
        }
        Ok(())
    }

    /// Join a relative API path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{}/{}", base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::new("key", "tok");

        assert_eq!(config.api_url, DEFAULT_TRELLO_API_URL);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.recent_months, 3);
        assert!(config.request_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = DashboardConfig::new("key", " ").validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn test_batch_size_bounds() {
        let mut config = DashboardConfig::new("key", "tok");
        config.batch_size = 25;
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_month_window_rejected() {
        let mut config = DashboardConfig::new("key", "tok");
        config.recent_months = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let config = DashboardConfig {
            api_url: "http://localhost:9999/1/".to_string(),
            ..DashboardConfig::new("key", "tok")
        };
        assert_eq!(
            config.endpoint("/boards/b1/lists"),
            "http://localhost:9999/1/boards/b1/lists"
        );
    }
}
