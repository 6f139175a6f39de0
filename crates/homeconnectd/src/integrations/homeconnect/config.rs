use serde::Deserialize;

const PRODUCTION_URL: &str = "https://api.home-connect.com";
const SIMULATOR_URL: &str = "https://simulator.home-connect.com";

fn default_scan_interval() -> u64 {
    60
}

fn default_event_retry() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

/// Configuration for the Home Connect integration
#[derive(Debug, Clone, Deserialize)]
pub struct HomeConnectConfig {
    /// OAuth client id of the registered application
    pub client_id: String,

    pub client_secret: String,

    /// Long-lived refresh token obtained through the authorization code flow
    pub refresh_token: String,

    /// Talk to the vendor's appliance simulator instead of real appliances
    #[serde(default)]
    pub simulate: bool,

    /// Overrides the API base URL (takes precedence over `simulate`)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Seconds between status polls
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Seconds to wait before reopening a dropped event stream
    #[serde(default = "default_event_retry")]
    pub event_retry_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl HomeConnectConfig {
    /// API base URL without trailing slash
    pub fn base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None if self.simulate => SIMULATOR_URL,
            None => PRODUCTION_URL,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", field));
            }
        }
        for (field, value) in [
            ("scan_interval_secs", self.scan_interval_secs),
            ("event_retry_secs", self.event_retry_secs),
        ] {
            if value == 0 {
                return Err(format!("{} must be greater than zero", field));
            }
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("base_url must be an http(s) URL, got {:?}", url));
            }
        }
        Ok(())
    }
}
