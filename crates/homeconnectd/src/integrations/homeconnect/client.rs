use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

use super::appliance::ApplianceInfo;
use super::appliance::StatusItem;
use super::auth::TokenManager;
use super::config::HomeConnectConfig;
use super::events::ApplianceEvent;
use super::events::SseParser;

/// Media type of every Home Connect request and response body
const MEDIA_TYPE: &str = "application/vnd.bsh.sdk.v1+json";

const EVENT_CHANNEL_SIZE: usize = 64;

/// The server sends KEEP-ALIVE about every 55 seconds; silence longer than this means
/// the connection is gone.
const EVENT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors returned by the Home Connect API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Home Connect API returned {status}: {key}: {description}")]
    Status {
        status: u16,
        key: String,
        description: String,
    },

    #[error("Token refresh failed: {0}")]
    Auth(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Write operation against one appliance
#[derive(Debug, Clone, PartialEq)]
pub enum ApplianceRequest {
    StartProgram { program: String },
    StopProgram,
    SelectProgram { program: String },
    SetSetting { key: String, value: serde_json::Value },
    SetActiveOption { key: String, value: serde_json::Value },
    SetSelectedOption { key: String, value: serde_json::Value },
    Command { key: String },
}

impl ApplianceRequest {
    /// HTTP method, path below `/api/homeappliances/{haId}` and body
    fn http_parts(&self) -> (reqwest::Method, String, Option<serde_json::Value>) {
        use reqwest::Method;
        use serde_json::json;

        match self {
            ApplianceRequest::StartProgram { program } => (
                Method::PUT,
                "/programs/active".to_string(),
                Some(json!({ "data": { "key": program, "options": [] } })),
            ),
            ApplianceRequest::StopProgram => (Method::DELETE, "/programs/active".to_string(), None),
            ApplianceRequest::SelectProgram { program } => (
                Method::PUT,
                "/programs/selected".to_string(),
                Some(json!({ "data": { "key": program, "options": [] } })),
            ),
            ApplianceRequest::SetSetting { key, value } => (
                Method::PUT,
                format!("/settings/{}", key),
                Some(json!({ "data": { "key": key, "value": value } })),
            ),
            ApplianceRequest::SetActiveOption { key, value } => (
                Method::PUT,
                format!("/programs/active/options/{}", key),
                Some(json!({ "data": { "key": key, "value": value } })),
            ),
            ApplianceRequest::SetSelectedOption { key, value } => (
                Method::PUT,
                format!("/programs/selected/options/{}", key),
                Some(json!({ "data": { "key": key, "value": value } })),
            ),
            ApplianceRequest::Command { key } => (
                Method::PUT,
                format!("/commands/{}", key),
                Some(json!({ "data": { "key": key, "value": true } })),
            ),
        }
    }
}

/// Program currently running on an appliance, with its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveProgram {
    pub key: String,
    #[serde(default)]
    pub options: Vec<StatusItem>,
}

/// Trait for Home Connect API operations
///
/// This trait allows for mocking the cloud API for testing purposes
#[async_trait]
pub trait HomeConnectClient: Send + Sync {
    /// List every appliance paired with the account
    async fn get_appliances(&self) -> Result<Vec<ApplianceInfo>, ApiError>;

    async fn get_status(&self, ha_id: &str) -> Result<Vec<StatusItem>, ApiError>;

    async fn get_settings(&self, ha_id: &str) -> Result<Vec<StatusItem>, ApiError>;

    /// `None` when no program is running
    async fn get_active_program(&self, ha_id: &str) -> Result<Option<ActiveProgram>, ApiError>;

    async fn send(&self, ha_id: &str, request: &ApplianceRequest) -> Result<(), ApiError>;

    /// Open the appliance's event stream
    ///
    /// The receiver yields decoded events until the stream ends.
    async fn open_events(&self, ha_id: &str) -> Result<mpsc::Receiver<ApplianceEvent>, ApiError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct AppliancesData {
    homeappliances: Vec<ApplianceInfo>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: Vec<StatusItem>,
}

#[derive(Debug, Deserialize)]
struct SettingsData {
    settings: Vec<StatusItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    key: String,
    #[serde(default)]
    description: Option<String>,
}

/// Build an `ApiError::Status` from an error response body
fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => ApiError::Status {
            status: status.as_u16(),
            key: envelope.error.key,
            description: envelope.error.description.unwrap_or_default(),
        },
        Err(_) => ApiError::Status {
            status: status.as_u16(),
            key: "unknown".to_string(),
            description: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Mock Home Connect client for testing
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockHomeConnectClient {
    pub appliances: Vec<ApplianceInfo>,
    pub status: std::sync::Mutex<std::collections::HashMap<String, Vec<StatusItem>>>,
    pub settings: std::collections::HashMap<String, Vec<StatusItem>>,
    pub active_programs: std::collections::HashMap<String, ActiveProgram>,
    /// Calls to `get_appliances` that fail before the list is returned
    pub appliance_failures: std::sync::Mutex<usize>,
    /// Requests that are rejected by the mock
    pub rejected: Vec<ApplianceRequest>,
    pub sent: std::sync::Mutex<Vec<(String, ApplianceRequest)>>,
    pub event_senders:
        std::sync::Mutex<std::collections::HashMap<String, mpsc::Sender<ApplianceEvent>>>,
    /// Number of `open_events` calls per appliance
    pub events_opened: std::sync::Mutex<std::collections::HashMap<String, usize>>,
}

#[cfg(test)]
impl MockHomeConnectClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appliance(mut self, appliance: ApplianceInfo, status: Vec<StatusItem>) -> Self {
        self.status
            .get_mut()
            .unwrap()
            .insert(appliance.ha_id.clone(), status);
        self.appliances.push(appliance);
        self
    }

    pub fn sent_requests(&self) -> Vec<(String, ApplianceRequest)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_status(&self, ha_id: &str, status: Vec<StatusItem>) {
        self.status
            .lock()
            .unwrap()
            .insert(ha_id.to_string(), status);
    }

    /// Drop the server side of an appliance's event stream
    pub fn close_events(&self, ha_id: &str) {
        self.event_senders.lock().unwrap().remove(ha_id);
    }

    pub fn events_opened(&self, ha_id: &str) -> usize {
        self.events_opened
            .lock()
            .unwrap()
            .get(ha_id)
            .copied()
            .unwrap_or(0)
    }

    /// Push an event into an open event stream
    pub async fn emit(&self, ha_id: &str, event: ApplianceEvent) {
        let tx = self.event_senders.lock().unwrap().get(ha_id).cloned();
        tx.expect("event stream not open").send(event).await.unwrap();
    }

    fn offline() -> ApiError {
        ApiError::Status {
            status: 409,
            key: "SDK.Error.HomeAppliance.Connection.Initialization.Failed".to_string(),
            description: "HomeAppliance is offline".to_string(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl HomeConnectClient for MockHomeConnectClient {
    async fn get_appliances(&self) -> Result<Vec<ApplianceInfo>, ApiError> {
        let mut failures = self.appliance_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ApiError::Auth("temporarily unavailable".to_string()));
        }
        Ok(self.appliances.clone())
    }

    async fn get_status(&self, ha_id: &str) -> Result<Vec<StatusItem>, ApiError> {
        self.status
            .lock()
            .unwrap()
            .get(ha_id)
            .cloned()
            .ok_or_else(Self::offline)
    }

    async fn get_settings(&self, ha_id: &str) -> Result<Vec<StatusItem>, ApiError> {
        Ok(self.settings.get(ha_id).cloned().unwrap_or_default())
    }

    async fn get_active_program(&self, ha_id: &str) -> Result<Option<ActiveProgram>, ApiError> {
        Ok(self.active_programs.get(ha_id).cloned())
    }

    async fn send(&self, ha_id: &str, request: &ApplianceRequest) -> Result<(), ApiError> {
        self.sent
            .lock()
            .unwrap()
            .push((ha_id.to_string(), request.clone()));
        if self.rejected.contains(request) {
            return Err(Self::offline());
        }
        Ok(())
    }

    async fn open_events(&self, ha_id: &str) -> Result<mpsc::Receiver<ApplianceEvent>, ApiError> {
        *self
            .events_opened
            .lock()
            .unwrap()
            .entry(ha_id.to_string())
            .or_default() += 1;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        self.event_senders
            .lock()
            .unwrap()
            .insert(ha_id.to_string(), tx);
        Ok(rx)
    }
}

/// Real Home Connect client implementation using reqwest
pub struct ReqwestClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenManager,
}

impl ReqwestClient {
    /// Create a new ReqwestClient from configuration
    pub fn new(config: &HomeConnectConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = config.base_url().trim_end_matches('/').to_string();
        let tokens = TokenManager::new(
            http.clone(),
            format!("{}/security/oauth/token", base_url),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.refresh_token.clone(),
        );

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    fn appliance_url(&self, ha_id: &str, path: &str) -> String {
        format!("{}/api/homeappliances/{}{}", self.base_url, ha_id, path)
    }

    /// Send a request with auth headers, retrying once with a fresh token on 401
    async fn execute(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
        accept: &str,
    ) -> Result<reqwest::Response, ApiError> {
        for attempt in 0..2 {
            let token = self.tokens.access_token().await?;
            let mut request = self
                .http
                .request(method.clone(), url)
                .bearer_auth(token)
                .header(ACCEPT, accept);
            if let Some(body) = body {
                request = request
                    .header(CONTENT_TYPE, MEDIA_TYPE)
                    .body(serde_json::to_vec(body)?);
            }

            let response = request.send().await?;
            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && attempt == 0 {
                debug!("Access token rejected, refreshing");
                self.tokens.invalidate().await;
                continue;
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!("Home Connect rate limit reached for {}", url);
            }
            if !status.is_success() {
                let body = response.bytes().await?;
                return Err(status_error(status, &body));
            }
            return Ok(response);
        }
        Err(ApiError::Auth("access token rejected after refresh".to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.execute(reqwest::Method::GET, url, None, MEDIA_TYPE).await?;
        let body = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl HomeConnectClient for ReqwestClient {
    async fn get_appliances(&self) -> Result<Vec<ApplianceInfo>, ApiError> {
        let url = format!("{}/api/homeappliances", self.base_url);
        let data: AppliancesData = self.get_json(&url).await?;
        Ok(data.homeappliances)
    }

    async fn get_status(&self, ha_id: &str) -> Result<Vec<StatusItem>, ApiError> {
        let data: StatusData = self.get_json(&self.appliance_url(ha_id, "/status")).await?;
        Ok(data.status)
    }

    async fn get_settings(&self, ha_id: &str) -> Result<Vec<StatusItem>, ApiError> {
        let data: SettingsData = self.get_json(&self.appliance_url(ha_id, "/settings")).await?;
        Ok(data.settings)
    }

    async fn get_active_program(&self, ha_id: &str) -> Result<Option<ActiveProgram>, ApiError> {
        match self
            .get_json::<ActiveProgram>(&self.appliance_url(ha_id, "/programs/active"))
            .await
        {
            Ok(program) => Ok(Some(program)),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send(&self, ha_id: &str, request: &ApplianceRequest) -> Result<(), ApiError> {
        let (method, path, body) = request.http_parts();
        let url = self.appliance_url(ha_id, &path);
        debug!("{} {}", method, url);
        self.execute(method, &url, body.as_ref(), MEDIA_TYPE).await?;
        Ok(())
    }

    async fn open_events(&self, ha_id: &str) -> Result<mpsc::Receiver<ApplianceEvent>, ApiError> {
        let url = self.appliance_url(ha_id, "/events");
        let token = self.tokens.access_token().await?;

        // Separate client without the request timeout; the stream stays open indefinitely.
        let response = reqwest::Client::new()
            .get(&url)
            .bearer_auth(token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(status_error(status, &body));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        tokio::spawn(pump_events(
            response.bytes_stream(),
            tx,
            ha_id.to_string(),
            EVENT_IDLE_TIMEOUT,
        ));

        Ok(rx)
    }
}

/// Parse an event byte stream into `tx` until it ends, fails, goes quiet for `idle`, or
/// the receiver is dropped. Dropping `tx` tells the reader the stream is gone.
async fn pump_events<S, B, E>(
    mut stream: S,
    tx: mpsc::Sender<ApplianceEvent>,
    ha_id: String,
    idle: Duration,
) where
    S: futures::Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut parser = SseParser::new();
    loop {
        let chunk = match tokio::time::timeout(idle, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => {
                warn!("Event stream for {} failed: {}", ha_id, e);
                return;
            }
            Ok(None) => {
                debug!("Event stream for {} ended", ha_id);
                return;
            }
            Err(_) => {
                warn!("No events from {} for {:?}, dropping stream", ha_id, idle);
                return;
            }
        };
        for raw in parser.push(chunk.as_ref()) {
            match ApplianceEvent::from_raw(&raw) {
                Ok(Some(event)) => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                Ok(None) => debug!("Ignoring unknown event type {}", raw.event),
                Err(e) => warn!("Malformed {} event for {}: {}", raw.event, ha_id, e),
            }
        }
    }
}
