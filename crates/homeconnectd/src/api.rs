use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::sse;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::engine::EngineError;
use crate::engine::Platform;
use crate::engine::ToIntegrationMessage;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
    integrations: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Optional body of the turn_on endpoint
#[derive(Debug, Default, Deserialize)]
struct TurnOnRequest {
    #[serde(default)]
    brightness: Option<u8>,
    #[serde(default)]
    rgb: Option<[u8; 3]>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    version: &'static str,
    engine: Arc<Engine>,
}

/// Errors returned by command endpoints
#[derive(Debug)]
enum CommandError {
    UnknownEntity(String),
    NotControllable(String, Platform),
    Engine(EngineError),
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            CommandError::UnknownEntity(entity_id) => {
                (StatusCode::NOT_FOUND, format!("Unknown entity: {}", entity_id))
            }
            CommandError::NotControllable(entity_id, platform) => (
                StatusCode::BAD_REQUEST,
                format!("Entity {} ({}) cannot be turned on or off", entity_id, platform),
            ),
            CommandError::Engine(e @ EngineError::EntityNotFound(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            CommandError::Engine(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<EngineError> for CommandError {
    fn from(e: EngineError) -> Self {
        CommandError::Engine(e)
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
            integrations: state.engine.integration_count(),
        }),
    )
}

/// Handler for GET /v1/state
#[tracing::instrument(skip(state))]
async fn snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.engine.state_snapshot();
    (StatusCode::OK, Json(snapshot.as_ref().clone()))
}

/// Handler for GET /v1/events
///
/// Streams every engine event as a JSON `data:` frame until the client disconnects.
#[tracing::instrument(skip(state))]
async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<sse::Event, std::convert::Infallible>>> {
    let stream = BroadcastStream::new(state.engine.subscribe()).filter_map(|result| match result {
        Ok(event) => match sse::Event::default().json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                tracing::warn!("Failed to encode event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("Event subscriber lagged, {} events dropped", skipped);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Build the on/off command for an entity, based on its platform
fn power_command(
    engine: &Engine,
    entity_id: String,
    on: bool,
    request: TurnOnRequest,
) -> Result<ToIntegrationMessage, CommandError> {
    let platform = engine
        .state_snapshot()
        .entities
        .get(&entity_id)
        .map(|info| info.platform)
        .ok_or_else(|| CommandError::UnknownEntity(entity_id.clone()))?;

    match platform {
        Platform::Light => Ok(ToIntegrationMessage::LightCommand {
            entity_id,
            on,
            brightness: request.brightness,
            rgb: request.rgb,
        }),
        Platform::Switch => Ok(ToIntegrationMessage::SwitchCommand { entity_id, on }),
        other => Err(CommandError::NotControllable(entity_id, other)),
    }
}

/// Handler for POST /v1/entities/:entity_id/turn_on
#[tracing::instrument(skip(state, body))]
async fn turn_on(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
    body: Option<Json<TurnOnRequest>>,
) -> Result<StatusCode, CommandError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let msg = power_command(&state.engine, entity_id, true, request)?;
    state.engine.send_command(msg)?;
    Ok(StatusCode::ACCEPTED)
}

/// Handler for POST /v1/entities/:entity_id/turn_off
#[tracing::instrument(skip(state))]
async fn turn_off(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> Result<StatusCode, CommandError> {
    let msg = power_command(&state.engine, entity_id, false, TurnOnRequest::default())?;
    state.engine.send_command(msg)?;
    Ok(StatusCode::ACCEPTED)
}

/// Handler for POST /v1/entities/:entity_id/services/:service
#[tracing::instrument(skip(state, body))]
async fn call_service(
    State(state): State<Arc<AppState>>,
    Path((entity_id, service)): Path<(String, String)>,
    body: Option<Json<serde_json::Value>>,
) -> Result<StatusCode, CommandError> {
    let data = body
        .map(|Json(v)| v)
        .unwrap_or(serde_json::Value::Object(Default::default()));
    state.engine.send_command(ToIntegrationMessage::ServiceCall {
        entity_id,
        service,
        data,
    })?;
    Ok(StatusCode::ACCEPTED)
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/state", get(snapshot))
        .route("/v1/events", get(events))
        .route("/v1/entities/:entity_id/turn_on", post(turn_on))
        .route("/v1/entities/:entity_id/turn_off", post(turn_off))
        .route(
            "/v1/entities/:entity_id/services/:service",
            post(call_service),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// This function will bind to the specified address and serve the API endpoints.
/// It will run until the provided shutdown signal is triggered.
///
/// # Arguments
/// * `listen` - The IP address to listen on (e.g., "127.0.0.1")
/// * `port` - The port to listen on (e.g., 8565)
/// * `engine` - Engine whose state is exposed and which receives commands
/// * `shutdown_rx` - A oneshot receiver that will trigger graceful shutdown
pub async fn serve(
    listen: String,
    port: u16,
    engine: Arc<Engine>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let version = env!("CARGO_PKG_VERSION");

    let state = Arc::new(AppState { version, engine });
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
