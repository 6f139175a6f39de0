use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::event::Event;
use super::integration::FromIntegrationReceiver;
use super::integration::FromIntegrationSender;
use super::integration::Integration;
use super::integration::IntegrationContext;
use super::integration::ToIntegrationSender;
use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use super::state::State;

/// Errors raised while routing commands to integrations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No integration found for entity: {0}")]
    EntityNotFound(String),

    #[error("Integration channel not found: {0}")]
    IntegrationNotFound(String),

    #[error("Integration '{0}' is no longer accepting commands")]
    ChannelClosed(String),
}

/// homeconnectd engine
///
/// This structure handles the flow of events, sending commands to the correct integration,
/// and maintaining a view of the world with State.
pub struct Engine {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Map of entity_id -> integration name for routing messages
    entity_integration_map: std::sync::Mutex<HashMap<String, String>>,

    /// Communication channels to integrations (for commands)
    integration_channels: HashMap<String, ToIntegrationSender>,

    /// Receive messages from integrations (events)
    message_rx: Mutex<FromIntegrationReceiver>,

    /// Sender for integrations to report events back to the engine
    message_tx: FromIntegrationSender,

    /// Fan-out of state-change events to subscribers
    events: broadcast::Sender<Event>,

    /// Handles for integration tasks
    integration_handles: Vec<JoinHandle<()>>,
}

/// Capacity for the integration→engine message channel
/// Provides backpressure when integrations send faster than the engine can process
const FROM_INTEGRATION_CHANNEL_SIZE: usize = 1024;

/// Events buffered per subscriber before the slowest one starts lagging
const EVENT_CHANNEL_SIZE: usize = 256;

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        let (message_tx, message_rx) = mpsc::channel(FROM_INTEGRATION_CHANNEL_SIZE);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            state: ArcSwap::new(Arc::default()),
            entity_integration_map: std::sync::Mutex::new(HashMap::new()),
            integration_channels: HashMap::new(),
            message_rx: Mutex::new(message_rx),
            message_tx,
            events,
            integration_handles: Vec::new(),
        }
    }

    /// Register integrations from configuration
    ///
    /// Runs every factory in the integration registry; factories return `None`
    /// when their configuration section is absent.
    pub fn register_integrations_from_config(&mut self, cfg: &crate::config::Config) {
        let ctx = IntegrationContext { config: cfg };
        for constr in super::integration::REGISTRY {
            let integration = match constr(&ctx) {
                Ok(Some(i)) => i,
                Err(e) => {
                    error!("failed to setup integration: {:#}", e);
                    continue;
                }
                Ok(None) => continue,
            };
            let name = integration.name().to_string();
            self.register_integration(name, integration);
        }
    }

    /// Register an integration with the engine
    ///
    /// This spawns the integration in a background task, wires up channels,
    /// and starts its setup process.
    pub fn register_integration(&mut self, name: String, mut integration: Box<dyn Integration>) {
        let (to_integration_tx, mut to_integration_rx) = mpsc::unbounded_channel();
        let from_integration_tx = self.message_tx.clone();

        self.integration_channels
            .insert(name.clone(), to_integration_tx);

        let handle = tokio::spawn(async move {
            if let Err(e) = integration.setup(from_integration_tx).await {
                warn!("Integration '{}' setup failed: {}", name, e);
                return;
            }

            while let Some(msg) = to_integration_rx.recv().await {
                if let Err(e) = integration.handle_message(msg).await {
                    warn!("Integration '{}' failed to handle message: {}", name, e);
                }
            }

            if let Err(e) = integration.shutdown().await {
                warn!("Integration '{}' shutdown failed: {}", name, e);
            }
        });

        self.integration_handles.push(handle);
    }

    /// Number of integrations currently registered
    pub fn integration_count(&self) -> usize {
        self.integration_channels.len()
    }

    /// Send a command to an integration
    ///
    /// Routes the command to the appropriate integration based on entity_id.
    pub fn send_command(&self, msg: ToIntegrationMessage) -> Result<(), EngineError> {
        let entity_id = msg.entity_id().to_string();

        let integration_name = {
            let map = self
                .entity_integration_map
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            map.get(&entity_id)
                .cloned()
                .ok_or(EngineError::EntityNotFound(entity_id))?
        };

        let tx = self
            .integration_channels
            .get(&integration_name)
            .ok_or_else(|| EngineError::IntegrationNotFound(integration_name.clone()))?;

        tx.send(msg)
            .map_err(|_| EngineError::ChannelClosed(integration_name))
    }

    /// Run the engine's main event loop
    ///
    /// Processes incoming events from integrations and updates state. Returns once
    /// every sender (including the engine's own) has been dropped, or when `shutdown`
    /// resolves.
    pub async fn run(&self, shutdown: impl std::future::Future<Output = ()>) {
        info!("Engine starting");
        tokio::pin!(shutdown);

        let mut rx = self.message_rx.lock().await;
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => self.handle_event(msg),
                    None => break,
                },
                _ = &mut shutdown => break,
            }
        }

        info!("Engine shutting down");
    }

    /// Stop every integration and wait for it to finish
    pub async fn shutdown(mut self) {
        // Dropping the command channels ends each integration's message loop,
        // which then runs its own shutdown.
        self.integration_channels.clear();
        for handle in self.integration_handles.drain(..) {
            if let Err(e) = handle.await {
                warn!("Integration task ended abnormally: {}", e);
            }
        }
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// Subscribe to state-change events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Apply an integration message without running the event loop
    #[cfg(test)]
    pub(crate) fn apply(&self, msg: FromIntegrationMessage) {
        self.handle_event(msg);
    }

    fn update_state(&self, f: impl FnOnce(&mut State)) {
        let mut state = State::clone(&self.state.load());
        f(&mut state);
        self.state.store(Arc::new(state));
    }

    fn publish(&self, event: Event) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Handle an event from an integration
    fn handle_event(&self, msg: FromIntegrationMessage) {
        match msg {
            FromIntegrationMessage::DeviceDiscovered { device } => {
                info!("Device discovered: {} ({})", device.name, device.id);
                self.update_state(|state| {
                    state.devices.insert(device.id.clone(), device);
                });
            }
            FromIntegrationMessage::EntityDiscovered {
                info,
                integration_name,
            } => {
                info!(
                    "Entity discovered: {} (from {})",
                    info.entity_id, integration_name
                );

                // Record which integration owns this entity for command routing.
                // State is not populated until the first state-change message arrives.
                {
                    let mut map = self
                        .entity_integration_map
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    map.insert(info.entity_id.clone(), integration_name);
                }

                self.update_state(|state| {
                    if let Some(device_id) = &info.device_id {
                        if let Some(device) = state.devices.get_mut(device_id) {
                            device.add_entity(info.entity_id.clone());
                        }
                    }
                    state.entities.insert(info.entity_id.clone(), info);
                });
            }
            FromIntegrationMessage::EntityRemoved { entity_id } => {
                info!("Entity removed: {}", entity_id);

                self.update_state(|state| state.remove_entity(&entity_id));

                let mut map = self
                    .entity_integration_map
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                map.remove(&entity_id);
                drop(map);

                self.publish(Event::EntityRemoved { entity_id });
            }
            FromIntegrationMessage::LightStateChanged { entity_id, state } => {
                info!(
                    "Light state changed: {} -> on={:?}, brightness={:?}",
                    entity_id, state.on, state.brightness
                );
                self.update_state(|s| {
                    s.lights.insert(entity_id.clone(), state.clone());
                });
                self.publish(Event::LightStateChanged { entity_id, state });
            }
            FromIntegrationMessage::BinarySensorStateChanged { entity_id, state } => {
                info!("Binary sensor state changed: {} -> on={:?}", entity_id, state.on);
                self.update_state(|s| {
                    s.binary_sensors.insert(entity_id.clone(), state.clone());
                });
                self.publish(Event::BinarySensorStateChanged { entity_id, state });
            }
            FromIntegrationMessage::SensorStateChanged { entity_id, state } => {
                debug!("Sensor state changed: {} -> {:?}", entity_id, state.value);
                self.update_state(|s| {
                    s.sensors.insert(entity_id.clone(), state.clone());
                });
                self.publish(Event::SensorStateChanged { entity_id, state });
            }
            FromIntegrationMessage::SwitchStateChanged { entity_id, state } => {
                info!("Switch state changed: {} -> on={:?}", entity_id, state.on);
                self.update_state(|s| {
                    s.switches.insert(entity_id.clone(), state.clone());
                });
                self.publish(Event::SwitchStateChanged { entity_id, state });
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
