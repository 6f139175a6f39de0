use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::HomeConnectConfig;
use super::appliance::ApplianceInfo;
use super::appliance::StatusMap;
use super::client::ApiError;
use super::client::ApplianceRequest;
use super::client::HomeConnectClient;
use super::device::ApplianceKind;
use super::entity::Adapter;
use super::entity::Appliance;
use super::events::ApplianceEvent;
use super::keys;
use super::services::Service;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::Integration;
use crate::engine::IntegrationError;
use crate::engine::ToIntegrationMessage;

/// Appliances keyed by haId
type AppliancesMap = Arc<Mutex<HashMap<String, Appliance>>>;

/// Attempts at listing appliances during setup
const SETUP_ATTEMPTS: usize = 20;
const SETUP_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Home Connect integration for homeconnectd
///
/// Discovers the account's appliances, keeps their status current through
/// polling and the per-appliance event streams, and executes entity commands.
pub struct HomeConnectIntegration<C: HomeConnectClient> {
    client: Arc<C>,
    config: HomeConnectConfig,
    appliances: AppliancesMap,
    /// entity_id -> haId of the owning appliance
    entity_index: HashMap<String, String>,
    to_engine: Option<FromIntegrationSender>,
    /// Poll and event stream tasks
    tasks: Vec<JoinHandle<()>>,
}

/// Send messages to the engine, giving up once the channel is closed
async fn report(to_engine: &FromIntegrationSender, messages: Vec<FromIntegrationMessage>) {
    for msg in messages {
        if to_engine.send(msg).await.is_err() {
            warn!("Engine channel closed, dropping state updates");
            return;
        }
    }
}

impl<C: HomeConnectClient + 'static> HomeConnectIntegration<C> {
    /// Create a new Home Connect integration
    pub fn new(client: C, config: &HomeConnectConfig) -> Self {
        Self {
            client: Arc::new(client),
            config: config.clone(),
            appliances: Arc::new(Mutex::new(HashMap::new())),
            entity_index: HashMap::new(),
            to_engine: None,
            tasks: Vec::new(),
        }
    }

    /// List appliances, retrying while the cloud API is not yet reachable
    async fn fetch_appliances(client: &C) -> Result<Vec<ApplianceInfo>, ApiError> {
        let mut attempt = 1;
        loop {
            match client.get_appliances().await {
                Ok(appliances) => return Ok(appliances),
                Err(e) if attempt < SETUP_ATTEMPTS => {
                    debug!("Listing appliances failed (attempt {}): {}", attempt, e);
                    attempt += 1;
                    tokio::time::sleep(SETUP_RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch status, settings and active program into a fresh status map.
    ///
    /// `None` when the status itself is unavailable; settings and active
    /// program failures are tolerated.
    async fn fetch_status(client: &C, ha_id: &str) -> Option<StatusMap> {
        let mut status: StatusMap = match client.get_status(ha_id).await {
            Ok(items) => items.into_iter().collect(),
            Err(e) => {
                debug!("Unable to fetch status of {}: {}. Probably offline.", ha_id, e);
                return None;
            }
        };

        match client.get_settings(ha_id).await {
            Ok(items) => status.merge(items),
            Err(e) => debug!("Unable to fetch settings of {}: {}. Probably offline.", ha_id, e),
        }

        match client.get_active_program(ha_id).await {
            Ok(Some(program)) => {
                status.set(keys::ACTIVE_PROGRAM, json!(program.key));
                status.merge(program.options);
            }
            Ok(None) => {}
            Err(e) => debug!(
                "Unable to fetch active program of {}: {}. Probably offline.",
                ha_id, e
            ),
        }

        Some(status)
    }

    /// Re-fetch one appliance and report entities whose state changed
    async fn refresh_appliance(
        client: &C,
        appliances: &AppliancesMap,
        to_engine: &FromIntegrationSender,
        ha_id: &str,
    ) {
        let Some(fetched_at) = appliances.lock().await.get(ha_id).map(Appliance::revision) else {
            return;
        };
        let Some(status) = Self::fetch_status(client, ha_id).await else {
            return;
        };

        let messages = {
            let mut appliances_guard = appliances.lock().await;
            let Some(appliance) = appliances_guard.get_mut(ha_id) else {
                return;
            };
            if !appliance.replace_status(status, fetched_at) {
                return;
            }
            appliance.update_entities(Utc::now())
        };
        report(to_engine, messages).await;
    }

    /// Poll every appliance at the configured interval
    async fn poll_task(
        client: Arc<C>,
        appliances: AppliancesMap,
        to_engine: FromIntegrationSender,
        period: Duration,
    ) {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;

            let ha_ids: Vec<String> = appliances.lock().await.keys().cloned().collect();
            debug!("Polling {} appliances", ha_ids.len());
            for ha_id in ha_ids {
                Self::refresh_appliance(&client, &appliances, &to_engine, &ha_id).await;
            }
        }
    }

    /// Follow an appliance's event stream, reopening it after `retry` whenever it ends
    async fn event_task(
        client: Arc<C>,
        appliances: AppliancesMap,
        to_engine: FromIntegrationSender,
        ha_id: String,
        retry: Duration,
    ) {
        loop {
            match client.open_events(&ha_id).await {
                Ok(mut events) => {
                    info!("Listening for events from {}", ha_id);
                    while let Some(event) = events.recv().await {
                        if !Self::handle_event(&appliances, &to_engine, &ha_id, event).await {
                            info!("Stopped following events from {}", ha_id);
                            return;
                        }
                    }
                    debug!("Event stream for {} closed", ha_id);
                }
                Err(e) => warn!("Failed to open event stream for {}: {}", ha_id, e),
            }
            tokio::time::sleep(retry).await;
        }
    }

    /// Apply one event. Returns `false` once the appliance is no longer tracked.
    async fn handle_event(
        appliances: &AppliancesMap,
        to_engine: &FromIntegrationSender,
        ha_id: &str,
        event: ApplianceEvent,
    ) -> bool {
        let messages = {
            let mut appliances_guard = appliances.lock().await;
            let Some(appliance) = appliances_guard.get_mut(ha_id) else {
                return false;
            };

            match event {
                ApplianceEvent::KeepAlive => return true,
                ApplianceEvent::Connected => {
                    info!("Appliance {} connected", ha_id);
                    appliance.info.connected = true;
                    return true;
                }
                ApplianceEvent::Disconnected => {
                    info!("Appliance {} disconnected", ha_id);
                    appliance.info.connected = false;
                    appliance.clear_status();
                    appliance.update_entities(Utc::now())
                }
                ApplianceEvent::Paired => {
                    info!("Appliance {} paired", ha_id);
                    return true;
                }
                ApplianceEvent::Depaired => {
                    info!("Appliance {} depaired, removing its entities", ha_id);
                    let messages = appliance.removal_messages();
                    appliances_guard.remove(ha_id);
                    drop(appliances_guard);
                    report(to_engine, messages).await;
                    return false;
                }
                event => {
                    debug!("Event from {}: {:?}", ha_id, event);
                    if !appliance.apply_event(event) {
                        return true;
                    }
                    appliance.update_entities(Utc::now())
                }
            }
        };
        report(to_engine, messages).await;
        true
    }

    fn sender(&self) -> Result<&FromIntegrationSender, IntegrationError> {
        self.to_engine.as_ref().ok_or_else(|| -> IntegrationError {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "integration has not been set up",
            ))
        })
    }

    /// haId of the appliance owning `entity_id`, logging unknown ids
    fn owner(&self, entity_id: &str) -> Option<String> {
        let ha_id = self.entity_index.get(entity_id).cloned();
        if ha_id.is_none() {
            error!("Unknown Home Connect entity: {}", entity_id);
        }
        ha_id
    }

    /// Re-fetch an appliance after a command and report what changed
    async fn refresh_after_command(&self, ha_id: &str) -> Result<(), IntegrationError> {
        let to_engine = self.sender()?;
        Self::refresh_appliance(&self.client, &self.appliances, to_engine, ha_id).await;
        Ok(())
    }

    /// Record a rejected command on the entity and report the resulting state
    async fn command_failed(
        &self,
        ha_id: &str,
        entity_id: &str,
        on: bool,
    ) -> Result<(), IntegrationError> {
        let message = {
            let mut appliances_guard = self.appliances.lock().await;
            let entity = appliances_guard
                .get_mut(ha_id)
                .and_then(|appliance| appliance.entity_mut(entity_id));
            match entity {
                Some(entity) => {
                    let changed = match &mut entity.adapter {
                        Adapter::PowerSwitch(switch) => switch.command_failed(on),
                        Adapter::Light(light) => light.command_failed(on),
                        _ => false,
                    };
                    changed.then(|| entity.adapter.state_message(entity_id))
                }
                None => None,
            }
        };
        if let Some(message) = message {
            report(self.sender()?, vec![message]).await;
        }
        Ok(())
    }

    async fn handle_switch_command(
        &mut self,
        entity_id: String,
        on: bool,
    ) -> Result<(), IntegrationError> {
        let Some(ha_id) = self.owner(&entity_id) else {
            return Ok(());
        };

        let request = {
            let mut appliances_guard = self.appliances.lock().await;
            let adapter = appliances_guard
                .get_mut(&ha_id)
                .and_then(|appliance| appliance.entity_mut(&entity_id))
                .map(|entity| &entity.adapter);
            match adapter {
                Some(Adapter::ProgramSwitch(switch)) => switch.command(on),
                Some(Adapter::PowerSwitch(switch)) => switch.command(on),
                _ => {
                    warn!("Entity {} is not a switch", entity_id);
                    return Ok(());
                }
            }
        };

        info!("Turning {} {}", entity_id, if on { "on" } else { "off" });
        if let Err(e) = self.client.send(&ha_id, &request).await {
            error!(
                "Failed to turn {} {}: {}",
                entity_id,
                if on { "on" } else { "off" },
                e
            );
            self.command_failed(&ha_id, &entity_id, on).await?;
        }

        self.refresh_after_command(&ha_id).await
    }

    async fn handle_light_command(
        &mut self,
        entity_id: String,
        on: bool,
        brightness: Option<u8>,
        rgb: Option<[u8; 3]>,
    ) -> Result<(), IntegrationError> {
        let Some(ha_id) = self.owner(&entity_id) else {
            return Ok(());
        };

        let requests = {
            let mut appliances_guard = self.appliances.lock().await;
            let adapter = appliances_guard
                .get_mut(&ha_id)
                .and_then(|appliance| appliance.entity_mut(&entity_id))
                .map(|entity| &entity.adapter);
            match adapter {
                Some(Adapter::Light(light)) => light.commands(on, brightness, rgb),
                _ => {
                    warn!("Entity {} is not a light", entity_id);
                    return Ok(());
                }
            }
        };

        info!(
            "Light command for {}: on={}, brightness={:?}, rgb={:?}",
            entity_id, on, brightness, rgb
        );
        for request in &requests {
            if let Err(e) = self.client.send(&ha_id, request).await {
                error!("Failed to update light {}: {}", entity_id, e);
                self.command_failed(&ha_id, &entity_id, on).await?;
                break;
            }
        }

        self.refresh_after_command(&ha_id).await
    }

    async fn handle_service_call(
        &mut self,
        entity_id: String,
        service: String,
        data: serde_json::Value,
    ) -> Result<(), IntegrationError> {
        let Some(ha_id) = self.owner(&entity_id) else {
            return Ok(());
        };

        let service =
            Service::parse(&service, &data).map_err(|e| -> IntegrationError { Box::new(e) })?;
        let request: ApplianceRequest = service.request();

        info!("Calling {:?} on {}", service, ha_id);
        if let Err(e) = self.client.send(&ha_id, &request).await {
            error!("Service call {:?} on {} failed: {}", service, ha_id, e);
        }

        self.refresh_after_command(&ha_id).await
    }
}

#[async_trait]
impl<C: HomeConnectClient + 'static> Integration for HomeConnectIntegration<C> {
    fn name(&self) -> &str {
        "homeconnect"
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), IntegrationError> {
        info!("Setting up Home Connect integration");
        self.to_engine = Some(tx.clone());

        let infos = Self::fetch_appliances(&self.client)
            .await
            .map_err(|e| -> IntegrationError { Box::new(e) })?;
        info!("Found {} Home Connect appliances", infos.len());

        let mut used_ids = HashSet::new();
        let mut discovered = Vec::new();
        for info in infos {
            let Some(kind) = ApplianceKind::from_type(&info.appliance_type) else {
                warn!(
                    "Appliance type {} not implemented, skipping {} ({})",
                    info.appliance_type, info.name, info.ha_id
                );
                continue;
            };

            if !info.connected {
                info!("{} ({}) is not connected", info.name, info.ha_id);
            }

            let status = Self::fetch_status(&self.client, &info.ha_id)
                .await
                .unwrap_or_default();
            let mut appliance = Appliance::new(info, kind, status, &mut used_ids);
            appliance.update_entities(Utc::now());
            debug!(
                "Initialized {} {} (E-Nr {}) with {} entities",
                appliance.kind,
                appliance.ha_id(),
                appliance.info.enumber.as_deref().unwrap_or("unknown"),
                appliance.entities.len()
            );
            discovered.push(appliance);
        }

        for appliance in &discovered {
            let mut messages = vec![FromIntegrationMessage::DeviceDiscovered {
                device: appliance.device(),
            }];
            for entity in &appliance.entities {
                self.entity_index
                    .insert(entity.info.entity_id.clone(), appliance.ha_id().to_string());
                messages.push(FromIntegrationMessage::EntityDiscovered {
                    info: entity.info.clone(),
                    integration_name: self.name().to_string(),
                });
            }
            messages.extend(appliance.state_messages());
            report(&tx, messages).await;
        }

        let ha_ids: Vec<String> = discovered.iter().map(|a| a.ha_id().to_string()).collect();
        {
            let mut appliances_guard = self.appliances.lock().await;
            for appliance in discovered {
                appliances_guard.insert(appliance.ha_id().to_string(), appliance);
            }
        }

        self.tasks.push(tokio::spawn(Self::poll_task(
            self.client.clone(),
            self.appliances.clone(),
            tx.clone(),
            Duration::from_secs(self.config.scan_interval_secs),
        )));
        for ha_id in ha_ids {
            self.tasks.push(tokio::spawn(Self::event_task(
                self.client.clone(),
                self.appliances.clone(),
                tx.clone(),
                ha_id,
                Duration::from_secs(self.config.event_retry_secs),
            )));
        }

        info!("Home Connect integration setup complete");
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), IntegrationError> {
        match msg {
            ToIntegrationMessage::SwitchCommand { entity_id, on } => {
                self.handle_switch_command(entity_id, on).await
            }
            ToIntegrationMessage::LightCommand {
                entity_id,
                on,
                brightness,
                rgb,
            } => {
                self.handle_light_command(entity_id, on, brightness, rgb)
                    .await
            }
            ToIntegrationMessage::ServiceCall {
                entity_id,
                service,
                data,
            } => self.handle_service_call(entity_id, service, data).await,
        }
    }

    async fn shutdown(&mut self) -> Result<(), IntegrationError> {
        info!("Shutting down Home Connect integration");
        for task in self.tasks.drain(..) {
            task.abort();
        }
        Ok(())
    }
}
