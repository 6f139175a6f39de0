//! Contract between the engine and the integrations it hosts.

use std::error::Error;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::sync::mpsc;

use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use crate::config::Config;

/// Bounded channel from integrations to the engine; a full channel slows the integration down
pub type FromIntegrationSender = mpsc::Sender<FromIntegrationMessage>;
pub type FromIntegrationReceiver = mpsc::Receiver<FromIntegrationMessage>;

/// Unbounded channel from the engine to one integration, so routing a command never blocks
pub type ToIntegrationSender = mpsc::UnboundedSender<ToIntegrationMessage>;

/// Error returned by integration lifecycle methods
pub type IntegrationError = Box<dyn Error + Send>;

/// Result type for integration factory functions
pub type IntegrationFactoryResult = anyhow::Result<Option<Box<dyn Integration>>>;

/// Builds an integration from configuration, or `Ok(None)` when it is not configured
pub type IntegrationFactory = fn(&IntegrationContext) -> IntegrationFactoryResult;

/// Everything a factory may look at while building its integration
pub struct IntegrationContext<'a> {
    pub config: &'a Config,
}

#[distributed_slice]
pub static REGISTRY: [IntegrationFactory];

/// An integration owns a set of devices and their entities.
///
/// The engine calls `setup` once, then `handle_message` for every command
/// addressed to one of the integration's entities, and `shutdown` when the
/// command channel closes.
#[async_trait]
pub trait Integration: Send + Sync {
    /// Name used to route commands; reported with every discovered entity
    fn name(&self) -> &str;

    /// Discover devices, report their entities and initial states, and start
    /// any background work (polling, event streams) that reports through `tx`
    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), IntegrationError>;

    /// Execute a command addressed to one of this integration's entities
    async fn handle_message(&mut self, msg: ToIntegrationMessage) -> Result<(), IntegrationError>;

    /// Stop background work
    async fn shutdown(&mut self) -> Result<(), IntegrationError>;
}
