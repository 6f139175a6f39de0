mod device;
#[allow(clippy::module_inception)]
mod engine;
mod entity;
mod event;
mod integration;
mod message;
pub mod state;

pub use device::Device;
pub use engine::Engine;
pub use engine::EngineError;
pub use entity::EntityInfo;
pub use entity::Platform;
pub use entity::slugify;
pub use event::Event;
pub use integration::FromIntegrationSender;
pub use integration::Integration;
pub use integration::IntegrationContext;
pub use integration::IntegrationError;
pub use integration::IntegrationFactoryResult;
pub use integration::REGISTRY as INTEGRATION_REGISTRY;
pub use message::FromIntegrationMessage;
pub use message::ToIntegrationMessage;
pub use state::BinarySensorState;
pub use state::LightState;
pub use state::SensorState;
pub use state::SensorValue;
pub use state::State;
pub use state::SwitchState;
