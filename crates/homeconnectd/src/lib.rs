pub mod api;
pub mod config;
mod engine;
mod integrations;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::BinarySensorState;
pub use engine::Engine;
pub use engine::EngineError;
pub use engine::Event;
pub use engine::LightState;
pub use engine::SensorState;
pub use engine::SensorValue;
pub use engine::State;
pub use engine::SwitchState;
