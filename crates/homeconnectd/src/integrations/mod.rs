#[cfg(feature = "integration_homeconnect")]
pub mod homeconnect;
