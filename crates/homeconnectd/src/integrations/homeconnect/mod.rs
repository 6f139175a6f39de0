mod appliance;
mod auth;
mod binary_sensor;
mod client;
mod config;
mod device;
mod entity;
mod events;
#[allow(clippy::module_inception)]
mod homeconnect;
mod keys;
mod light;
mod programs;
mod sensor;
mod services;
mod switch;

use anyhow::Context;
pub use config::HomeConnectConfig;
pub use homeconnect::HomeConnectIntegration;
use linkme::distributed_slice;

use crate::engine;

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_homeconnect(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let hc_config = if let Some(c) = &ctx.config.integrations.homeconnect {
        c
    } else {
        return Ok(None);
    };

    let client =
        client::ReqwestClient::new(hc_config).context("Failed to create Home Connect client")?;
    Ok(Some(Box::new(HomeConnectIntegration::new(client, hc_config))))
}
