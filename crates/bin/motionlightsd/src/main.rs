//! # motionlightsd — motion lights daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and install logging
//! - Seed the virtual home with the configured entity states
//! - Start one coordinator per configured light group
//! - Build the axum router over the running groups
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT), then stop every group
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use motionlights_adapter_http_axum::state::AppState;
use motionlights_adapter_virtual::VirtualHome;
use motionlights_app::registry::LightGroups;
use motionlights_app::runtime;
use motionlights_app::scheduler::TokioScheduler;
use motionlights_domain::entity::{EntitySnapshot, EntityState};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let home = seed_home(&config);

    let mut groups = LightGroups::new();
    for group in &config.groups {
        let handle = runtime::spawn(
            group.name.clone(),
            group.settings.clone(),
            home.clone(),
            TokioScheduler,
        )
        .await
        .with_context(|| format!("starting light group {}", group.name))?;
        groups.insert(handle);
    }
    tracing::info!(groups = groups.len(), "light groups started");

    let groups = Arc::new(groups);
    let state = AppState::from_arcs(Arc::clone(&groups), Arc::new(home));
    let app = motionlights_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "motionlightsd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    groups.shutdown_all().await;
    Ok(())
}

/// Virtual home holding the configured seeds. Lights that are not seeded
/// start `off`.
fn seed_home(config: &Config) -> VirtualHome {
    let home = VirtualHome::new();
    for group in &config.groups {
        for light in &group.settings.lights {
            home.insert(light.clone(), EntitySnapshot::new(EntityState::Off));
        }
    }
    for seed in &config.entities {
        home.insert(seed.entity_id.clone(), seed.snapshot.clone());
    }
    home
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
