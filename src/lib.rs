pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use axum::ServiceExt;

use crate::core::{config::Settings, identity, redis::RedisHandle, state::AppState, telemetry};
use crate::services::storage::StorageService;

pub async fn run() -> anyhow::Result<()> {
    let state = build_state().await?;

    if let Err(err) = core::bootstrap::ensure_admin(&state).await {
        tracing::error!(error = %err, "Failed to seed admin user");
    }

    let app = api::router::service(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        prefix = %state.settings().api().prefix,
        environment = %state.settings().runtime().environment.as_str(),
        "Question bank API listening"
    );

    let result = axum::serve(
        listener,
        ServiceExt::<axum::extract::Request>::into_make_service_with_connect_info::<SocketAddr>(
            app,
        ),
    )
    .with_graceful_shutdown(core::shutdown::shutdown_signal())
    .await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}

/// One-shot admin seeding for deployments that do not restart the API.
pub async fn run_seed_admin() -> anyhow::Result<()> {
    let state = build_state().await?;

    let outcome = core::bootstrap::ensure_admin(&state).await;
    state.redis().disconnect().await;

    match outcome? {
        core::bootstrap::AdminSeed::NotConfigured => {
            anyhow::bail!("ADMIN_EMAIL must be set to seed an admin user")
        }
        core::bootstrap::AdminSeed::Pending => {
            anyhow::bail!("No user with ADMIN_EMAIL exists; set ADMIN_IDENTITY_ID to create one")
        }
        seeded => {
            tracing::info!(outcome = ?seeded, "Admin seeding finished");
            Ok(())
        }
    }
}

async fn build_state() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; rate limiting disabled");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let identity = identity::resolver_from_settings(&settings)?;
    let storage = StorageService::from_settings(&settings).await?;

    Ok(AppState::new(settings, db_pool, redis, identity, storage))
}
