/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (principal lookup, revocation store, gate)
 * - Router 組み立て (gate + HTTP middleware) と axum::serve()
 * - revocation sweeper の起動と停止
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware::{self, http::HttpLimits},
    repos::user_repo::PgPrincipalLookup,
    services::auth::{build_access_gate, revocation::sweeper},
    state::AppState,
};

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,note_gate=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may not be collected; make sure the panic reaches the log.
        tracing::error!(?info, "panic");

        // Development: crash loudly. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        app_env = ?config.app_env,
        addr = %config.addr,
        revocation_backend = ?config.revocation_backend,
        "starting access gate"
    );

    let state = build_state(&config).await?;

    let sweeper = sweeper::spawn(
        state.gate.revocations().clone(),
        config.revocation_sweep_interval,
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("shut down");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    // Lazy: the pool connects on first lookup, startup does not need the DB.
    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.upstream_timeout)
        .connect_lazy(&config.database_url)
        .context("parsing DATABASE_URL")?;

    let principals = Arc::new(PgPrincipalLookup::new(db));
    let gate = build_access_gate(config, api::v1::markers(), principals)
        .await
        .context("building revocation store")?;

    Ok(AppState::new(gate))
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new().nest(api::v1::PREFIX, api::v1::routes());
    let router = middleware::auth::access::apply(router, state.clone()).with_state(state);

    middleware::http::apply(router, HttpLimits::default())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        // Without a signal handler, keep serving rather than exit at once.
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
