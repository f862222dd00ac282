//! Campus assistant web front end
//!
//! (c) Softlandia 2025

use campus_chat_server::api;
use campus_chat_server::config::Settings;
use campus_chat_server::core::traits::{SessionStore, TaskRegistry};
use campus_chat_server::core::worker::{self, ChatQueue};
use campus_chat_server::infrastructure::traits::LanguageModel;
use campus_chat_server::services;

use anyhow::anyhow;
use axum::http::{HeaderValue, Method};
use di_axum::RouterServiceProviderExtensions;
use log::info;
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("campus_chat_server=info,warn")),
        )
        .init();

    let settings = Settings::from_env()?;
    info!("configuration: {settings:?}");

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task(settings))
}

async fn web_server_task(settings: Settings) -> anyhow::Result<()> {
    let (queue, job_receiver) = ChatQueue::new(settings.chat_queue_capacity);
    let provider = services(settings.clone(), queue)
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e}"))?;

    let registry = provider.get_required::<dyn TaskRegistry>();
    let sessions = provider.get_required::<dyn SessionStore>();
    let model = provider.get_required::<dyn LanguageModel>();

    // background tasks for chat jobs and eviction
    let dispatcher = tokio::spawn(worker::background_task(
        job_receiver,
        registry.clone(),
        model,
        settings.chat_workers,
    ));
    let sweeper = tokio::spawn(worker::eviction_task(
        registry,
        sessions,
        settings.eviction_interval,
    ));

    let app = api::router(&settings)
        .layer(cors_layer(&settings.cors_allowed_origins)?)
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(settings.bind_address).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down...");

    sweeper.abort();
    dispatcher.abort();
    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(origins))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
