use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::BoxError;
use clap::Parser;
use ims_cache::{Coordinator, CxIdentity, Orchestrator};
use ims_hss::MockHssClient;
use ims_notify::HttpNotificationClient;
use ims_server::config::Config;
use ims_server::routes::build_router;
use ims_server::state::AppState;
use ims_store::memory::InMemoryStore;
use ims_store::Store;
use tower::ServiceBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn handle_request_timeout(err: BoxError) -> (StatusCode, String) {
    (StatusCode::SERVICE_UNAVAILABLE, format!("request timed out: {err}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::parse();

    tracing::info!(
        bind_addr = %config.bind_addr,
        hss_peer = %config.hss_peer,
        notify_endpoint = %config.notify_endpoint,
        "starting ims-server"
    );

    let local: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let remotes: Vec<Arc<dyn Store>> = config
        .remote_store_addrs()
        .into_iter()
        .map(|addr| {
            tracing::warn!(addr = %addr, "no real store backend wired in; standing in an in-memory replica");
            Arc::new(InMemoryStore::new()) as Arc<dyn Store>
        })
        .collect();

    let orchestrator = Orchestrator::new(local, remotes, config.cache_cas_retries);

    // A real deployment binds a Diameter-Cx stack here; the collaborator
    // trait is the boundary this core depends on (see ims-hss).
    tracing::warn!(hss_peer = %config.hss_peer, "no real Diameter Cx stack wired in; standing in a deterministic mock HSS client");
    let hss = Arc::new(MockHssClient::new());

    let notifier = Arc::new(HttpNotificationClient::new(config.notify_endpoint.clone()));

    let identity = CxIdentity {
        dest_realm: config.dest_realm.clone(),
        dest_host: config.dest_host.clone(),
        server_name: config.server_name.clone(),
    };

    let coordinator = Arc::new(Coordinator::new(orchestrator, hss, notifier, identity));
    let state = AppState::new(coordinator);

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_request_timeout))
            .layer(tower::timeout::TimeoutLayer::new(Duration::from_millis(
                config.op_timeout_ms,
            ))),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
