use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    routing::get,
    Router,
};
use server_api::ApiContext;
use shared::protocol::{TOURS_ROUTE, UPLOADS_ROUTE};
use storage::{prepare_database_url, LocalImageStore, Storage};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let images =
        LocalImageStore::open(&settings.uploads_dir, settings.image_public_base()?).await?;

    let api = ApiContext {
        storage,
        images: Arc::new(images),
        link_policy: settings.link_policy,
    };
    let state = AppState {
        api,
        max_image_bytes: settings.max_image_bytes,
    };
    let app = build_router(Arc::new(state), &settings)?;

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        uploads_dir = %settings.uploads_dir.display(),
        link_policy = %settings.link_policy,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, settings: &Settings) -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/healthz", get(healthz))
        .route(
            TOURS_ROUTE,
            get(api::http_list_tours).post(api::http_create_tour),
        )
        .route("/api/tours/:tour_id", get(api::http_get_tour))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&settings.uploads_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let Some(origin) = settings.cors_origin.as_deref() else {
        return Ok(router);
    };
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid cors origin '{origin}'"))?;
    Ok(router.layer(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    ))
}

async fn healthz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            warn!(error = %format!("{error:#}"), "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
