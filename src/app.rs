use std::net::SocketAddr;

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    api,
    config::AppConfig,
    db,
    discovery::{discover_routers, RouterTable},
    state::AppState,
};

/// Run the startup sequence: connect, create the schema, discover routers,
/// prepare the log directory. Every error here is fatal.
pub async fn init(config: AppConfig) -> anyhow::Result<Router> {
    let state = AppState::init(config).await?;
    db::bootstrap_schema(&state.db, state.config.bootstrap_timeout).await?;

    info!(api_dir = %state.config.api_dir.display(), "discovering routers");
    let mut table = RouterTable::new();
    let report = discover_routers(
        &state.config.api_dir,
        &state.config.api_package,
        api::ENDPOINTS,
        &mut table,
    )?;
    info!(
        mounted = table.len(),
        missing = report.missing.len(),
        without_router = report.without_router.len(),
        duplicates = report.duplicates.len(),
        reserved = report.reserved.len(),
        "router discovery finished"
    );
    if table.is_empty() {
        warn!("no routers mounted; only /health and /log are served");
    }

    std::fs::create_dir_all(&state.config.log_dir)
        .with_context(|| format!("create log dir {}", state.config.log_dir.display()))?;

    Ok(build_app(state, table.into_router()))
}

pub fn build_app(state: AppState, routers: Router<AppState>) -> Router {
    let log_dir = ServeDir::new(&state.config.log_dir);
    Router::new()
        .merge(routers)
        .route("/health", get(|| async { "ok" }))
        .nest_service("/log", log_dir)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
