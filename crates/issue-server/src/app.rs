use anyhow::Context;
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    AppState, config::IssueServerConfig, db, middleware::add_version_headers, routes,
};

/// The full HTTP surface of the service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::issues::router(&state))
        .layer(middleware::from_fn(add_version_headers))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

pub struct Server;

impl Server {
    pub async fn run(config: IssueServerConfig) -> anyhow::Result<()> {
        let pool = db::connect(&config.database_url)
            .await
            .context("failed to connect to database")?;
        db::migrate(&pool)
            .await
            .context("failed to run database migrations")?;

        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;
        let addr = listener.local_addr()?;

        let state = AppState::new(pool, config);
        tracing::info!(%addr, "issue server listening");

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        tracing::info!("issue server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(?error, "failed to listen for shutdown signal");
    }
}
