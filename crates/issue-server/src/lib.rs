mod app;
pub mod auth;
pub mod config;
pub mod db;
mod middleware;
pub mod routes;
mod state;
pub mod summary;

use std::env;

pub use app::{Server, router};
pub use state::AppState;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::{Layer as _, SubscriberExt},
    util::SubscriberInitExt,
};
pub use utils::sentry::init_once as sentry_init_once;

/// JSON logs filtered by `RUST_LOG`, span traces for errors, and the Sentry
/// layer. Safe to call more than once.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlx=warn".to_string());
    let fmt_layer = fmt::layer()
        .json()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .boxed();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .with(utils::sentry::sentry_layer())
        .init();
}

pub fn configure_user_scope(user_id: uuid::Uuid, nickname: Option<&str>, email: Option<&str>) {
    utils::sentry::configure_user_scope(&user_id.to_string(), nickname, email);
}
