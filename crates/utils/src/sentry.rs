//! Sentry wiring shared by the service binaries. Everything here is inert
//! unless `SENTRY_DSN` is set.

use std::sync::OnceLock;

use sentry_tracing::{EventFilter, SentryLayer};
use tracing::Level;

static INIT_GUARD: OnceLock<sentry::ClientInitGuard> = OnceLock::new();

fn dsn() -> Option<String> {
    std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())
}

fn environment() -> &'static str {
    if cfg!(debug_assertions) {
        "dev"
    } else {
        "production"
    }
}

pub fn is_enabled() -> bool {
    INIT_GUARD.get().is_some()
}

/// Initialises the client once per process and tags events with `service`.
pub fn init_once(service: &'static str) {
    let Some(dsn) = dsn() else {
        return;
    };

    INIT_GUARD.get_or_init(|| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: Some(environment().into()),
                ..Default::default()
            },
        ))
    });

    sentry::configure_scope(|scope| scope.set_tag("service", service));
}

pub fn configure_user_scope(user_id: &str, nickname: Option<&str>, email: Option<&str>) {
    if !is_enabled() {
        return;
    }

    let user = sentry::User {
        id: Some(user_id.to_string()),
        username: nickname.map(str::to_string),
        email: email.map(str::to_string),
        ..Default::default()
    };
    sentry::configure_scope(|scope| scope.set_user(Some(user)));
}

/// Errors become Sentry events, warnings and info become breadcrumbs.
pub fn sentry_layer<S>() -> SentryLayer<S>
where
    S: tracing::Subscriber,
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    SentryLayer::default()
        .span_filter(|meta| *meta.level() <= Level::INFO)
        .event_filter(|meta| match *meta.level() {
            Level::ERROR => EventFilter::Event,
            Level::WARN | Level::INFO => EventFilter::Breadcrumb,
            Level::DEBUG | Level::TRACE => EventFilter::Ignore,
        })
}
