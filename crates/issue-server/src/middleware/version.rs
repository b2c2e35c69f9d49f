use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const SERVER_VERSION_HEADER: HeaderName = HeaderName::from_static("x-server-version");

/// Stamps every response, errors included, with the running crate version.
pub async fn add_version_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        SERVER_VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );
    response
}
