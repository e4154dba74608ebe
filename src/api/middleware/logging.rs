//! Request logging and request-id propagation

use std::convert::Infallible;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequestParts, MatchedPath},
    http::{HeaderValue, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::info;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of the current request.
///
/// Taken from the inbound `x-request-id` header when present, otherwise
/// generated. The logging middleware stores it in the request extensions and
/// echoes it on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_parts(parts: &Parts) -> Self {
        if let Some(id) = parts.extensions.get::<RequestId>() {
            return id.clone();
        }

        parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= 128)
            .map(|v| RequestId(v.to_string()))
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()))
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Logs each request with method, matched path, status, latency and request
/// id. Credential headers are redacted.
///
/// Does not open its own span; `TraceLayer` already does.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let (mut parts, body) = request.into_parts();

    let method = parts.method.clone();
    let path = extract_path(&parts);
    let request_id = RequestId::from_parts(&parts);
    parts.extensions.insert(request_id.clone());

    info!(
        method = %method,
        path = %path,
        request_id = %request_id.as_str(),
        headers = %redact_headers(&parts),
        "Incoming request"
    );

    let mut response = next.run(Request::from_parts(parts, body)).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        request_id = %request_id.as_str(),
        "Request completed"
    );

    response
}

fn extract_path(parts: &Parts) -> String {
    parts
        .extensions
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// Redact sensitive headers for logging
fn redact_headers(parts: &Parts) -> String {
    let mut logged = Vec::new();

    for (name, value) in &parts.headers {
        let name = name.as_str().to_lowercase();

        if !should_log_header(&name) {
            continue;
        }

        let value = if is_sensitive_header(&name) {
            "[REDACTED]".to_string()
        } else {
            value.to_str().unwrap_or("[invalid]").to_string()
        };

        logged.push(format!("{}={}", name, value));
    }

    logged.join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization"
            | "x-api-key"
            | "cookie"
            | "set-cookie"
            | "x-auth-token"
            | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "x-request-id"
            | "x-forwarded-for"
            | "authorization"
            | "x-api-key"
            | "cookie"
    )
}
