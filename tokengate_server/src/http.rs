//! Routes and response mapping
//!
//! The proxy can observe exactly two outcomes from `/auth/validate`: a
//! `200` carrying the verified subject in [`USER_ID_HEADER`], or a bare
//! `401`. Rejection reasons are logged and never echoed to the caller.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokengate_authority::Verifier;

/// Response header carrying the verified subject back to the proxy, for
/// use with `auth_request_set`
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-jwt-user-id");

/// Builds the service router
pub fn router(verifier: Verifier) -> Router {
    Router::new()
        .route("/auth/validate", get(validate))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn(trace_request))
        .with_state(verifier)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Decides one `auth_request` consultation
async fn validate(State(verifier): State<Verifier>, headers: HeaderMap) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let forwarded_for = header_str(&headers, "x-forwarded-for");
    let original_uri = header_str(&headers, "x-original-uri");

    match verifier.verify_header(authorization).await {
        Ok(token) => {
            tracing::info!(
                jwt.sub = token.subject().map(|sub| sub.as_str()),
                jwt.email = token.email(),
                client.forwarded_for = forwarded_for,
                request.original_uri = original_uri,
                "token accepted"
            );

            match token.subject().map(|sub| HeaderValue::from_str(sub.as_str())) {
                Some(Ok(user_id)) => {
                    (StatusCode::OK, [(USER_ID_HEADER, user_id)]).into_response()
                }
                Some(Err(_)) => {
                    tracing::warn!("verified subject is not representable as a header value");
                    StatusCode::OK.into_response()
                }
                None => StatusCode::OK.into_response(),
            }
        }
        Err(denied) => {
            let error: &dyn std::error::Error = &denied;
            tracing::info!(
                auth.reason = denied.reason(),
                error = error,
                client.forwarded_for = forwarded_for,
                request.original_uri = original_uri,
                "token rejected"
            );

            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// Logs each request before and after handling
///
/// The `Authorization` value never reaches the log; only whether a bearer
/// credential was present and how long it was.
async fn trace_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let bearer_len = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").map_or(0, str::len));

    tracing::debug!(
        http.method = %method,
        http.path = %path,
        auth.bearer_len = bearer_len,
        "request received"
    );

    let response = next.run(request).await;

    tracing::debug!(
        http.method = %method,
        http.path = %path,
        http.status = response.status().as_u16(),
        "request completed"
    );

    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
