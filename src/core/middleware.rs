use crate::core::error::AppError;
use crate::features::auth::services::TokenService;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Cookie that carries the access token for browser clients
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        // Parse origins into HeaderValue
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(auth_header) = auth_header {
                if let Some(encoded) = auth_header.strip_prefix("Basic ") {
                    if let Ok(decoded) = BASE64_STANDARD.decode(encoded) {
                        if let Ok(creds) = String::from_utf8(decoded) {
                            if creds == *credentials {
                                return Ok(next.run(req).await);
                            }
                        }
                    }
                }
            }

            let response = Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")
                .body(Body::from("Unauthorized"))
                .unwrap();

            Err(response)
        })
    }
}

/// Pulls the access credential from the request. The `access_token` cookie
/// wins over the `Authorization: Bearer` header; whichever is found first is
/// the one that gets verified, with no fallback to the other on failure.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get(header::COOKIE).and_then(|h| h.to_str().ok()) {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == ACCESS_TOKEN_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credential = extract_credential(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing access credential".to_string()))?;

    // Verifies signature and expiry, then re-checks the account against the
    // database so deactivations apply to live tokens immediately.
    let principal = tokens.authenticate(&credential).await?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_wins_over_bearer_header() {
        let map = headers(&[
            (header::COOKIE, "theme=dark; access_token=cookie-token"),
            (header::AUTHORIZATION, "Bearer header-token"),
        ]);
        assert_eq!(extract_credential(&map).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_bearer_header_when_no_cookie() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer header-token")]);
        assert_eq!(extract_credential(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_unrelated_cookies_are_ignored() {
        let map = headers(&[
            (header::COOKIE, "theme=dark; session=abc"),
            (header::AUTHORIZATION, "Bearer header-token"),
        ]);
        assert_eq!(extract_credential(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_missing_credential() {
        assert_eq!(extract_credential(&HeaderMap::new()), None);
        // Non-bearer schemes do not count as credentials.
        let map = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_credential(&map), None);
    }
}
