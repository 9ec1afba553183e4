use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config::Environment;

/// Nothing here is a document: JSON, SVG avatars and socket upgrades only
const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'";

const HSTS: &str = "max-age=63072000; includeSubDomains";

/// Harden every response of the API
pub async fn security_headers_middleware(
    State(environment): State<Environment>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), environment);
    response
}

/// Add the hardening headers for a JSON and WebSocket service
///
/// Responses that set a cookie are never cached. HSTS is only sent outside
/// development, where the service is plain HTTP on localhost.
pub fn apply_security_headers(headers: &mut HeaderMap, environment: Environment) {
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    if headers.contains_key(header::SET_COOKIE) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    if !environment.is_development() {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[test]
    fn test_api_headers() {
        let mut headers = HeaderMap::new();

        apply_security_headers(&mut headers, Environment::Development);

        assert_eq!(headers[header::CONTENT_SECURITY_POLICY], CONTENT_SECURITY_POLICY);
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::REFERRER_POLICY], "no-referrer");
        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert!(!headers.contains_key(header::CACHE_CONTROL));
    }

    #[test]
    fn test_hsts_outside_development() {
        let mut headers = HeaderMap::new();

        apply_security_headers(&mut headers, Environment::Production);

        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], HSTS);
    }

    #[test]
    fn test_cookie_responses_are_not_cached() {
        let mut headers = HeaderMap::new();
        headers.insert(header::SET_COOKIE, HeaderValue::from_static("session_token=x"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("public"));

        apply_security_headers(&mut headers, Environment::Production);

        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_middleware_keeps_handler_headers() {
        async fn avatar() -> impl IntoResponse {
            (
                [(header::CACHE_CONTROL, "public, max-age=86400")],
                "<svg/>",
            )
        }

        let app = Router::new().route("/avatar", get(avatar)).layer(
            middleware::from_fn_with_state(Environment::Development, security_headers_middleware),
        );

        let request = Request::builder().uri("/avatar").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=86400");
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
    }
}
