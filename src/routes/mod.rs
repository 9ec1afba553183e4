pub mod avatar;
pub mod health;
pub mod session;
pub mod websocket;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::{rate_limit_middleware, security_headers_middleware},
    state::AppState,
};

/// Build the application router with every route and middleware layer
pub fn router(state: AppState) -> Router {
    let session_routes = if state.config.environment.is_development() {
        get(session::current_session).post(session::create_session)
    } else {
        get(session::current_session)
    };

    Router::new()
        // Health and root
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/api/stats", get(health::stats))
        // Session glue
        .route("/api/session", session_routes)
        .route("/signout", get(session::sign_out))
        // Avatars
        .route("/api/avatar/:address", get(avatar::avatar))
        // WebSocket
        .route(
            "/api/game/board/size/:size",
            get(websocket::websocket_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.config.environment,
                    security_headers_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    Arc::clone(&state.rate_limiter),
                    rate_limit_middleware,
                ))
                .layer(cors_layer(&state.public_url)),
        )
        .with_state(state)
}

/// CORS for the public site plus local development origins
fn cors_layer(public_url: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = [public_url, "http://localhost:8000", "http://127.0.0.1:8000"]
        .iter()
        .filter_map(|origin| match origin.trim_end_matches('/').parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unusable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
