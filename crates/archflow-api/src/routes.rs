use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth::auth_middleware, handlers, AppState};

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route("/api/analyze", post(handlers::analyze))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .merge(protected)
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state)),
        )
}

/// Credentialed CORS restricted to the configured allow-list plus
/// local-network development origins.
fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed = state.config.cors.allowed_origins.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| origin_allowed(&allowed, origin))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(handlers::AI_KEY_HEADER),
        ])
        .allow_credentials(true)
}

fn origin_allowed(allowed: &[String], origin: &str) -> bool {
    allowed.iter().any(|a| a == origin) || is_local_network_origin(origin)
}

fn is_local_network_origin(origin: &str) -> bool {
    let Some(host) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    let host = host.split(':').next().unwrap_or(host);

    host == "localhost"
        || host == "127.0.0.1"
        || host.starts_with("192.168.")
        || host.starts_with("10.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_origins_are_allowed() {
        let allowed = vec!["https://archflow.io".to_string()];
        assert!(origin_allowed(&allowed, "https://archflow.io"));
        assert!(!origin_allowed(&allowed, "https://evil.example"));
    }

    #[test]
    fn local_network_origins_are_allowed_on_any_port() {
        let allowed: Vec<String> = vec![];
        assert!(origin_allowed(&allowed, "http://localhost:3000"));
        assert!(origin_allowed(&allowed, "http://127.0.0.1:8080"));
        assert!(origin_allowed(&allowed, "http://192.168.1.42:3000"));
        assert!(origin_allowed(&allowed, "http://10.0.0.5"));
        assert!(!origin_allowed(&allowed, "http://203.0.113.9"));
        assert!(!origin_allowed(&allowed, "not-a-url"));
    }
}
