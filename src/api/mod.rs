pub mod auth;
mod bookings;
pub mod error;
mod extract;
mod payment;
mod profile;
pub mod rate_limit;
mod services;
mod staff;
mod validation;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Credential endpoints (tight rate limit)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_auth,
        ));

    let api_routes = Router::new()
        // Bookings
        .route(
            "/booking",
            get(bookings::list_bookings)
                .post(bookings::create_booking)
                .put(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        // Staff
        .route(
            "/staff",
            get(staff::list_staff)
                .post(staff::create_staff)
                .put(staff::update_staff)
                .delete(staff::delete_staff),
        )
        // Profiles
        .route(
            "/profile",
            get(profile::get_profile)
                .post(profile::create_profile)
                .put(profile::update_profile),
        )
        // Catalog
        .route("/services", get(services::list_services))
        // Payment links
        .route("/payment", post(payment::create_payment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_api,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", auth_routes.merge(api_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server))
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

async fn health_check() -> &'static str {
    "OK"
}


#[cfg(test)]
mod tests {
    use super::test_support::{send, test_state};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health() {
        let state = test_state().await;
        let response = send(&state, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = test_state().await;
        let response = send(&state, Method::GET, "/api/nope", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_staff_method_gate() {
        let state = test_state().await;
        let response = send(&state, Method::PATCH, "/api/staff", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key("allow"));
    }
}
