//! HTTP routes for Medlr
//!
//! This module defines all HTTP endpoints exposed by the API.

pub mod health;
pub mod medicines;
pub mod metrics;
pub mod pharmacies;
pub mod root;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{middleware::auth::auth_middleware, AppState};

/// Upper bound on a single request, store and cache round-trips included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Every write sits behind credential verification; reads on the same
    // paths stay public, so the layer is attached per method router.
    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let pharmacy_routes = Router::new()
        .route(
            "/api/v1/pharmacies",
            get(pharmacies::list_pharmacies).merge(
                post(pharmacies::create_pharmacy).route_layer(authenticated.clone()),
            ),
        )
        .route(
            "/api/v1/pharmacies/:id",
            get(pharmacies::get_pharmacy).merge(
                put(pharmacies::update_pharmacy)
                    .delete(pharmacies::delete_pharmacy)
                    .route_layer(authenticated.clone()),
            ),
        )
        .route(
            "/api/v1/pharmacies/name/:name",
            get(pharmacies::get_pharmacy_by_name).merge(
                put(pharmacies::update_pharmacy_by_name)
                    .delete(pharmacies::delete_pharmacy_by_name)
                    .route_layer(authenticated.clone()),
            ),
        );

    let medicine_routes = Router::new()
        .route(
            "/api/v1/medicine",
            get(medicines::list_medicines).merge(
                post(medicines::create_medicine).route_layer(authenticated.clone()),
            ),
        )
        .route(
            "/api/v1/medicine/:id",
            get(medicines::get_medicine).merge(
                put(medicines::update_medicine)
                    .delete(medicines::delete_medicine)
                    .route_layer(authenticated.clone()),
            ),
        )
        .route(
            "/api/v1/medicine/name/:name",
            get(medicines::get_medicines_by_name).merge(
                put(medicines::update_medicines_by_name)
                    .delete(medicines::delete_medicines_by_name)
                    .route_layer(authenticated.clone()),
            ),
        )
        .route(
            "/api/v1/medicine/pharmacy/:pharmacy_id",
            get(medicines::get_medicines_by_pharmacy),
        );

    let account_routes = Router::new()
        .route("/person/register", post(users::register))
        .route("/person/login", post(users::login))
        .route(
            "/api/v1/protected",
            get(root::protected).route_layer(authenticated),
        );

    // Public routes (health checks, metrics) - no auth required
    let public_routes = Router::new()
        .route("/", get(root::index))
        .route("/api/v1", get(root::api_index))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(pharmacy_routes)
        .merge(medicine_routes)
        // Global middleware (applied to all routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
