//! # lifelink_api
//!
//! HTTP API gateway for Lifelink.
//!
//! Route groups declare their gate stages statically at registration time:
//! `public` carries none, `authed` runs the session check, and the
//! role-restricted groups nest a role check inside the session check.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::Next;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};

use lifelink_core::auth::assertion::IdentityVerifier;
use lifelink_core::store::cache::ConnectionCache;

use crate::config::ApiConfig;
use crate::handlers::{blogs, donation_requests, fundings, session, users};
use crate::middleware::auth::{self, ADMIN_ONLY, DONOR_ONLY};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lazily-initialized shared handle to the resource store.
    pub store: Arc<ConnectionCache>,
    /// Verifier for external identity assertions.
    pub verifier: Arc<IdentityVerifier>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no gate)
    let public = Router::new()
        .route("/session", post(session::create_session_handler))
        .route("/users", post(users::register_handler))
        .route("/donation-requests", get(donation_requests::list_requests_handler))
        .route("/blogs", get(blogs::list_blogs_handler));

    // Session-gated routes (authenticated, no role restriction)
    let authed = Router::new()
        .route("/users/{key}", get(users::get_user_handler))
        .route(
            "/donation-requests/user/{email}",
            get(donation_requests::list_user_requests_handler),
        )
        .route(
            "/donation-requests/{id}",
            patch(donation_requests::update_request_handler)
                .delete(donation_requests::delete_request_handler),
        )
        .route(
            "/fundings",
            post(fundings::create_funding_handler).get(fundings::list_fundings_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // Admin routes. Layers run outermost-last-added: the session check
    // always runs before the role check.
    let admin = Router::new()
        .route("/users", get(users::list_users_handler))
        .route("/users/{key}", patch(users::update_user_handler))
        .route("/blogs", post(blogs::create_blog_handler))
        .route_layer(axum::middleware::from_fn(
            |request: Request, next: Next| auth::require_roles(ADMIN_ONLY, request, next),
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // Donor routes
    let donor = Router::new()
        .route(
            "/donation-requests",
            post(donation_requests::create_request_handler),
        )
        .route_layer(axum::middleware::from_fn(
            |request: Request, next: Next| auth::require_roles(DONOR_ONLY, request, next),
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .merge(public)
        .merge(authed)
        .merge(admin)
        .merge(donor)
        .layer(cors)
        .with_state(state)
}
