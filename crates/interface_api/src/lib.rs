//! HTTP API Layer
//!
//! This crate exposes the general ledger over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for accounts, journal entries and
//!   opening balances
//! - **Extractors**: JSON, path and acting-user extraction with uniform
//!   rejections
//! - **Middleware**: Request logging
//! - **DTOs**: Request data transfer objects
//! - **Error Handling**: Every body has the `{success, error?, data?}` shape
//!
//! The router is generic over the [`LedgerStore`], so the server runs on
//! PostgreSQL while tests run on the in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(service));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_ledger::{LedgerService, LedgerStore};

use crate::handlers::{accounts, health, journal, opening};
use crate::middleware::request_logging;

/// Application state shared across handlers
pub struct AppState<S: LedgerStore> {
    pub service: Arc<LedgerService<S>>,
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `service` - Ledger service over the chosen store
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router<S: LedgerStore>(service: Arc<LedgerService<S>>) -> Router {
    let state = AppState { service };

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>));

    let account_routes = Router::new()
        .route(
            "/",
            get(accounts::list_accounts::<S>).post(accounts::create_account::<S>),
        )
        .route(
            "/:id",
            put(accounts::update_account::<S>).delete(accounts::delete_account::<S>),
        )
        .route("/:id/balance", get(accounts::account_balance::<S>));

    let journal_routes = Router::new()
        .route("/", post(journal::create_entry::<S>))
        .route("/:id", get(journal::get_entry::<S>))
        .route("/:id/post", post(journal::post_entry::<S>))
        .route("/:id/reverse", post(journal::reverse_entry::<S>));

    let opening_routes = Router::new()
        .route("/", post(opening::save_batch::<S>))
        .route("/:kind", get(opening::list_openings::<S>))
        .route(
            "/:kind/:id",
            axum::routing::delete(opening::delete_opening::<S>),
        );

    let api_routes = Router::new()
        .nest("/accounts", account_routes)
        .route("/trial-balance", get(accounts::trial_balance::<S>))
        .nest("/journal-entries", journal_routes)
        .nest("/opening-balances", opening_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
