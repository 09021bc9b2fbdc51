//! Facturio API Server
//!
//! A REST backend managing users, customers and invoices: ownership-scoped
//! CRUD, imperative validation, on-demand aggregates and the sequential
//! invoice-number (chrono) increment action.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{PostgresCustomerRepository, PostgresInvoiceRepository, PostgresUserRepository};
use app::{CustomerService, InvoiceService, UserService};
use config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<PostgresUserRepository>>,
    pub customer_service: Arc<
        CustomerService<
            PostgresCustomerRepository,
            PostgresInvoiceRepository,
            PostgresUserRepository,
        >,
    >,
    pub invoice_service: Arc<InvoiceService<PostgresInvoiceRepository, PostgresCustomerRepository>>,
    pub config: Config,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,facturio_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Facturio API...");

    // Load configuration
    let config = Config::from_env();

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connected");

    // Create adapters
    let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
    let customer_repo = Arc::new(PostgresCustomerRepository::new(db.clone()));
    let invoice_repo = Arc::new(PostgresInvoiceRepository::new(db.clone()));

    // Create application services
    let user_service = Arc::new(UserService::new(user_repo.clone()));
    let customer_service = Arc::new(CustomerService::new(
        customer_repo.clone(),
        invoice_repo.clone(),
        user_repo.clone(),
    ));
    let invoice_service = Arc::new(InvoiceService::new(
        invoice_repo.clone(),
        customer_repo.clone(),
    ));

    // Create app state
    let state = AppState {
        user_service,
        customer_service,
        invoice_service,
        config: config.clone(),
    };

    // Registration is the only unauthenticated write; throttle it per
    // client IP so an anonymous caller can't mint accounts in bulk.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .expect("Failed to build governor config"),
    );

    let registration_routes = Router::new()
        .route("/users", post(handlers::register))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // Protected routes (API-key auth)
    let protected_routes = Router::new()
        .route("/users/:id", get(handlers::get_user))
        .route(
            "/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/customers/:id",
            get(handlers::get_customer)
                .put(handlers::put_customer)
                .patch(handlers::patch_customer)
                .delete(handlers::delete_customer),
        )
        .route(
            "/customers/:id/invoices",
            get(handlers::list_customer_invoices),
        )
        .route(
            "/invoices",
            get(handlers::list_invoices).post(handlers::create_invoice),
        )
        .route(
            "/invoices/:id",
            get(handlers::get_invoice)
                .put(handlers::put_invoice)
                .patch(handlers::patch_invoice)
                .delete(handlers::delete_invoice),
        )
        .route("/invoices/:id/increment", post(handlers::increment_invoice))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Build router
    let app = Router::new()
        // Health check (no auth)
        .route("/health", get(health))
        .merge(registration_routes)
        .merge(protected_routes)
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
