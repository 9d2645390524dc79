// server/src/main.rs

// Declare modules for the application
mod config;
mod errors;
mod state;
mod store;
mod web;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::store::PgStore;

use actix_web::{web as actix_data, App, HttpServer};
use flacon::{HttpCarrierClient, MockGateway, OrderService, ShippingEstimator};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting Flacon storefront server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  // Initialize Database Pool
  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
    tracing::error!(error = %e, "Failed to run database migrations.");
    panic!("Migration error: {}", e);
  }

  // Seed database if configured
  if app_config.seed_db {
    if let Err(e) = store::seed_demo_data(&db_pool).await {
      tracing::error!(error = %e, "Failed to seed database.");
    }
  }

  // Wire the order engine: Postgres store, HTTP carrier behind the
  // estimator, and the mock payment gateway.
  let pg_store = Arc::new(PgStore::new(db_pool.clone()));
  let carrier = match HttpCarrierClient::new(app_config.carrier_config()) {
    Ok(client) => Arc::new(client),
    Err(e) => {
      tracing::error!(error = %e, "Failed to build the carrier client.");
      panic!("Carrier client error: {}", e);
    }
  };
  let estimator = Arc::new(ShippingEstimator::new(carrier, app_config.shipping_config()));
  let gateway = Arc::new(MockGateway::new(app_config.gateway_config()));
  let orders = Arc::new(OrderService::new(
    pg_store,
    estimator,
    gateway,
    app_config.payment_retry_policy(),
  ));

  // Create AppState
  let app_state = AppState {
    db_pool: db_pool.clone(),
    orders,
    config: app_config.clone(),
  };

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(web::routes::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
