// server/src/state.rs
use std::sync::Arc;

use sqlx::PgPool;

use flacon::OrderService;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub orders: Arc<OrderService>,
  pub config: Arc<AppConfig>, // Share loaded config
}
