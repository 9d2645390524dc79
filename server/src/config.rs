// server/src/config.rs

use std::env;
use std::time::Duration;

use flacon::{CarrierConfig, GatewayConfig, PaymentRetryPolicy, ShippingConfig};

use crate::errors::{AppError, Result};

/// Everything the server reads from the environment, loaded once at
/// startup. The engine components receive their own config structs built
/// from this; nothing downstream touches the environment again.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  // Shipping Estimator knobs.
  pub origin_postal_code: String,
  pub free_shipping_threshold_cents: Option<i64>,
  pub carrier_base_url: String,
  pub carrier_api_token: Option<String>,
  pub carrier_timeout_secs: u64,

  // Mock payment gateway knobs.
  pub gateway_checkout_base_url: String,

  // Optional: seed demo catalog data on startup.
  pub seed_db: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;

    let origin_postal_code = get_env("ORIGIN_POSTAL_CODE").unwrap_or_else(|_| "10115".to_string());
    let free_shipping_threshold_cents = match env::var("FREE_SHIPPING_THRESHOLD_CENTS") {
      Ok(raw) => Some(
        raw
          .parse::<i64>()
          .map_err(|e| AppError::Config(format!("Invalid FREE_SHIPPING_THRESHOLD_CENTS: {}", e)))?,
      ),
      Err(_) => None,
    };
    let carrier_base_url = get_env("CARRIER_BASE_URL").unwrap_or_else(|_| "http://localhost:9090".to_string());
    let carrier_api_token = env::var("CARRIER_API_TOKEN").ok();
    let carrier_timeout_secs = get_env("CARRIER_TIMEOUT_SECS")
      .unwrap_or_else(|_| "10".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid CARRIER_TIMEOUT_SECS: {}", e)))?;

    let gateway_checkout_base_url =
      get_env("GATEWAY_CHECKOUT_BASE_URL").unwrap_or_else(|_| "https://pay.example.com".to_string());

    let seed_db = get_env("SEED_DB")
      .unwrap_or_else(|_| "false".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_DB value: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      origin_postal_code,
      free_shipping_threshold_cents,
      carrier_base_url,
      carrier_api_token,
      carrier_timeout_secs,
      gateway_checkout_base_url,
      seed_db,
    })
  }

  pub fn shipping_config(&self) -> ShippingConfig {
    ShippingConfig {
      origin_postal_code: self.origin_postal_code.clone(),
      free_shipping_threshold_cents: self.free_shipping_threshold_cents,
      ..ShippingConfig::default()
    }
  }

  pub fn carrier_config(&self) -> CarrierConfig {
    CarrierConfig {
      base_url: self.carrier_base_url.clone(),
      api_token: self.carrier_api_token.clone(),
      request_timeout: Duration::from_secs(self.carrier_timeout_secs),
    }
  }

  pub fn gateway_config(&self) -> GatewayConfig {
    GatewayConfig {
      checkout_base_url: self.gateway_checkout_base_url.clone(),
      ..GatewayConfig::default()
    }
  }

  pub fn payment_retry_policy(&self) -> PaymentRetryPolicy {
    PaymentRetryPolicy::default()
  }
}
