// core/src/config.rs

//! Explicit configuration objects, one per component.
//!
//! Components receive these at construction time; nothing in the engine
//! reads the environment. The server crate assembles them from env once,
//! at startup.

use std::time::Duration;

/// A synthetic service tier used when the carrier lookup fails:
/// base price plus a linear function of weight and declared value.
#[derive(Debug, Clone)]
pub struct FlatRateTier {
  pub service: String,
  pub base_cents: i64,
  pub per_kg_cents: i64,
  /// Thousandths of the aggregate declared value added to the price.
  pub value_permille: i64,
  pub lead_time_days: u32,
}

/// Shipping Estimator knobs.
#[derive(Debug, Clone)]
pub struct ShippingConfig {
  /// Warehouse postal code, the fixed origin of every quote.
  pub origin_postal_code: String,
  /// Orders whose declared value meets this get a zero-cost option
  /// prepended. `None` disables the promotion.
  pub free_shipping_threshold_cents: Option<i64>,
  pub free_shipping_lead_time_days: u32,
  /// Synthetic tiers quoted when the carrier call fails. May be empty, in
  /// which case total failure falls through to the hard-coded last resort.
  pub fallback_tiers: Vec<FlatRateTier>,
}

impl Default for ShippingConfig {
  fn default() -> Self {
    Self {
      origin_postal_code: "10115".to_string(),
      free_shipping_threshold_cents: None,
      free_shipping_lead_time_days: 7,
      fallback_tiers: vec![
        FlatRateTier {
          service: "economy".to_string(),
          base_cents: 990,
          per_kg_cents: 250,
          value_permille: 5,
          lead_time_days: 8,
        },
        FlatRateTier {
          service: "express".to_string(),
          base_cents: 2490,
          per_kg_cents: 600,
          value_permille: 10,
          lead_time_days: 2,
        },
      ],
    }
  }
}

/// Carrier HTTP client knobs.
#[derive(Debug, Clone)]
pub struct CarrierConfig {
  pub base_url: String,
  pub api_token: Option<String>,
  /// Fail fast: the estimator falls back rather than waiting.
  pub request_timeout: Duration,
}

impl Default for CarrierConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:9090".to_string(),
      api_token: None,
      request_timeout: Duration::from_secs(10),
    }
  }
}

/// Mock payment gateway knobs.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  /// Base URL the buyer is redirected to for completing payment.
  pub checkout_base_url: String,
  /// Simulated processing latency.
  pub latency: Duration,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self {
      checkout_base_url: "https://pay.example.com".to_string(),
      latency: Duration::from_millis(50),
    }
  }
}

/// Bounded synchronous retry for the post-commit preference call. The
/// order is already committed at that point, so the policy trades a short
/// response delay against leaving the order payment-less.
#[derive(Debug, Clone)]
pub struct PaymentRetryPolicy {
  /// Additional attempts after the first failure.
  pub retries: u32,
  pub backoff: Duration,
}

impl Default for PaymentRetryPolicy {
  fn default() -> Self {
    Self {
      retries: 2,
      backoff: Duration::from_millis(250),
    }
  }
}
