// core/src/models/shipping.rs

use serde::{Deserialize, Serialize};

/// What the estimator needs to know about one shipped line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentItem {
  pub weight_kg: f64,
  pub width_cm: f64,
  pub height_cm: f64,
  pub length_cm: f64,
  /// Declared value of a single unit, in cents.
  pub value_cents: i64,
  pub quantity: i64,
}

/// One quoted way of getting the package to the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingOption {
  pub carrier: String,
  pub service: String,
  pub price_cents: i64,
  pub lead_time_days: u32,
}
