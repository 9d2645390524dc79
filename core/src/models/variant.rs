// core/src/models/variant.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable SKU: one bottle size / concentration of a fragrance.
///
/// Read-only from the order workflow's perspective; the catalog owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  /// Shipping weight of the packaged bottle, in kilograms.
  pub weight_kg: f64,
  pub width_cm: f64,
  pub height_cm: f64,
  pub length_cm: f64,
  pub active: bool,
}
