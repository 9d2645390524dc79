// core/src/models/order_item.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One order line. Name and prices are point-in-time snapshots,
/// deliberately decoupled from future variant changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub variant_id: Uuid,
  pub name: String,
  pub quantity: i64,
  pub unit_price_cents: i64,
  pub line_total_cents: i64,
}
