// core/src/models/cart_entry.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a user's cart. The atomic order commit deletes all of the
/// user's entries; cart CRUD itself lives outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartEntry {
  pub id: Uuid,
  pub user_id: Uuid,
  pub variant_id: Uuid,
  pub quantity: i64,
  pub added_at: DateTime<Utc>,
}
