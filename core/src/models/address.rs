// core/src/models/address.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-owned shipping address. Ownership is checked before anything
/// else in the checkout precondition chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
  pub id: Uuid,
  pub user_id: Uuid,
  pub recipient: String,
  pub street: String,
  pub city: String,
  pub postal_code: String,
  pub country: String,
}
