// core/src/models/stock.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CheckoutError;

/// Inventory counters for one variant.
///
/// Invariant: `reserved <= on_hand`. Units promised to unconfirmed orders
/// live in `reserved`; available-to-sell is the difference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
  pub variant_id: Uuid,
  pub on_hand: i64,
  pub reserved: i64,
}

impl StockRecord {
  pub fn available(&self) -> i64 {
    self.on_hand - self.reserved
  }
}

/// Per-line shortfall reported by an insufficient-stock rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockShortage {
  pub variant_id: Uuid,
  pub requested: i64,
  pub available: i64,
}

/// Checks every requested line against available-to-sell and reports all
/// offending lines, not just the first.
///
/// Both store backends call this a second time inside their atomic commit,
/// after acquiring their respective locks, so a lost read-check-then-write
/// race surfaces as the same error as the precheck.
pub fn check_availability(lines: &[(StockRecord, i64)]) -> Result<(), CheckoutError> {
  let shortages: Vec<StockShortage> = lines
    .iter()
    .filter(|(stock, requested)| stock.available() < *requested)
    .map(|(stock, requested)| StockShortage {
      variant_id: stock.variant_id,
      requested: *requested,
      available: stock.available(),
    })
    .collect();

  if shortages.is_empty() {
    Ok(())
  } else {
    Err(CheckoutError::InsufficientStock { shortages })
  }
}
