// core/src/services/catalog.rs

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::CheckoutError;
use crate::models::{ProductVariant, StockRecord};
use crate::store::CheckoutStore;

/// A requested order line resolved against the catalog.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
  pub variant: ProductVariant,
  pub stock: StockRecord,
  pub quantity: i64,
}

/// Looks up variants and their stock rows by id. Leaf dependency: no state
/// beyond what the store returns.
pub struct CatalogReader {
  store: Arc<dyn CheckoutStore>,
}

impl CatalogReader {
  pub fn new(store: Arc<dyn CheckoutStore>) -> Self {
    Self { store }
  }

  /// Resolves every requested (variant id, quantity) pair to an active
  /// variant + stock row, preserving request order. If any id is missing
  /// or inactive the whole attempt aborts with every offending id; no
  /// partial orders.
  pub async fn resolve(&self, requested: &[(Uuid, i64)]) -> Result<Vec<ResolvedLine>, CheckoutError> {
    let ids: Vec<Uuid> = requested.iter().map(|(id, _)| *id).collect();
    let rows = self.store.active_variants_with_stock(&ids).await?;

    let mut by_id: HashMap<Uuid, (ProductVariant, StockRecord)> =
      rows.into_iter().map(|(variant, stock)| (variant.id, (variant, stock))).collect();

    let missing: Vec<Uuid> = ids.iter().filter(|id| !by_id.contains_key(id)).copied().collect();
    if !missing.is_empty() {
      debug!(missing = ?missing, "catalog lookup came back short");
      return Err(CheckoutError::ItemsNotFound { missing });
    }

    Ok(
      requested
        .iter()
        .filter_map(|(id, quantity)| {
          by_id.remove(id).map(|(variant, stock)| ResolvedLine {
            variant,
            stock,
            quantity: *quantity,
          })
        })
        .collect(),
    )
  }
}
