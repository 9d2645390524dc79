// core/src/store/mod.rs

//! Storage seam for the order workflow.
//!
//! Reads are plain lookups. The two mutations (`commit_order`,
//! `cancel_order`) are atomic: each backend wraps them in its own
//! serialization boundary (a database transaction with row locks, or the
//! in-memory store's write guard) and re-verifies the business
//! preconditions inside it, so a race lost between precheck and commit
//! surfaces as the same business error the precheck would have produced.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CheckoutError, StoreError};
use crate::models::{
  Address, Coupon, NewPaymentRecord, Order, OrderItem, PaymentRecord, PaymentStatus, ProductVariant, StockRecord,
};

pub use memory::InMemoryStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Everything the atomic order commit writes, computed up front by the
/// assembler: the order row, its item rows (which also define the
/// reservation increments), and the coupon whose usage count to bump.
#[derive(Debug, Clone)]
pub struct OrderDraft {
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub coupon_id: Option<Uuid>,
}

#[async_trait]
pub trait CheckoutStore: Send + Sync {
  /// The address, only if it belongs to `user_id`.
  async fn address_for_user(&self, address_id: Uuid, user_id: Uuid) -> StoreResult<Option<Address>>;

  /// Active variants with their stock rows for the given id set. Callers
  /// must treat a smaller result set as "some items do not exist".
  async fn active_variants_with_stock(&self, variant_ids: &[Uuid]) -> StoreResult<Vec<(ProductVariant, StockRecord)>>;

  async fn coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;

  /// All-or-nothing checkout commit: insert the order and its items,
  /// increment each stock row's reserved quantity, increment the coupon's
  /// used count when one applies, and clear the user's cart. Availability
  /// and coupon headroom are re-checked under the backend's locks.
  async fn commit_order(&self, draft: OrderDraft) -> Result<Order, CheckoutError>;

  /// All-or-nothing cancellation: flip the status to cancelled (recording
  /// reason and timestamp), release every item's reservation, and cancel
  /// an existing payment record. Rejects when the order is missing, not
  /// owned by `user_id`, or not in a cancellable status.
  async fn cancel_order(
    &self,
    order_id: Uuid,
    user_id: Uuid,
    reason: &str,
    at: DateTime<Utc>,
  ) -> Result<Order, CheckoutError>;

  async fn order_for_user(&self, order_id: Uuid, user_id: Uuid) -> StoreResult<Option<Order>>;

  async fn items_for_order(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>>;

  async fn payment_for_order(&self, order_id: Uuid) -> StoreResult<Option<PaymentRecord>>;

  async fn insert_payment(&self, payment: NewPaymentRecord) -> StoreResult<PaymentRecord>;

  async fn set_payment_status(
    &self,
    order_id: Uuid,
    status: PaymentStatus,
    raw_response: serde_json::Value,
  ) -> StoreResult<()>;
}
