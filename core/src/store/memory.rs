// core/src/store/memory.rs

//! In-memory `CheckoutStore`, used by the engine's tests and by local runs
//! without a database.
//!
//! One `parking_lot::RwLock` guards the whole dataset. The write guard is
//! the serialization boundary for the reserved-quantity race: atomic
//! operations validate everything before the first mutation, so a failed
//! commit leaves the dataset untouched without an explicit rollback. Guards
//! are never held across an await.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{CheckoutError, CouponRejection, StoreError};
use crate::models::stock::check_availability;
use crate::models::{
  Address, CancellationNote, CartEntry, Coupon, NewPaymentRecord, Order, OrderItem, OrderStatus, PaymentRecord,
  PaymentStatus, ProductVariant, StockRecord,
};
use crate::store::{CheckoutStore, OrderDraft, StoreResult};

#[derive(Default)]
struct Dataset {
  variants: HashMap<Uuid, ProductVariant>,
  stock: HashMap<Uuid, StockRecord>,
  coupons: HashMap<Uuid, Coupon>,
  addresses: HashMap<Uuid, Address>,
  cart: Vec<CartEntry>,
  orders: HashMap<Uuid, Order>,
  order_items: HashMap<Uuid, Vec<OrderItem>>,
  payments: HashMap<Uuid, PaymentRecord>,
}

#[derive(Default)]
pub struct InMemoryStore {
  data: RwLock<Dataset>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  // --- Seeding helpers (tests, demo runs) ---

  pub fn insert_variant(&self, variant: ProductVariant, on_hand: i64, reserved: i64) {
    let mut data = self.data.write();
    data.stock.insert(
      variant.id,
      StockRecord {
        variant_id: variant.id,
        on_hand,
        reserved,
      },
    );
    data.variants.insert(variant.id, variant);
  }

  pub fn insert_coupon(&self, coupon: Coupon) {
    self.data.write().coupons.insert(coupon.id, coupon);
  }

  pub fn insert_address(&self, address: Address) {
    self.data.write().addresses.insert(address.id, address);
  }

  pub fn insert_cart_entry(&self, entry: CartEntry) {
    self.data.write().cart.push(entry);
  }

  // --- Inspection helpers (tests assert on these) ---

  pub fn stock_for(&self, variant_id: Uuid) -> Option<StockRecord> {
    self.data.read().stock.get(&variant_id).cloned()
  }

  pub fn coupon(&self, coupon_id: Uuid) -> Option<Coupon> {
    self.data.read().coupons.get(&coupon_id).cloned()
  }

  pub fn cart_entries_for(&self, user_id: Uuid) -> Vec<CartEntry> {
    self
      .data
      .read()
      .cart
      .iter()
      .filter(|entry| entry.user_id == user_id)
      .cloned()
      .collect()
  }

  pub fn order_count(&self) -> usize {
    self.data.read().orders.len()
  }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
  async fn address_for_user(&self, address_id: Uuid, user_id: Uuid) -> StoreResult<Option<Address>> {
    let data = self.data.read();
    Ok(
      data
        .addresses
        .get(&address_id)
        .filter(|address| address.user_id == user_id)
        .cloned(),
    )
  }

  async fn active_variants_with_stock(&self, variant_ids: &[Uuid]) -> StoreResult<Vec<(ProductVariant, StockRecord)>> {
    let data = self.data.read();
    let mut rows = Vec::with_capacity(variant_ids.len());
    for id in variant_ids {
      let Some(variant) = data.variants.get(id).filter(|v| v.active) else {
        continue;
      };
      let stock = data
        .stock
        .get(id)
        .cloned()
        .ok_or_else(|| StoreError::Corrupt(format!("variant {} has no stock record", id)))?;
      rows.push((variant.clone(), stock));
    }
    Ok(rows)
  }

  async fn coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
    let data = self.data.read();
    Ok(data.coupons.values().find(|coupon| coupon.code == code).cloned())
  }

  async fn commit_order(&self, draft: OrderDraft) -> Result<Order, CheckoutError> {
    let mut data = self.data.write();

    // Validate everything before mutating anything; the write guard makes
    // check-then-mutate atomic against concurrent commits.
    let mut lines = Vec::with_capacity(draft.items.len());
    for item in &draft.items {
      let stock = data
        .stock
        .get(&item.variant_id)
        .cloned()
        .ok_or_else(|| StoreError::Corrupt(format!("variant {} has no stock record", item.variant_id)))?;
      lines.push((stock, item.quantity));
    }
    check_availability(&lines)?;

    if let Some(coupon_id) = draft.coupon_id {
      let coupon = data
        .coupons
        .get(&coupon_id)
        .ok_or_else(|| StoreError::Corrupt(format!("coupon {} vanished before commit", coupon_id)))?;
      if !coupon.has_uses_left() {
        return Err(CheckoutError::CouponInvalid {
          code: coupon.code.clone(),
          reason: CouponRejection::Exhausted,
        });
      }
    }

    for item in &draft.items {
      if let Some(stock) = data.stock.get_mut(&item.variant_id) {
        stock.reserved += item.quantity;
      }
    }
    if let Some(coupon_id) = draft.coupon_id {
      if let Some(coupon) = data.coupons.get_mut(&coupon_id) {
        coupon.used_count += 1;
      }
    }
    let user_id = draft.order.user_id;
    data.cart.retain(|entry| entry.user_id != user_id);

    data.order_items.insert(draft.order.id, draft.items);
    data.orders.insert(draft.order.id, draft.order.clone());
    Ok(draft.order)
  }

  async fn cancel_order(
    &self,
    order_id: Uuid,
    user_id: Uuid,
    reason: &str,
    at: DateTime<Utc>,
  ) -> Result<Order, CheckoutError> {
    let mut data = self.data.write();

    let Some(order) = data.orders.get(&order_id).filter(|o| o.user_id == user_id).cloned() else {
      return Err(CheckoutError::OrderNotFound { order_id });
    };
    if !order.status.cancellable() {
      return Err(CheckoutError::NotCancellable {
        order_id,
        status: order.status,
      });
    }

    let items = data.order_items.get(&order_id).cloned().unwrap_or_default();
    for item in &items {
      if let Some(stock) = data.stock.get_mut(&item.variant_id) {
        stock.reserved -= item.quantity;
      }
    }

    let mut cancelled = order;
    cancelled.status = OrderStatus::Cancelled;
    cancelled.metadata.cancellation = Some(CancellationNote {
      reason: reason.to_string(),
      cancelled_at: at,
    });
    data.orders.insert(order_id, cancelled.clone());

    if let Some(payment) = data.payments.get_mut(&order_id) {
      payment.status = PaymentStatus::Cancelled;
    }

    Ok(cancelled)
  }

  async fn order_for_user(&self, order_id: Uuid, user_id: Uuid) -> StoreResult<Option<Order>> {
    let data = self.data.read();
    Ok(data.orders.get(&order_id).filter(|o| o.user_id == user_id).cloned())
  }

  async fn items_for_order(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    let data = self.data.read();
    Ok(data.order_items.get(&order_id).cloned().unwrap_or_default())
  }

  async fn payment_for_order(&self, order_id: Uuid) -> StoreResult<Option<PaymentRecord>> {
    let data = self.data.read();
    Ok(data.payments.get(&order_id).cloned())
  }

  async fn insert_payment(&self, payment: NewPaymentRecord) -> StoreResult<PaymentRecord> {
    let record = PaymentRecord {
      id: Uuid::new_v4(),
      order_id: payment.order_id,
      preference_id: payment.preference_id,
      method: payment.method,
      status: payment.status,
      amount_cents: payment.amount_cents,
      raw_response: payment.raw_response,
      created_at: Utc::now(),
    };
    self.data.write().payments.insert(record.order_id, record.clone());
    Ok(record)
  }

  async fn set_payment_status(
    &self,
    order_id: Uuid,
    status: PaymentStatus,
    raw_response: serde_json::Value,
  ) -> StoreResult<()> {
    let mut data = self.data.write();
    match data.payments.get_mut(&order_id) {
      Some(payment) => {
        payment.status = status;
        payment.raw_response = raw_response;
        Ok(())
      }
      None => Err(StoreError::Corrupt(format!(
        "no payment record for order {} to update",
        order_id
      ))),
    }
  }
}
