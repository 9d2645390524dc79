// server/src/store.rs

//! Postgres-backed `CheckoutStore`.
//!
//! Rows are mapped through local row structs and converted into the
//! engine's models, keeping the engine free of sqlx. The two atomic
//! operations run inside a transaction and take row locks with
//! `SELECT ... FOR UPDATE` (stock rows in variant-id order, so two
//! overlapping commits always lock in the same sequence) before re-running
//! the availability / cancellability checks. A lost race therefore
//! surfaces as the same business error the precheck would have produced.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use flacon::error::{CheckoutError, CouponRejection, StoreError};
use flacon::models::stock::check_availability;
use flacon::models::{
  Address, CancellationNote, Coupon, CouponKind, NewPaymentRecord, Order, OrderItem, OrderMetadata, OrderStatus,
  PaymentRecord, PaymentStatus, ProductVariant, StockRecord,
};
use flacon::store::{CheckoutStore, OrderDraft, StoreResult};

pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

// --- Row structs ---

#[derive(sqlx::FromRow)]
struct VariantStockRow {
  id: Uuid,
  name: String,
  price_cents: i64,
  weight_kg: f64,
  width_cm: f64,
  height_cm: f64,
  length_cm: f64,
  active: bool,
  on_hand: i64,
  reserved: i64,
}

impl VariantStockRow {
  fn into_pair(self) -> (ProductVariant, StockRecord) {
    (
      ProductVariant {
        id: self.id,
        name: self.name,
        price_cents: self.price_cents,
        weight_kg: self.weight_kg,
        width_cm: self.width_cm,
        height_cm: self.height_cm,
        length_cm: self.length_cm,
        active: self.active,
      },
      StockRecord {
        variant_id: self.id,
        on_hand: self.on_hand,
        reserved: self.reserved,
      },
    )
  }
}

#[derive(sqlx::FromRow)]
struct StockRow {
  variant_id: Uuid,
  on_hand: i64,
  reserved: i64,
}

impl From<StockRow> for StockRecord {
  fn from(row: StockRow) -> Self {
    StockRecord {
      variant_id: row.variant_id,
      on_hand: row.on_hand,
      reserved: row.reserved,
    }
  }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
  id: Uuid,
  user_id: Uuid,
  recipient: String,
  street: String,
  city: String,
  postal_code: String,
  country: String,
}

impl From<AddressRow> for Address {
  fn from(row: AddressRow) -> Self {
    Address {
      id: row.id,
      user_id: row.user_id,
      recipient: row.recipient,
      street: row.street,
      city: row.city,
      postal_code: row.postal_code,
      country: row.country,
    }
  }
}

#[derive(sqlx::FromRow)]
struct CouponRow {
  id: Uuid,
  code: String,
  kind: String,
  value: i64,
  valid_from: Option<DateTime<Utc>>,
  valid_until: Option<DateTime<Utc>>,
  min_order_cents: Option<i64>,
  usage_limit: Option<i64>,
  used_count: i64,
}

impl CouponRow {
  fn into_coupon(self) -> Result<Coupon, StoreError> {
    let kind = CouponKind::parse(&self.kind)
      .ok_or_else(|| StoreError::Corrupt(format!("coupon {} has unknown kind '{}'", self.id, self.kind)))?;
    Ok(Coupon {
      id: self.id,
      code: self.code,
      kind,
      value: self.value,
      valid_from: self.valid_from,
      valid_until: self.valid_until,
      min_order_cents: self.min_order_cents,
      usage_limit: self.usage_limit,
      used_count: self.used_count,
    })
  }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
  id: Uuid,
  order_number: String,
  user_id: Uuid,
  address_id: Uuid,
  status: String,
  subtotal_cents: i64,
  shipping_cents: i64,
  discount_cents: i64,
  total_cents: i64,
  metadata: serde_json::Value,
  created_at: DateTime<Utc>,
}

impl OrderRow {
  fn into_order(self) -> Result<Order, StoreError> {
    let status = OrderStatus::parse(&self.status)
      .ok_or_else(|| StoreError::Corrupt(format!("order {} has unknown status '{}'", self.id, self.status)))?;
    let metadata: OrderMetadata = serde_json::from_value(self.metadata)
      .map_err(|e| StoreError::Corrupt(format!("order {} has unreadable metadata: {}", self.id, e)))?;
    Ok(Order {
      id: self.id,
      order_number: self.order_number,
      user_id: self.user_id,
      address_id: self.address_id,
      status,
      subtotal_cents: self.subtotal_cents,
      shipping_cents: self.shipping_cents,
      discount_cents: self.discount_cents,
      total_cents: self.total_cents,
      metadata,
      created_at: self.created_at,
    })
  }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
  id: Uuid,
  order_id: Uuid,
  variant_id: Uuid,
  name: String,
  quantity: i64,
  unit_price_cents: i64,
  line_total_cents: i64,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      variant_id: row.variant_id,
      name: row.name,
      quantity: row.quantity,
      unit_price_cents: row.unit_price_cents,
      line_total_cents: row.line_total_cents,
    }
  }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
  id: Uuid,
  order_id: Uuid,
  preference_id: String,
  method: String,
  status: String,
  amount_cents: i64,
  raw_response: serde_json::Value,
  created_at: DateTime<Utc>,
}

impl PaymentRow {
  fn into_payment(self) -> Result<PaymentRecord, StoreError> {
    let status = PaymentStatus::parse(&self.status)
      .ok_or_else(|| StoreError::Corrupt(format!("payment {} has unknown status '{}'", self.id, self.status)))?;
    Ok(PaymentRecord {
      id: self.id,
      order_id: self.order_id,
      preference_id: self.preference_id,
      method: self.method,
      status,
      amount_cents: self.amount_cents,
      raw_response: self.raw_response,
      created_at: self.created_at,
    })
  }
}

fn metadata_value(metadata: &OrderMetadata) -> Result<serde_json::Value, StoreError> {
  serde_json::to_value(metadata).map_err(|e| StoreError::Corrupt(format!("unserializable order metadata: {}", e)))
}

#[async_trait]
impl CheckoutStore for PgStore {
  async fn address_for_user(&self, address_id: Uuid, user_id: Uuid) -> StoreResult<Option<Address>> {
    let row: Option<AddressRow> = sqlx::query_as(
      "SELECT id, user_id, recipient, street, city, postal_code, country
         FROM addresses WHERE id = $1 AND user_id = $2",
    )
    .bind(address_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    Ok(row.map(Into::into))
  }

  async fn active_variants_with_stock(&self, variant_ids: &[Uuid]) -> StoreResult<Vec<(ProductVariant, StockRecord)>> {
    let rows: Vec<VariantStockRow> = sqlx::query_as(
      "SELECT v.id, v.name, v.price_cents, v.weight_kg, v.width_cm, v.height_cm, v.length_cm, v.active,
              s.on_hand, s.reserved
         FROM product_variants v
         JOIN stock_records s ON s.variant_id = v.id
        WHERE v.id = ANY($1) AND v.active",
    )
    .bind(variant_ids.to_vec())
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    Ok(rows.into_iter().map(VariantStockRow::into_pair).collect())
  }

  async fn coupon_by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
    let row: Option<CouponRow> = sqlx::query_as(
      "SELECT id, code, kind, value, valid_from, valid_until, min_order_cents, usage_limit, used_count
         FROM coupons WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    row.map(CouponRow::into_coupon).transpose()
  }

  async fn commit_order(&self, draft: OrderDraft) -> Result<Order, CheckoutError> {
    let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

    // Lock the stock rows in a deterministic order, then re-check
    // availability under the locks.
    let mut locked_ids: Vec<Uuid> = draft.items.iter().map(|item| item.variant_id).collect();
    locked_ids.sort();
    locked_ids.dedup();
    let stock_rows: Vec<StockRow> = sqlx::query_as(
      "SELECT variant_id, on_hand, reserved FROM stock_records
        WHERE variant_id = ANY($1) ORDER BY variant_id FOR UPDATE",
    )
    .bind(locked_ids)
    .fetch_all(&mut *tx)
    .await
    .map_err(StoreError::backend)?;

    let by_variant: std::collections::HashMap<Uuid, StockRecord> = stock_rows
      .into_iter()
      .map(|row| (row.variant_id, row.into()))
      .collect();
    let mut lines = Vec::with_capacity(draft.items.len());
    for item in &draft.items {
      let stock = by_variant
        .get(&item.variant_id)
        .cloned()
        .ok_or_else(|| StoreError::Corrupt(format!("variant {} has no stock record", item.variant_id)))?;
      lines.push((stock, item.quantity));
    }
    check_availability(&lines)?;

    // Re-check the coupon cap under its own row lock before counting the
    // use.
    if let Some(coupon_id) = draft.coupon_id {
      let row: CouponRow = sqlx::query_as(
        "SELECT id, code, kind, value, valid_from, valid_until, min_order_cents, usage_limit, used_count
           FROM coupons WHERE id = $1 FOR UPDATE",
      )
      .bind(coupon_id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(StoreError::backend)?
      .ok_or_else(|| StoreError::Corrupt(format!("coupon {} vanished before commit", coupon_id)))?;
      let coupon = row.into_coupon()?;
      if !coupon.has_uses_left() {
        return Err(CheckoutError::CouponInvalid {
          code: coupon.code,
          reason: CouponRejection::Exhausted,
        });
      }
      sqlx::query("UPDATE coupons SET used_count = used_count + 1 WHERE id = $1")
        .bind(coupon_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::backend)?;
    }

    let order = &draft.order;
    sqlx::query(
      "INSERT INTO orders (id, order_number, user_id, address_id, status, subtotal_cents, shipping_cents,
                           discount_cents, total_cents, metadata, created_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.user_id)
    .bind(order.address_id)
    .bind(order.status.as_str())
    .bind(order.subtotal_cents)
    .bind(order.shipping_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(metadata_value(&order.metadata)?)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await
    .map_err(StoreError::backend)?;

    for item in &draft.items {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, variant_id, name, quantity, unit_price_cents, line_total_cents)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
      )
      .bind(item.id)
      .bind(item.order_id)
      .bind(item.variant_id)
      .bind(&item.name)
      .bind(item.quantity)
      .bind(item.unit_price_cents)
      .bind(item.line_total_cents)
      .execute(&mut *tx)
      .await
      .map_err(StoreError::backend)?;

      sqlx::query("UPDATE stock_records SET reserved = reserved + $1 WHERE variant_id = $2")
        .bind(item.quantity)
        .bind(item.variant_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::backend)?;
    }

    sqlx::query("DELETE FROM cart_entries WHERE user_id = $1")
      .bind(order.user_id)
      .execute(&mut *tx)
      .await
      .map_err(StoreError::backend)?;

    tx.commit().await.map_err(StoreError::backend)?;
    Ok(draft.order)
  }

  async fn cancel_order(
    &self,
    order_id: Uuid,
    user_id: Uuid,
    reason: &str,
    at: DateTime<Utc>,
  ) -> Result<Order, CheckoutError> {
    let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

    let row: Option<OrderRow> = sqlx::query_as(
      "SELECT id, order_number, user_id, address_id, status, subtotal_cents, shipping_cents,
              discount_cents, total_cents, metadata, created_at
         FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(StoreError::backend)?;
    let Some(row) = row else {
      return Err(CheckoutError::OrderNotFound { order_id });
    };
    let mut order = row.into_order()?;
    if !order.status.cancellable() {
      return Err(CheckoutError::NotCancellable {
        order_id,
        status: order.status,
      });
    }

    let item_rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT id, order_id, variant_id, name, quantity, unit_price_cents, line_total_cents
         FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(StoreError::backend)?;
    for item in &item_rows {
      sqlx::query("UPDATE stock_records SET reserved = reserved - $1 WHERE variant_id = $2")
        .bind(item.quantity)
        .bind(item.variant_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::backend)?;
    }

    order.status = OrderStatus::Cancelled;
    order.metadata.cancellation = Some(CancellationNote {
      reason: reason.to_string(),
      cancelled_at: at,
    });
    sqlx::query("UPDATE orders SET status = $2, metadata = $3 WHERE id = $1")
      .bind(order_id)
      .bind(order.status.as_str())
      .bind(metadata_value(&order.metadata)?)
      .execute(&mut *tx)
      .await
      .map_err(StoreError::backend)?;

    sqlx::query("UPDATE payment_records SET status = $2 WHERE order_id = $1")
      .bind(order_id)
      .bind(PaymentStatus::Cancelled.as_str())
      .execute(&mut *tx)
      .await
      .map_err(StoreError::backend)?;

    tx.commit().await.map_err(StoreError::backend)?;
    Ok(order)
  }

  async fn order_for_user(&self, order_id: Uuid, user_id: Uuid) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(
      "SELECT id, order_number, user_id, address_id, status, subtotal_cents, shipping_cents,
              discount_cents, total_cents, metadata, created_at
         FROM orders WHERE id = $1 AND user_id = $2",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    row.map(OrderRow::into_order).transpose()
  }

  async fn items_for_order(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT id, order_id, variant_id, name, quantity, unit_price_cents, line_total_cents
         FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    Ok(rows.into_iter().map(Into::into).collect())
  }

  async fn payment_for_order(&self, order_id: Uuid) -> StoreResult<Option<PaymentRecord>> {
    let row: Option<PaymentRow> = sqlx::query_as(
      "SELECT id, order_id, preference_id, method, status, amount_cents, raw_response, created_at
         FROM payment_records WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    row.map(PaymentRow::into_payment).transpose()
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
    sqlx::query(
      "INSERT INTO payment_records (id, order_id, preference_id, method, status, amount_cents, raw_response, created_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(record.order_id)
    .bind(&record.preference_id)
    .bind(&record.method)
    .bind(record.status.as_str())
    .bind(record.amount_cents)
    .bind(record.raw_response.clone())
    .bind(record.created_at)
    .execute(&self.pool)
    .await
    .map_err(StoreError::backend)?;
    Ok(record)
  }

  async fn set_payment_status(
    &self,
    order_id: Uuid,
    status: PaymentStatus,
    raw_response: serde_json::Value,
  ) -> StoreResult<()> {
    let result = sqlx::query("UPDATE payment_records SET status = $2, raw_response = $3 WHERE order_id = $1")
      .bind(order_id)
      .bind(status.as_str())
      .bind(raw_response)
      .execute(&self.pool)
      .await
      .map_err(StoreError::backend)?;
    if result.rows_affected() == 0 {
      return Err(StoreError::Corrupt(format!(
        "no payment record for order {} to update",
        order_id
      )));
    }
    Ok(())
  }
}

/// Inserts a small demo catalog (idempotent) so a fresh database can serve
/// checkouts immediately. Enabled with SEED_DB=true.
pub async fn seed_demo_data(pool: &PgPool) -> StoreResult<()> {
  let variants: [(&str, &str, i64, f64); 3] = [
    ("11111111-1111-4111-8111-111111111111", "Iris Extrait 50ml", 10_000, 0.5),
    ("22222222-2222-4222-8222-222222222222", "Vetiver EdT 100ml", 5_000, 1.0),
    ("33333333-3333-4333-8333-333333333333", "Oud Parfum 30ml", 30_000, 0.3),
  ];
  for (id, name, price_cents, weight_kg) in variants {
    let variant_id = Uuid::parse_str(id).map_err(StoreError::backend)?;
    sqlx::query(
      "INSERT INTO product_variants (id, name, price_cents, weight_kg, width_cm, height_cm, length_cm, active)
       VALUES ($1, $2, $3, $4, 10.0, 12.0, 8.0, TRUE)
       ON CONFLICT (id) DO NOTHING",
    )
    .bind(variant_id)
    .bind(name)
    .bind(price_cents)
    .bind(weight_kg)
    .execute(pool)
    .await
    .map_err(StoreError::backend)?;
    sqlx::query(
      "INSERT INTO stock_records (variant_id, on_hand, reserved)
       VALUES ($1, 25, 0) ON CONFLICT (variant_id) DO NOTHING",
    )
    .bind(variant_id)
    .execute(pool)
    .await
    .map_err(StoreError::backend)?;
  }

  sqlx::query(
    "INSERT INTO coupons (id, code, kind, value, valid_from, valid_until, min_order_cents, usage_limit, used_count)
     VALUES ($1, 'WELCOME10', 'percentage', 10, NOW() - INTERVAL '1 day', NOW() + INTERVAL '90 days', NULL, 1000, 0)
     ON CONFLICT (code) DO NOTHING",
  )
  .bind(Uuid::parse_str("44444444-4444-4444-8444-444444444444").map_err(StoreError::backend)?)
  .execute(pool)
  .await
  .map_err(StoreError::backend)?;

  tracing::info!("Demo catalog seeded.");
  Ok(())
}
