// core/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an order.
///
/// The checkout workflow only ever produces `Pending` and (via payment
/// confirmation, outside this crate) `Confirmed`; the later states are
/// driven by payment/shipment webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "pending" => Some(OrderStatus::Pending),
      "confirmed" => Some(OrderStatus::Confirmed),
      "shipped" => Some(OrderStatus::Shipped),
      "delivered" => Some(OrderStatus::Delivered),
      "cancelled" => Some(OrderStatus::Cancelled),
      "refunded" => Some(OrderStatus::Refunded),
      _ => None,
    }
  }

  /// Cancellation is only reachable before fulfilment starts.
  pub fn cancellable(&self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
  }
}

/// The shipping option the workflow auto-selected at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingSelection {
  pub carrier: String,
  pub service: String,
  pub price_cents: i64,
  pub lead_time_days: u32,
}

/// Recorded when an order is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationNote {
  pub reason: String,
  pub cancelled_at: DateTime<Utc>,
}

/// Free-form order metadata: payment method, applied coupon, chosen
/// shipping option, cancellation detail. Persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderMetadata {
  pub payment_method: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub coupon_code: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub shipping: Option<ShippingSelection>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cancellation: Option<CancellationNote>,
}

/// The aggregate root created once per checkout.
///
/// Status transitions are the only post-creation mutation this workflow
/// performs; item rows and monetary snapshots are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub status: OrderStatus,
  pub subtotal_cents: i64,
  pub shipping_cents: i64,
  pub discount_cents: i64,
  pub total_cents: i64,
  pub metadata: OrderMetadata,
  pub created_at: DateTime<Utc>,
}
