// core/src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Pending,
  Approved,
  Rejected,
  Cancelled,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Approved => "approved",
      PaymentStatus::Rejected => "rejected",
      PaymentStatus::Cancelled => "cancelled",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "pending" => Some(PaymentStatus::Pending),
      "approved" => Some(PaymentStatus::Approved),
      "rejected" => Some(PaymentStatus::Rejected),
      "cancelled" => Some(PaymentStatus::Cancelled),
      _ => None,
    }
  }
}

/// One per order, created only after the order transaction commits and the
/// gateway returns a preference. Until then the order is payment-less.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
  pub id: Uuid,
  pub order_id: Uuid,
  /// The gateway's preference/reference id.
  pub preference_id: String,
  pub method: String,
  pub status: PaymentStatus,
  pub amount_cents: i64,
  /// Raw gateway response, kept verbatim for reconciliation.
  pub raw_response: serde_json::Value,
  pub created_at: DateTime<Utc>,
}

/// Insert payload for a payment record.
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
  pub order_id: Uuid,
  pub preference_id: String,
  pub method: String,
  pub status: PaymentStatus,
  pub amount_cents: i64,
  pub raw_response: serde_json::Value,
}
