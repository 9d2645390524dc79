// core/src/models/coupon.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a coupon's `value` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
  /// `value` is a percentage of the subtotal (0..=100).
  Percentage,
  /// `value` is an amount in cents taken off the subtotal.
  FixedAmount,
  /// `value` is ignored; the discount equals the computed shipping cost.
  FreeShipping,
}

impl CouponKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      CouponKind::Percentage => "percentage",
      CouponKind::FixedAmount => "fixed_amount",
      CouponKind::FreeShipping => "free_shipping",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "percentage" => Some(CouponKind::Percentage),
      "fixed_amount" => Some(CouponKind::FixedAmount),
      "free_shipping" => Some(CouponKind::FreeShipping),
      _ => None,
    }
  }
}

/// A discount code with a validity window and an optional usage cap.
///
/// Invariant: `used_count <= usage_limit` when a limit is set. The store's
/// atomic commit owns the `used_count` increment; evaluation never mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
  pub id: Uuid,
  pub code: String,
  pub kind: CouponKind,
  pub value: i64,
  pub valid_from: Option<DateTime<Utc>>,
  pub valid_until: Option<DateTime<Utc>>,
  pub min_order_cents: Option<i64>,
  pub usage_limit: Option<i64>,
  pub used_count: i64,
}

impl Coupon {
  /// True while `at` falls inside the validity window. An open bound never
  /// rejects.
  pub fn in_window(&self, at: DateTime<Utc>) -> bool {
    if let Some(from) = self.valid_from {
      if at < from {
        return false;
      }
    }
    if let Some(until) = self.valid_until {
      if at > until {
        return false;
      }
    }
    true
  }

  /// True while the usage cap (if any) has headroom.
  pub fn has_uses_left(&self) -> bool {
    match self.usage_limit {
      Some(limit) => self.used_count < limit,
      None => true,
    }
  }
}
