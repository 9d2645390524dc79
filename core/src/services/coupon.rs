// core/src/services/coupon.rs

//! Coupon Evaluator: pure functions over a coupon record. The caller owns
//! the used-count increment.

use chrono::{DateTime, Utc};

use crate::error::CouponRejection;
use crate::models::{Coupon, CouponKind};

/// Validates the coupon against the clock, the order subtotal and the
/// usage cap, reporting the specific violated condition.
pub fn check_applicable(coupon: &Coupon, at: DateTime<Utc>, subtotal_cents: i64) -> Result<(), CouponRejection> {
  if !coupon.in_window(at) {
    return Err(CouponRejection::OutsideWindow);
  }
  if let Some(minimum_cents) = coupon.min_order_cents {
    if subtotal_cents < minimum_cents {
      return Err(CouponRejection::BelowMinimum {
        minimum_cents,
        subtotal_cents,
      });
    }
  }
  if !coupon.has_uses_left() {
    return Err(CouponRejection::Exhausted);
  }
  Ok(())
}

/// Computes the discount in cents. Percentage and fixed amounts are taken
/// against the subtotal only; free shipping equals the already-computed
/// shipping cost, so it is naturally zero when shipping is already free.
///
/// A fixed amount is returned uncapped; the assembler floors the order
/// total at zero instead.
pub fn evaluate(coupon: &Coupon, subtotal_cents: i64, shipping_cents: i64) -> i64 {
  match coupon.kind {
    CouponKind::Percentage => subtotal_cents * coupon.value / 100,
    CouponKind::FixedAmount => coupon.value,
    CouponKind::FreeShipping => shipping_cents,
  }
}
