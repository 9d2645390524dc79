// tests/coupon_tests.rs

mod common;

use chrono::{Duration as ChronoDuration, Utc};

use flacon::error::CouponRejection;
use flacon::{check_applicable, evaluate, CouponKind};

use common::open_coupon;

#[test]
fn percentage_discount_is_exact() {
  let coupon = open_coupon("TEN", CouponKind::Percentage, 10);
  // 10% of 250.00 is 25.00, regardless of shipping.
  assert_eq!(evaluate(&coupon, 25_000, 2_000), 2_500);
  assert_eq!(evaluate(&coupon, 25_000, 0), 2_500);
}

#[test]
fn fixed_discount_is_the_value_regardless_of_subtotal() {
  let coupon = open_coupon("FIVER", CouponKind::FixedAmount, 500);
  assert_eq!(evaluate(&coupon, 25_000, 2_000), 500);
  assert_eq!(evaluate(&coupon, 300, 0), 500);
  // Uncapped even above subtotal + shipping; the assembler floors the total.
  assert_eq!(evaluate(&coupon, 100, 100), 500);
}

#[test]
fn free_shipping_discount_equals_shipping_cost() {
  let coupon = open_coupon("SHIPFREE", CouponKind::FreeShipping, 0);
  assert_eq!(evaluate(&coupon, 25_000, 2_000), 2_000);
  // Already-free shipping discounts nothing.
  assert_eq!(evaluate(&coupon, 25_000, 0), 0);
}

#[test]
fn window_bounds_are_inclusive_of_the_interior_only() {
  let now = Utc::now();
  let mut coupon = open_coupon("WINDOW", CouponKind::Percentage, 10);
  coupon.valid_from = Some(now + ChronoDuration::minutes(5));
  assert_eq!(check_applicable(&coupon, now, 10_000), Err(CouponRejection::OutsideWindow));

  coupon.valid_from = Some(now - ChronoDuration::minutes(10));
  coupon.valid_until = Some(now - ChronoDuration::minutes(5));
  assert_eq!(check_applicable(&coupon, now, 10_000), Err(CouponRejection::OutsideWindow));

  coupon.valid_until = Some(now + ChronoDuration::minutes(5));
  assert_eq!(check_applicable(&coupon, now, 10_000), Ok(()));
}

#[test]
fn open_ended_window_never_rejects() {
  let mut coupon = open_coupon("FOREVER", CouponKind::Percentage, 10);
  coupon.valid_from = None;
  coupon.valid_until = None;
  assert_eq!(check_applicable(&coupon, Utc::now(), 1), Ok(()));
}

#[test]
fn minimum_order_value_is_enforced() {
  let mut coupon = open_coupon("BIGCART", CouponKind::Percentage, 10);
  coupon.min_order_cents = Some(20_000);

  assert_eq!(
    check_applicable(&coupon, Utc::now(), 19_999),
    Err(CouponRejection::BelowMinimum {
      minimum_cents: 20_000,
      subtotal_cents: 19_999,
    })
  );
  assert_eq!(check_applicable(&coupon, Utc::now(), 20_000), Ok(()));
}

#[test]
fn usage_cap_rejects_once_exhausted() {
  let mut coupon = open_coupon("LIMITED", CouponKind::Percentage, 10);
  coupon.usage_limit = Some(3);
  coupon.used_count = 2;
  assert_eq!(check_applicable(&coupon, Utc::now(), 10_000), Ok(()));

  coupon.used_count = 3;
  assert_eq!(check_applicable(&coupon, Utc::now(), 10_000), Err(CouponRejection::Exhausted));
}
