// tests/order_creation_tests.rs

mod common;

use std::sync::Arc;

use uuid::Uuid;

use flacon::error::{CheckoutError, CouponRejection};
use flacon::{CouponKind, OrderStatus, PaymentStatus, ShippingConfig};

use common::{address_for, cart_entry, checkout_request, default_env, env_with, open_coupon, quote, variant};

#[tokio::test]
async fn checkout_scenario_totals_stock_and_cart() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());

  // Variant A: 0.5kg at 100.00, qty 2; variant B: 1.0kg at 50.00, qty 1.
  let a = variant("Iris Extrait 50ml", 10_000, 0.5);
  let b = variant("Vetiver EdT 100ml", 5_000, 1.0);
  env.store.insert_variant(a.clone(), 10, 0);
  env.store.insert_variant(b.clone(), 10, 3);
  env.store.insert_cart_entry(cart_entry(user_id, a.id, 2));
  let welcome = open_coupon("WELCOME10", CouponKind::Percentage, 10);
  let welcome_id = welcome.id;
  env.store.insert_coupon(welcome);

  let mut request = checkout_request(user_id, address.id, &[(a.id, 2), (b.id, 1)]);
  request.coupon_code = Some("WELCOME10".to_string());
  let receipt = env.orders.create_order(request).await.expect("checkout should succeed");

  // 250.00 + 20.00 shipping - 25.00 discount = 245.00.
  assert_eq!(receipt.order.subtotal_cents, 25_000);
  assert_eq!(receipt.order.shipping_cents, 2_000);
  assert_eq!(receipt.order.discount_cents, 2_500);
  assert_eq!(receipt.order.total_cents, 24_500);
  assert_eq!(receipt.order.status, OrderStatus::Pending);
  assert!(receipt.order.order_number.starts_with("ORD-"));
  assert_eq!(receipt.order.metadata.coupon_code.as_deref(), Some("WELCOME10"));

  // Line snapshots.
  assert_eq!(receipt.items.len(), 2);
  assert_eq!(receipt.items[0].unit_price_cents, 10_000);
  assert_eq!(receipt.items[0].line_total_cents, 20_000);

  // Reservations incremented, invariant intact.
  let stock_a = env.store.stock_for(a.id).unwrap();
  let stock_b = env.store.stock_for(b.id).unwrap();
  assert_eq!(stock_a.reserved, 2);
  assert_eq!(stock_b.reserved, 4);
  assert!(stock_a.reserved <= stock_a.on_hand);
  assert!(stock_b.reserved <= stock_b.on_hand);

  // Cart cleared, coupon consumed, payment created.
  assert!(env.store.cart_entries_for(user_id).is_empty());
  assert_eq!(env.store.coupon(welcome_id).unwrap().used_count, 1);
  let payment = receipt.payment.expect("payment preference should exist");
  assert_eq!(payment.status, PaymentStatus::Pending);
  assert_eq!(payment.amount_cents, 24_500);
  assert!(receipt.redirect_url.unwrap().contains(&payment.preference_id));
}

#[tokio::test]
async fn free_shipping_threshold_zeroes_the_shipping_cost() {
  let env = env_with(
    ShippingConfig {
      free_shipping_threshold_cents: Some(20_000),
      ..ShippingConfig::default()
    },
    vec![quote("correios", "standard", 2_000, 5)],
  );
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());
  let a = variant("Iris Extrait 50ml", 10_000, 0.5);
  let b = variant("Vetiver EdT 100ml", 5_000, 1.0);
  env.store.insert_variant(a.clone(), 10, 0);
  env.store.insert_variant(b.clone(), 10, 0);

  let receipt = env
    .orders
    .create_order(checkout_request(user_id, address.id, &[(a.id, 2), (b.id, 1)]))
    .await
    .expect("checkout should succeed");

  assert_eq!(receipt.order.subtotal_cents, 25_000);
  assert_eq!(receipt.order.shipping_cents, 0);
  assert_eq!(receipt.order.total_cents, 25_000);
  let shipping = receipt.order.metadata.shipping.expect("selection recorded");
  assert_eq!(shipping.service, "free_shipping");
}

#[tokio::test]
async fn insufficient_stock_reports_shortfall_and_rolls_back_nothing() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());

  // Variant C: on_hand 5, reserved 4 => available 1.
  let c = variant("Oud Parfum 30ml", 30_000, 0.3);
  let fine = variant("Neroli EdP 50ml", 8_000, 0.4);
  env.store.insert_variant(c.clone(), 5, 4);
  env.store.insert_variant(fine.clone(), 10, 0);
  env.store.insert_cart_entry(cart_entry(user_id, c.id, 2));

  let err = env
    .orders
    .create_order(checkout_request(user_id, address.id, &[(c.id, 2), (fine.id, 1)]))
    .await
    .expect_err("checkout must reject");

  match err {
    CheckoutError::InsufficientStock { shortages } => {
      assert_eq!(shortages.len(), 1);
      assert_eq!(shortages[0].variant_id, c.id);
      assert_eq!(shortages[0].requested, 2);
      assert_eq!(shortages[0].available, 1);
    }
    other => panic!("expected InsufficientStock, got {:?}", other),
  }

  // Byte-for-byte unchanged: no order, no reservations, cart intact.
  assert_eq!(env.store.order_count(), 0);
  assert_eq!(env.store.stock_for(c.id).unwrap().reserved, 4);
  assert_eq!(env.store.stock_for(fine.id).unwrap().reserved, 0);
  assert_eq!(env.store.cart_entries_for(user_id).len(), 1);
}

#[tokio::test]
async fn missing_and_inactive_items_abort_the_attempt() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());

  let mut discontinued = variant("Discontinued Chypre", 12_000, 0.5);
  discontinued.active = false;
  env.store.insert_variant(discontinued.clone(), 10, 0);
  let in_catalog = variant("Neroli EdP 50ml", 8_000, 0.4);
  env.store.insert_variant(in_catalog.clone(), 10, 0);
  let ghost = Uuid::new_v4();

  let err = env
    .orders
    .create_order(checkout_request(
      user_id,
      address.id,
      &[(in_catalog.id, 1), (discontinued.id, 1), (ghost, 1)],
    ))
    .await
    .expect_err("checkout must reject");

  match err {
    CheckoutError::ItemsNotFound { missing } => {
      assert_eq!(missing.len(), 2);
      assert!(missing.contains(&discontinued.id));
      assert!(missing.contains(&ghost));
    }
    other => panic!("expected ItemsNotFound, got {:?}", other),
  }
  assert_eq!(env.store.order_count(), 0);
}

#[tokio::test]
async fn foreign_address_is_not_found() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let someone_else = Uuid::new_v4();
  let address = address_for(someone_else, "20095");
  env.store.insert_address(address.clone());
  let a = variant("Iris Extrait 50ml", 10_000, 0.5);
  env.store.insert_variant(a.clone(), 10, 0);

  let err = env
    .orders
    .create_order(checkout_request(user_id, address.id, &[(a.id, 1)]))
    .await
    .expect_err("checkout must reject");
  assert!(matches!(err, CheckoutError::AddressNotFound { .. }));
}

#[tokio::test]
async fn coupon_rejections_carry_their_reason() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());
  let a = variant("Iris Extrait 50ml", 10_000, 0.5);
  env.store.insert_variant(a.clone(), 100, 0);

  // Unknown code.
  let mut request = checkout_request(user_id, address.id, &[(a.id, 1)]);
  request.coupon_code = Some("NOPE".to_string());
  let err = env.orders.create_order(request).await.expect_err("must reject");
  match err {
    CheckoutError::CouponInvalid { code, reason } => {
      assert_eq!(code, "NOPE");
      assert_eq!(reason, CouponRejection::NotFound);
    }
    other => panic!("expected CouponInvalid, got {:?}", other),
  }

  // Below minimum.
  let mut below_min = open_coupon("BIG", CouponKind::Percentage, 10);
  below_min.min_order_cents = Some(50_000);
  env.store.insert_coupon(below_min);
  let mut request = checkout_request(user_id, address.id, &[(a.id, 1)]);
  request.coupon_code = Some("BIG".to_string());
  match env.orders.create_order(request).await.expect_err("must reject") {
    CheckoutError::CouponInvalid { reason, .. } => assert_eq!(
      reason,
      CouponRejection::BelowMinimum {
        minimum_cents: 50_000,
        subtotal_cents: 10_000,
      }
    ),
    other => panic!("expected CouponInvalid, got {:?}", other),
  }

  // Exhausted.
  let mut spent = open_coupon("SPENT", CouponKind::Percentage, 10);
  spent.usage_limit = Some(1);
  spent.used_count = 1;
  env.store.insert_coupon(spent);
  let mut request = checkout_request(user_id, address.id, &[(a.id, 1)]);
  request.coupon_code = Some("SPENT".to_string());
  match env.orders.create_order(request).await.expect_err("must reject") {
    CheckoutError::CouponInvalid { reason, .. } => assert_eq!(reason, CouponRejection::Exhausted),
    other => panic!("expected CouponInvalid, got {:?}", other),
  }

  // Nothing was committed along the way.
  assert_eq!(env.store.order_count(), 0);
  assert_eq!(env.store.stock_for(a.id).unwrap().reserved, 0);
}

#[tokio::test]
async fn oversized_fixed_discount_floors_the_total_at_zero() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());
  let a = variant("Sample Vial 2ml", 500, 0.05);
  env.store.insert_variant(a.clone(), 10, 0);
  env
    .store
    .insert_coupon(open_coupon("HUGE", CouponKind::FixedAmount, 100_000));

  let mut request = checkout_request(user_id, address.id, &[(a.id, 1)]);
  request.coupon_code = Some("HUGE".to_string());
  let receipt = env.orders.create_order(request).await.expect("checkout should succeed");

  // Recorded discount stays uncapped; the total never goes negative.
  assert_eq!(receipt.order.discount_cents, 100_000);
  assert_eq!(receipt.order.total_cents, 0);
}

#[tokio::test]
async fn empty_and_non_positive_quantities_are_validation_errors() {
  let env = default_env();
  let user_id = Uuid::new_v4();
  let address = address_for(user_id, "20095");
  env.store.insert_address(address.clone());
  let a = variant("Iris Extrait 50ml", 10_000, 0.5);
  env.store.insert_variant(a.clone(), 10, 0);

  let err = env
    .orders
    .create_order(checkout_request(user_id, address.id, &[]))
    .await
    .expect_err("must reject");
  assert!(matches!(err, CheckoutError::Validation(_)));

  let err = env
    .orders
    .create_order(checkout_request(user_id, address.id, &[(a.id, 0)]))
    .await
    .expect_err("must reject");
  assert!(matches!(err, CheckoutError::Validation(_)));
}

#[tokio::test]
async fn quote_shipping_resolves_the_catalog_and_prices_options() {
  let env = default_env();
  let a = variant("Iris Extrait 50ml", 10_000, 0.5);
  env.store.insert_variant(a.clone(), 10, 0);

  let request = checkout_request(Uuid::new_v4(), Uuid::new_v4(), &[(a.id, 2)]);
  let options = env
    .orders
    .quote_shipping("20095", &request.items)
    .await
    .expect("quote should succeed");
  assert!(!options.is_empty());
  assert_eq!(options[0].price_cents, 2_000);

  let ghost = checkout_request(Uuid::new_v4(), Uuid::new_v4(), &[(Uuid::new_v4(), 1)]);
  let err = env
    .orders
    .quote_shipping("20095", &ghost.items)
    .await
    .expect_err("unknown items must reject");
  assert!(matches!(err, CheckoutError::ItemsNotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_cannot_both_reserve_the_last_unit() {
  let env = default_env();
  let address_owner = Uuid::new_v4();

  let last_bottle = variant("Last Bottle 100ml", 40_000, 0.8);
  env.store.insert_variant(last_bottle.clone(), 1, 0);

  let user_a = address_owner;
  let address_a = address_for(user_a, "20095");
  env.store.insert_address(address_a.clone());
  let user_b = Uuid::new_v4();
  let address_b = address_for(user_b, "10115");
  env.store.insert_address(address_b.clone());

  let orders_a = env.orders.clone();
  let orders_b = env.orders.clone();
  let request_a = checkout_request(user_a, address_a.id, &[(last_bottle.id, 1)]);
  let request_b = checkout_request(user_b, address_b.id, &[(last_bottle.id, 1)]);

  let (left, right) = tokio::join!(
    tokio::spawn(async move { orders_a.create_order(request_a).await }),
    tokio::spawn(async move { orders_b.create_order(request_b).await }),
  );
  let outcomes = [left.unwrap(), right.unwrap()];

  let successes = outcomes.iter().filter(|o| o.is_ok()).count();
  assert_eq!(successes, 1, "exactly one checkout may win the last unit");
  let loser = outcomes.iter().find(|o| o.is_err()).unwrap();
  assert!(matches!(
    loser.as_ref().unwrap_err(),
    CheckoutError::InsufficientStock { .. }
  ));

  let stock = env.store.stock_for(last_bottle.id).unwrap();
  assert_eq!(stock.reserved, 1);
  assert!(stock.reserved <= stock.on_hand);
}
