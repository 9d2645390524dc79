// core/src/services/orders.rs

//! Order Assembler: the workflow's core.
//!
//! `create_order` runs the precondition chain in a fixed order (address
//! ownership, catalog resolution, stock precheck, coupon validity, each
//! with its own failure), computes totals, and hands the store one atomic
//! commit. The payment preference is created strictly after the commit:
//! an external network call must not hold the transaction open, so a
//! gateway failure leaves a valid, payment-less pending order behind and
//! `retry_payment` is the explicit way to heal it later.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::PaymentRetryPolicy;
use crate::error::{CheckoutError, CouponRejection, GatewayError};
use crate::models::stock::check_availability;
use crate::models::{
  Coupon, NewPaymentRecord, Order, OrderItem, OrderMetadata, OrderStatus, PaymentRecord, PaymentStatus, ShipmentItem,
  ShippingOption, ShippingSelection,
};
use crate::services::catalog::{CatalogReader, ResolvedLine};
use crate::services::coupon;
use crate::services::gateway::{PayerContact, PaymentGateway, PreferenceLine, PreferenceRequest, PreferenceResponse};
use crate::services::shipping::ShippingEstimator;
use crate::store::{CheckoutStore, OrderDraft};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedItem {
  pub variant_id: Uuid,
  pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub payment_method: String,
  pub items: Vec<RequestedItem>,
  pub coupon_code: Option<String>,
  pub payer_email: String,
  pub payer_name: String,
}

/// What a successful checkout hands back. `payment` is absent when the
/// gateway could not be reached; the order itself is already committed.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub payment: Option<PaymentRecord>,
  pub redirect_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_error: Option<String>,
}

pub struct OrderService {
  store: Arc<dyn CheckoutStore>,
  catalog: CatalogReader,
  estimator: Arc<ShippingEstimator>,
  gateway: Arc<dyn PaymentGateway>,
  retry: PaymentRetryPolicy,
}

impl OrderService {
  pub fn new(
    store: Arc<dyn CheckoutStore>,
    estimator: Arc<ShippingEstimator>,
    gateway: Arc<dyn PaymentGateway>,
    retry: PaymentRetryPolicy,
  ) -> Self {
    Self {
      catalog: CatalogReader::new(store.clone()),
      store,
      estimator,
      gateway,
      retry,
    }
  }

  #[instrument(
    name = "orders::create",
    skip(self, request),
    fields(user_id = %request.user_id, item_count = request.items.len())
  )]
  pub async fn create_order(&self, request: CreateOrderRequest) -> Result<CheckoutReceipt, CheckoutError> {
    if request.items.is_empty() {
      return Err(CheckoutError::Validation("order must contain at least one item".to_string()));
    }
    if request.items.iter().any(|item| item.quantity <= 0) {
      return Err(CheckoutError::Validation(
        "item quantities must be greater than zero".to_string(),
      ));
    }

    // Precondition 1: the address must belong to the requesting user.
    let address = self
      .store
      .address_for_user(request.address_id, request.user_id)
      .await?
      .ok_or(CheckoutError::AddressNotFound {
        address_id: request.address_id,
        user_id: request.user_id,
      })?;

    // Precondition 2: every variant resolves to an active catalog entry.
    let requested: Vec<(Uuid, i64)> = request.items.iter().map(|item| (item.variant_id, item.quantity)).collect();
    let lines = self.catalog.resolve(&requested).await?;

    // Precondition 3: available-to-sell covers every line. Re-checked
    // under the store's locks at commit time; this early pass exists to
    // report shortfalls before any money math happens.
    let stock_lines: Vec<_> = lines.iter().map(|line| (line.stock.clone(), line.quantity)).collect();
    check_availability(&stock_lines)?;

    let subtotal_cents: i64 = lines.iter().map(|line| line.variant.price_cents * line.quantity).sum();

    // Precondition 4: the coupon, when supplied, must be applicable.
    let now = Utc::now();
    let applied_coupon = match &request.coupon_code {
      Some(code) => Some(self.resolve_coupon(code, now, subtotal_cents).await?),
      None => None,
    };

    // The workflow auto-selects the cheapest option; callers wanting a
    // specific carrier pre-filter upstream.
    let options = self.estimator.estimate(&address.postal_code, &shipment_items(&lines)).await;
    let selected = options
      .into_iter()
      .next()
      .unwrap_or_else(ShippingEstimator::last_resort);
    let shipping_cents = selected.price_cents;

    let discount_cents = applied_coupon
      .as_ref()
      .map(|c| coupon::evaluate(c, subtotal_cents, shipping_cents))
      .unwrap_or(0);
    // A large fixed-amount coupon may exceed subtotal + shipping; the
    // recorded discount stays uncapped but the total never goes negative.
    let total_cents = (subtotal_cents + shipping_cents - discount_cents).max(0);

    let order_id = Uuid::new_v4();
    let order = Order {
      id: order_id,
      order_number: order_number(now),
      user_id: request.user_id,
      address_id: request.address_id,
      status: OrderStatus::Pending,
      subtotal_cents,
      shipping_cents,
      discount_cents,
      total_cents,
      metadata: OrderMetadata {
        payment_method: request.payment_method.clone(),
        coupon_code: applied_coupon.as_ref().map(|c| c.code.clone()),
        shipping: Some(ShippingSelection {
          carrier: selected.carrier.clone(),
          service: selected.service.clone(),
          price_cents: selected.price_cents,
          lead_time_days: selected.lead_time_days,
        }),
        cancellation: None,
      },
      created_at: now,
    };
    let items: Vec<OrderItem> = lines
      .iter()
      .map(|line| OrderItem {
        id: Uuid::new_v4(),
        order_id,
        variant_id: line.variant.id,
        name: line.variant.name.clone(),
        quantity: line.quantity,
        unit_price_cents: line.variant.price_cents,
        line_total_cents: line.variant.price_cents * line.quantity,
      })
      .collect();

    let order = self
      .store
      .commit_order(OrderDraft {
        order,
        items: items.clone(),
        coupon_id: applied_coupon.as_ref().map(|c| c.id),
      })
      .await?;
    info!(
      order_number = %order.order_number,
      subtotal_cents,
      shipping_cents,
      discount_cents,
      total_cents = order.total_cents,
      "order committed"
    );

    // Post-commit: the gateway call. Failure is reported, never rolled
    // back into the committed order.
    let payer = PayerContact {
      email: request.payer_email.clone(),
      name: request.payer_name.clone(),
    };
    let preference = preference_request(&order, &items, payer);
    let (payment, redirect_url, payment_error) = match self.create_preference_with_retry(&preference).await {
      Ok(response) => {
        let record = self.persist_preference(&order, &request.payment_method, &response).await?;
        (Some(record), Some(response.redirect_url), None)
      }
      Err(err) => {
        warn!(order_id = %order.id, error = %err, "payment preference creation failed; order left pending without payment");
        (None, None, Some(err.to_string()))
      }
    };

    Ok(CheckoutReceipt {
      order,
      items,
      payment,
      redirect_url,
      payment_error,
    })
  }

  /// Standalone shipping quote for a prospective cart: resolves the items
  /// against the catalog and runs the estimator. The same auto-selection
  /// rule applies at checkout; callers use this to preview options.
  #[instrument(name = "orders::quote_shipping", skip(self, items), fields(destination = %postal_code))]
  pub async fn quote_shipping(
    &self,
    postal_code: &str,
    items: &[RequestedItem],
  ) -> Result<Vec<ShippingOption>, CheckoutError> {
    if items.is_empty() {
      return Err(CheckoutError::Validation("quote must contain at least one item".to_string()));
    }
    if items.iter().any(|item| item.quantity <= 0) {
      return Err(CheckoutError::Validation(
        "item quantities must be greater than zero".to_string(),
      ));
    }
    let requested: Vec<(Uuid, i64)> = items.iter().map(|item| (item.variant_id, item.quantity)).collect();
    let lines = self.catalog.resolve(&requested).await?;
    Ok(self.estimator.estimate(postal_code, &shipment_items(&lines)).await)
  }

  #[instrument(name = "orders::cancel", skip(self, reason), fields(order_id = %order_id, user_id = %user_id))]
  pub async fn cancel_order(&self, order_id: Uuid, user_id: Uuid, reason: &str) -> Result<Order, CheckoutError> {
    let order = self.store.cancel_order(order_id, user_id, reason, Utc::now()).await?;
    info!(order_number = %order.order_number, "order cancelled, reservations released");
    Ok(order)
  }

  /// The later retry path for an order left payment-less by a gateway
  /// failure. Idempotent: an existing payment record is returned as-is.
  #[instrument(name = "orders::retry_payment", skip(self), fields(order_id = %order_id, user_id = %user_id))]
  pub async fn retry_payment(
    &self,
    order_id: Uuid,
    user_id: Uuid,
    payer: PayerContact,
  ) -> Result<(PaymentRecord, Option<String>), CheckoutError> {
    let order = self
      .store
      .order_for_user(order_id, user_id)
      .await?
      .ok_or(CheckoutError::OrderNotFound { order_id })?;

    if let Some(existing) = self.store.payment_for_order(order_id).await? {
      return Ok((existing, None));
    }
    if order.status != OrderStatus::Pending {
      return Err(CheckoutError::Validation(format!(
        "payment can only be retried for pending orders (status is '{}')",
        order.status.as_str()
      )));
    }

    let items = self.store.items_for_order(order_id).await?;
    let preference = preference_request(&order, &items, payer);
    let response = self.create_preference_with_retry(&preference).await?;
    let record = self
      .persist_preference(&order, &order.metadata.payment_method, &response)
      .await?;
    Ok((record, Some(response.redirect_url)))
  }

  /// Refreshes the payment record from the gateway and returns it.
  #[instrument(name = "orders::payment_status", skip(self), fields(order_id = %order_id, user_id = %user_id))]
  pub async fn payment_status(&self, order_id: Uuid, user_id: Uuid) -> Result<PaymentRecord, CheckoutError> {
    self
      .store
      .order_for_user(order_id, user_id)
      .await?
      .ok_or(CheckoutError::OrderNotFound { order_id })?;
    let mut payment = self
      .store
      .payment_for_order(order_id)
      .await?
      .ok_or(CheckoutError::PaymentNotFound { order_id })?;

    let status = self.gateway.check_status(&payment.preference_id).await?;
    if status != payment.status {
      let raw = serde_json::json!({
        "preference_id": &payment.preference_id,
        "status": status.as_str(),
        "source": "status_poll",
      });
      self.store.set_payment_status(order_id, status, raw.clone()).await?;
      payment.status = status;
      payment.raw_response = raw;
    }
    Ok(payment)
  }

  pub async fn order_with_items(
    &self,
    order_id: Uuid,
    user_id: Uuid,
  ) -> Result<(Order, Vec<OrderItem>), CheckoutError> {
    let order = self
      .store
      .order_for_user(order_id, user_id)
      .await?
      .ok_or(CheckoutError::OrderNotFound { order_id })?;
    let items = self.store.items_for_order(order_id).await?;
    Ok((order, items))
  }

  async fn resolve_coupon(&self, code: &str, now: DateTime<Utc>, subtotal_cents: i64) -> Result<Coupon, CheckoutError> {
    let coupon = self
      .store
      .coupon_by_code(code)
      .await?
      .ok_or_else(|| CheckoutError::CouponInvalid {
        code: code.to_string(),
        reason: CouponRejection::NotFound,
      })?;
    coupon::check_applicable(&coupon, now, subtotal_cents).map_err(|reason| CheckoutError::CouponInvalid {
      code: code.to_string(),
      reason,
    })?;
    Ok(coupon)
  }

  async fn create_preference_with_retry(
    &self,
    request: &PreferenceRequest,
  ) -> Result<PreferenceResponse, GatewayError> {
    let mut attempt: u32 = 0;
    loop {
      match self.gateway.create_preference(request).await {
        Ok(response) => return Ok(response),
        Err(err) if attempt < self.retry.retries => {
          attempt += 1;
          warn!(attempt, error = %err, "preference creation failed; backing off and retrying");
          tokio::time::sleep(self.retry.backoff).await;
        }
        Err(err) => return Err(err),
      }
    }
  }

  async fn persist_preference(
    &self,
    order: &Order,
    method: &str,
    response: &PreferenceResponse,
  ) -> Result<PaymentRecord, CheckoutError> {
    let record = self
      .store
      .insert_payment(NewPaymentRecord {
        order_id: order.id,
        preference_id: response.preference_id.clone(),
        method: method.to_string(),
        status: PaymentStatus::Pending,
        amount_cents: order.total_cents,
        raw_response: response.raw.clone(),
      })
      .await?;
    Ok(record)
  }
}

fn shipment_items(lines: &[ResolvedLine]) -> Vec<ShipmentItem> {
  lines
    .iter()
    .map(|line| ShipmentItem {
      weight_kg: line.variant.weight_kg,
      width_cm: line.variant.width_cm,
      height_cm: line.variant.height_cm,
      length_cm: line.variant.length_cm,
      value_cents: line.variant.price_cents,
      quantity: line.quantity,
    })
    .collect()
}

/// Human-readable order number: UTC timestamp plus a random suffix, so two
/// orders created in the same instant cannot collide.
fn order_number(at: DateTime<Utc>) -> String {
  let suffix = Uuid::new_v4().simple().to_string();
  format!("ORD-{}-{}", at.format("%Y%m%d%H%M%S"), &suffix[..6])
}

/// The gateway sees the order's line items plus a synthetic shipping line
/// when shipping is not free.
fn preference_request(order: &Order, items: &[OrderItem], payer: PayerContact) -> PreferenceRequest {
  let mut lines: Vec<PreferenceLine> = items
    .iter()
    .map(|item| PreferenceLine {
      reference: item.variant_id.to_string(),
      title: item.name.clone(),
      quantity: item.quantity,
      unit_price_cents: item.unit_price_cents,
    })
    .collect();
  if order.shipping_cents > 0 {
    lines.push(PreferenceLine {
      reference: "shipping".to_string(),
      title: "Shipping".to_string(),
      quantity: 1,
      unit_price_cents: order.shipping_cents,
    });
  }
  PreferenceRequest {
    external_reference: order.id,
    payer,
    lines,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn order_numbers_carry_a_random_suffix() {
    let at = Utc::now();
    let a = order_number(at);
    let b = order_number(at);
    assert!(a.starts_with("ORD-"));
    assert_ne!(a, b, "same-instant order numbers must not collide");
  }

  #[test]
  fn shipping_line_only_added_when_paid() {
    let order = sample_order(0);
    let request = preference_request(&order, &[], sample_payer());
    assert!(request.lines.is_empty());

    let order = sample_order(2_000);
    let request = preference_request(&order, &[], sample_payer());
    assert_eq!(request.lines.len(), 1);
    assert_eq!(request.lines[0].reference, "shipping");
    assert_eq!(request.lines[0].unit_price_cents, 2_000);
  }

  fn sample_payer() -> PayerContact {
    PayerContact {
      email: "buyer@example.com".to_string(),
      name: "Buyer".to_string(),
    }
  }

  fn sample_order(shipping_cents: i64) -> Order {
    Order {
      id: Uuid::new_v4(),
      order_number: order_number(Utc::now()),
      user_id: Uuid::new_v4(),
      address_id: Uuid::new_v4(),
      status: OrderStatus::Pending,
      subtotal_cents: 10_000,
      shipping_cents,
      discount_cents: 0,
      total_cents: 10_000 + shipping_cents,
      metadata: OrderMetadata::default(),
      created_at: Utc::now(),
    }
  }
}
