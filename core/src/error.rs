// core/src/error.rs

use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{OrderStatus, StockShortage};

/// Why a supplied coupon code was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum CouponRejection {
  #[error("coupon does not exist or is not active")]
  NotFound,

  #[error("coupon is outside its validity window")]
  OutsideWindow,

  #[error("order subtotal {subtotal_cents} is below the coupon minimum {minimum_cents}")]
  BelowMinimum { minimum_cents: i64, subtotal_cents: i64 },

  #[error("coupon usage limit has been reached")]
  Exhausted,
}

/// Failure from a storage backend. Business-rule violations never travel
/// through this type; they have their own `CheckoutError` variants.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage backend failure: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },

  #[error("stored record is corrupt: {0}")]
  Corrupt(String),
}

impl StoreError {
  pub fn backend(err: impl Into<AnyhowError>) -> Self {
    StoreError::Backend { source: err.into() }
  }
}

/// Failure from the payment gateway collaborator.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("gateway rejected the preference request: {0}")]
  Rejected(String),

  #[error("gateway transport failure: {source}")]
  Transport {
    #[source]
    source: AnyhowError,
  },

  #[error("unknown payment preference: {0}")]
  UnknownPreference(String),
}

/// Failure from the carrier-rate lookup. Never escapes the shipping
/// estimator; every variant is recovered via the fallback tiers.
#[derive(Debug, Error)]
pub enum CarrierError {
  #[error("carrier request failed: {source}")]
  Transport {
    #[source]
    source: AnyhowError,
  },

  #[error("carrier responded with HTTP status {0}")]
  Status(u16),

  #[error("carrier returned no usable rates")]
  Empty,
}

/// Everything that can go wrong on the caller-facing operation surface.
///
/// Every business-rule variant carries enough structured detail for the
/// caller to correct the request; backend variants wrap their source and
/// expose nothing internal.
#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error("shipping address {address_id} not found for user {user_id}")]
  AddressNotFound { address_id: Uuid, user_id: Uuid },

  #[error("{} requested item(s) do not exist or are inactive", .missing.len())]
  ItemsNotFound { missing: Vec<Uuid> },

  #[error("insufficient stock for {} item(s)", .shortages.len())]
  InsufficientStock { shortages: Vec<StockShortage> },

  #[error("coupon '{code}' rejected: {reason}")]
  CouponInvalid { code: String, reason: CouponRejection },

  #[error("order {order_id} not found")]
  OrderNotFound { order_id: Uuid },

  #[error("order {order_id} cannot be cancelled from status '{}'", .status.as_str())]
  NotCancellable { order_id: Uuid, status: OrderStatus },

  #[error("no payment record exists for order {order_id}")]
  PaymentNotFound { order_id: Uuid },

  #[error("invalid request: {0}")]
  Validation(String),

  #[error("payment gateway failure")]
  Gateway(#[from] GatewayError),

  #[error("storage failure")]
  Store(#[from] StoreError),
}
