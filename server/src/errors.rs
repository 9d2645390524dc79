// server/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use flacon::error::CheckoutError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Checkout Error: {source}")]
  Checkout {
    #[from]
    source: CheckoutError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response; the body only
    // carries what the caller can act on.
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Checkout { source } => checkout_error_response(source),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
    }
  }
}

/// Maps the engine's error taxonomy onto stable JSON bodies. Business
/// failures carry their structured detail (shortfall lists, coupon
/// sub-reason); backend failures stay detail-free.
fn checkout_error_response(err: &CheckoutError) -> HttpResponse {
  match err {
    CheckoutError::AddressNotFound { address_id, .. } => HttpResponse::NotFound().json(json!({
      "error": "address_not_found",
      "address_id": address_id,
    })),
    CheckoutError::ItemsNotFound { missing } => HttpResponse::NotFound().json(json!({
      "error": "items_not_found",
      "missing": missing,
    })),
    CheckoutError::OrderNotFound { order_id } => HttpResponse::NotFound().json(json!({
      "error": "order_not_found",
      "order_id": order_id,
    })),
    CheckoutError::PaymentNotFound { order_id } => HttpResponse::NotFound().json(json!({
      "error": "payment_not_found",
      "order_id": order_id,
    })),
    CheckoutError::InsufficientStock { shortages } => HttpResponse::Conflict().json(json!({
      "error": "insufficient_stock",
      "shortages": shortages,
    })),
    CheckoutError::CouponInvalid { code, reason } => HttpResponse::UnprocessableEntity().json(json!({
      "error": "coupon_invalid",
      "code": code,
      "detail": reason,
    })),
    CheckoutError::NotCancellable { order_id, status } => HttpResponse::Conflict().json(json!({
      "error": "order_not_cancellable",
      "order_id": order_id,
      "status": status,
    })),
    CheckoutError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": "validation", "detail": m})),
    CheckoutError::Gateway(source) => HttpResponse::BadGateway().json(json!({
      "error": "payment_gateway_failure",
      "detail": source.to_string(),
    })),
    CheckoutError::Store(_) => {
      HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"}))
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
