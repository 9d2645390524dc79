// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use flacon::{CreateOrderRequest, PayerContact, RequestedItem};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct CreateOrderPayload {
  pub address_id: Uuid,
  pub payment_method: String,
  pub items: Vec<RequestedItem>,
  pub coupon_code: Option<String>,
  pub payer_email: String,
  pub payer_name: String,
}

#[derive(Deserialize, Debug)]
pub struct CancelOrderPayload {
  pub reason: String,
}

#[derive(Deserialize, Debug)]
pub struct RetryPaymentPayload {
  pub payer_email: String,
  pub payer_name: String,
}

// --- Handler Implementations ---

#[instrument(
  name = "handler::create_order",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, item_count = payload.items.len())
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let receipt = app_state
    .orders
    .create_order(CreateOrderRequest {
      user_id: auth_user.user_id,
      address_id: payload.address_id,
      payment_method: payload.payment_method,
      items: payload.items,
      coupon_code: payload.coupon_code,
      payer_email: payload.payer_email,
      payer_name: payload.payer_name,
    })
    .await?;

  info!(
    order_number = %receipt.order.order_number,
    payment_created = receipt.payment.is_some(),
    "Checkout completed"
  );
  Ok(HttpResponse::Created().json(receipt))
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let (order, items) = app_state
    .orders
    .order_with_items(path.into_inner(), auth_user.user_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order, "items": items })))
}

#[instrument(
  name = "handler::cancel_order",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path)
)]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<CancelOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .cancel_order(path.into_inner(), auth_user.user_id, &payload.reason)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(
  name = "handler::retry_payment",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path)
)]
pub async fn retry_payment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<RetryPaymentPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let (payment, redirect_url) = app_state
    .orders
    .retry_payment(
      path.into_inner(),
      auth_user.user_id,
      PayerContact {
        email: payload.payer_email,
        name: payload.payer_name,
      },
    )
    .await?;
  Ok(HttpResponse::Created().json(json!({ "payment": payment, "redirect_url": redirect_url })))
}

#[instrument(
  name = "handler::payment_status",
  skip(app_state, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path)
)]
pub async fn payment_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payment = app_state
    .orders
    .payment_status(path.into_inner(), auth_user.user_id)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "payment": payment })))
}
