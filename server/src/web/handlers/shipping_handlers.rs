// server/src/web/handlers/shipping_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use flacon::RequestedItem;

use crate::errors::AppError;
use crate::state::AppState;

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct ShippingQuotePayload {
  pub postal_code: String,
  pub items: Vec<RequestedItem>,
}

// --- Handler Implementation ---

#[instrument(
  name = "handler::shipping_quote",
  skip(app_state, payload),
  fields(destination = %payload.postal_code, item_count = payload.items.len())
)]
pub async fn shipping_quote_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ShippingQuotePayload>,
) -> Result<HttpResponse, AppError> {
  let options = app_state
    .orders
    .quote_shipping(&payload.postal_code, &payload.items)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "options": options })))
}
