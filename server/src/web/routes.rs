// server/src/web/routes.rs

use actix_web::web;

// Liveness only; the engine reports its own failures per-request.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1") // Base path for API version 1
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Shipping Routes
      .service(web::scope("/shipping").route(
        "/quote",
        web::post().to(crate::web::handlers::shipping_handlers::shipping_quote_handler),
      ))
      // Order Routes
      .service(
        web::scope("/orders")
          .route(
            "",
            web::post().to(crate::web::handlers::order_handlers::create_order_handler),
          )
          .route(
            "/{order_id}",
            web::get().to(crate::web::handlers::order_handlers::get_order_handler),
          )
          .route(
            "/{order_id}/cancel",
            web::post().to(crate::web::handlers::order_handlers::cancel_order_handler),
          )
          .service(
            web::resource("/{order_id}/payment")
              .route(web::post().to(crate::web::handlers::order_handlers::retry_payment_handler))
              .route(web::get().to(crate::web::handlers::order_handlers::payment_status_handler)),
          ),
      ),
  );
}
