// core/src/lib.rs

//! Flacon: the order-processing engine behind the Flacon perfume storefront.
//!
//! The crate covers the most procedurally complex path of the storefront:
//!  - Catalog resolution of purchasable variants and their stock rows.
//!  - Shipping estimation with a carrier collaborator and layered fallbacks.
//!  - Coupon applicability checks and pure discount evaluation.
//!  - Order assembly: precondition checks, totals, atomic stock reservation
//!    and post-commit payment-preference creation against a gateway.
//!  - Order cancellation with reservation release.
//!
//! Storage, the carrier-rate lookup and the payment gateway all sit behind
//! traits so the engine runs unchanged against Postgres or the bundled
//! in-memory store, and against a real gateway or the bundled mock.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::config::{CarrierConfig, FlatRateTier, GatewayConfig, PaymentRetryPolicy, ShippingConfig};
pub use crate::error::{CarrierError, CheckoutError, CouponRejection, GatewayError, StoreError};

pub use crate::models::{
  Address, CartEntry, Coupon, CouponKind, Order, OrderItem, OrderMetadata, OrderStatus, PaymentRecord, PaymentStatus,
  ProductVariant, ShipmentItem, ShippingOption, StockRecord, StockShortage,
};

pub use crate::services::catalog::{CatalogReader, ResolvedLine};
pub use crate::services::coupon::{check_applicable, evaluate};
pub use crate::services::gateway::{
  MockGateway, PayerContact, PaymentGateway, PreferenceLine, PreferenceRequest, PreferenceResponse,
};
pub use crate::services::orders::{CheckoutReceipt, CreateOrderRequest, OrderService, RequestedItem};
pub use crate::services::shipping::{CarrierQuote, CarrierRates, HttpCarrierClient, RateQuery, ShippingEstimator};

pub use crate::store::{CheckoutStore, InMemoryStore, OrderDraft, StoreResult};

/// Result alias used throughout the engine.
pub type CheckoutResult<T, E = CheckoutError> = std::result::Result<T, E>;
