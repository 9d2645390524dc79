// core/src/models/mod.rs

//! Domain records for the order workflow.
//!
//! Everything here is a plain data type: serde for transport, no storage
//! derives. The stores map their own row representations onto these.

pub mod address;
pub mod cart_entry;
pub mod coupon;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod shipping;
pub mod stock;
pub mod variant;

pub use address::Address;
pub use cart_entry::CartEntry;
pub use coupon::{Coupon, CouponKind};
pub use order::{CancellationNote, Order, OrderMetadata, OrderStatus, ShippingSelection};
pub use order_item::OrderItem;
pub use payment::{NewPaymentRecord, PaymentRecord, PaymentStatus};
pub use shipping::{ShipmentItem, ShippingOption};
pub use stock::{StockRecord, StockShortage};
pub use variant::ProductVariant;
