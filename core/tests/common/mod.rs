// tests/common/mod.rs
#![allow(dead_code)] // Allow unused helpers in this common test module

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use tracing::Level;
use uuid::Uuid;

use flacon::error::CarrierError;
use flacon::{
  Address, CarrierQuote, CarrierRates, CartEntry, Coupon, CouponKind, CreateOrderRequest, GatewayConfig,
  InMemoryStore, MockGateway, OrderService, PayerContact, PaymentRetryPolicy, ProductVariant, RateQuery,
  RequestedItem, ShippingConfig, ShippingEstimator,
};

// --- Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Scripted carrier collaborator ---

pub enum CarrierScript {
  /// Return these quotes.
  Quotes(Vec<CarrierQuote>),
  /// Fail with a transport error.
  Fail,
  /// Respond successfully with an empty rate list.
  Empty,
}

/// A `CarrierRates` double whose behavior the test scripts, recording the
/// last query so aggregation can be asserted on.
pub struct ScriptedCarrier {
  script: Mutex<CarrierScript>,
  last_query: Mutex<Option<RateQuery>>,
}

impl ScriptedCarrier {
  pub fn quoting(quotes: Vec<CarrierQuote>) -> Self {
    Self {
      script: Mutex::new(CarrierScript::Quotes(quotes)),
      last_query: Mutex::new(None),
    }
  }

  pub fn failing() -> Self {
    Self {
      script: Mutex::new(CarrierScript::Fail),
      last_query: Mutex::new(None),
    }
  }

  pub fn set_script(&self, script: CarrierScript) {
    *self.script.lock() = script;
  }

  pub fn last_query(&self) -> Option<RateQuery> {
    self.last_query.lock().clone()
  }
}

#[async_trait::async_trait]
impl CarrierRates for ScriptedCarrier {
  async fn rates(&self, query: &RateQuery) -> Result<Vec<CarrierQuote>, CarrierError> {
    *self.last_query.lock() = Some(query.clone());
    match &*self.script.lock() {
      CarrierScript::Quotes(quotes) => Ok(quotes.clone()),
      CarrierScript::Fail => Err(CarrierError::Transport {
        source: anyhow::anyhow!("scripted carrier outage"),
      }),
      CarrierScript::Empty => Ok(Vec::new()),
    }
  }
}

pub fn quote(carrier: &str, service: &str, price_cents: i64, lead_time_days: u32) -> CarrierQuote {
  CarrierQuote {
    carrier: carrier.to_string(),
    service: service.to_string(),
    price_cents,
    lead_time_days,
    error: None,
  }
}

pub fn errored_quote(carrier: &str, service: &str, marker: &str) -> CarrierQuote {
  CarrierQuote {
    carrier: carrier.to_string(),
    service: service.to_string(),
    price_cents: 0,
    lead_time_days: 0,
    error: Some(marker.to_string()),
  }
}

// --- Checkout environment wired against the in-memory store ---

pub struct TestEnv {
  pub store: Arc<InMemoryStore>,
  pub carrier: Arc<ScriptedCarrier>,
  pub gateway: Arc<MockGateway>,
  pub orders: Arc<OrderService>,
}

/// Default environment: carrier quoting a flat 20.00 rate, fast mock
/// gateway, one retry with no backoff so failure paths stay quick.
pub fn default_env() -> TestEnv {
  env_with(
    ShippingConfig::default(),
    vec![quote("correios", "standard", 2_000, 5)],
  )
}

pub fn env_with(shipping: ShippingConfig, quotes: Vec<CarrierQuote>) -> TestEnv {
  setup_tracing();
  let store = Arc::new(InMemoryStore::new());
  let carrier = Arc::new(ScriptedCarrier::quoting(quotes));
  let gateway = Arc::new(MockGateway::new(GatewayConfig {
    checkout_base_url: "https://pay.test".to_string(),
    latency: Duration::from_millis(0),
  }));
  let estimator = Arc::new(ShippingEstimator::new(carrier.clone(), shipping));
  let orders = Arc::new(OrderService::new(
    store.clone(),
    estimator,
    gateway.clone(),
    PaymentRetryPolicy {
      retries: 1,
      backoff: Duration::from_millis(0),
    },
  ));
  TestEnv {
    store,
    carrier,
    gateway,
    orders,
  }
}

// --- Fixture builders ---

pub fn variant(name: &str, price_cents: i64, weight_kg: f64) -> ProductVariant {
  ProductVariant {
    id: Uuid::new_v4(),
    name: name.to_string(),
    price_cents,
    weight_kg,
    width_cm: 10.0,
    height_cm: 12.0,
    length_cm: 8.0,
    active: true,
  }
}

pub fn address_for(user_id: Uuid, postal_code: &str) -> Address {
  Address {
    id: Uuid::new_v4(),
    user_id,
    recipient: "Test Buyer".to_string(),
    street: "1 Sample Street".to_string(),
    city: "Berlin".to_string(),
    postal_code: postal_code.to_string(),
    country: "DE".to_string(),
  }
}

pub fn cart_entry(user_id: Uuid, variant_id: Uuid, quantity: i64) -> CartEntry {
  CartEntry {
    id: Uuid::new_v4(),
    user_id,
    variant_id,
    quantity,
    added_at: Utc::now(),
  }
}

/// A coupon valid for the past and next hour, no minimum, no usage cap.
pub fn open_coupon(code: &str, kind: CouponKind, value: i64) -> Coupon {
  Coupon {
    id: Uuid::new_v4(),
    code: code.to_string(),
    kind,
    value,
    valid_from: Some(Utc::now() - ChronoDuration::hours(1)),
    valid_until: Some(Utc::now() + ChronoDuration::hours(1)),
    min_order_cents: None,
    usage_limit: None,
    used_count: 0,
  }
}

pub fn checkout_request(user_id: Uuid, address_id: Uuid, items: &[(Uuid, i64)]) -> CreateOrderRequest {
  CreateOrderRequest {
    user_id,
    address_id,
    payment_method: "mock_gateway".to_string(),
    items: items
      .iter()
      .map(|(variant_id, quantity)| RequestedItem {
        variant_id: *variant_id,
        quantity: *quantity,
      })
      .collect(),
    coupon_code: None,
    payer_email: "buyer@example.com".to_string(),
    payer_name: "Test Buyer".to_string(),
  }
}

pub fn payer() -> PayerContact {
  PayerContact {
    email: "buyer@example.com".to_string(),
    name: "Test Buyer".to_string(),
  }
}
