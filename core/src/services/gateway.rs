// core/src/services/gateway.rs

//! Payment Preference Client seam.
//!
//! Any gateway that can create a payment preference (returning a reference
//! id plus a redirect URL for the payer) and report its status fits behind
//! this trait. The bundled mock simulates latency and keeps its
//! preferences in memory; checkout code never knows the difference.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::models::PaymentStatus;

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceLine {
  pub reference: String,
  pub title: String,
  pub quantity: i64,
  pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayerContact {
  pub email: String,
  pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceRequest {
  /// Our order id, echoed back by the gateway for reconciliation.
  pub external_reference: Uuid,
  pub payer: PayerContact,
  pub lines: Vec<PreferenceLine>,
}

impl PreferenceRequest {
  pub fn total_cents(&self) -> i64 {
    self.lines.iter().map(|line| line.quantity * line.unit_price_cents).sum()
  }
}

#[derive(Debug, Clone)]
pub struct PreferenceResponse {
  pub preference_id: String,
  /// Where the buyer completes payment.
  pub redirect_url: String,
  /// Raw gateway response, persisted verbatim on the payment record.
  pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_preference(&self, request: &PreferenceRequest) -> Result<PreferenceResponse, GatewayError>;

  async fn check_status(&self, preference_id: &str) -> Result<PaymentStatus, GatewayError>;
}

/// In-memory gateway double. `set_failing` scripts an outage; `approve` /
/// `reject` drive a preference through its lifecycle the way a payer or a
/// webhook would.
pub struct MockGateway {
  config: GatewayConfig,
  failing: AtomicBool,
  preferences: Mutex<HashMap<String, PaymentStatus>>,
}

impl MockGateway {
  pub fn new(config: GatewayConfig) -> Self {
    Self {
      config,
      failing: AtomicBool::new(false),
      preferences: Mutex::new(HashMap::new()),
    }
  }

  /// While set, every `create_preference` call fails with a transport
  /// error, as an unreachable gateway would.
  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Marks a preference as paid. Returns false for unknown ids.
  pub fn approve(&self, preference_id: &str) -> bool {
    self.transition(preference_id, PaymentStatus::Approved)
  }

  /// Marks a preference as rejected. Returns false for unknown ids.
  pub fn reject(&self, preference_id: &str) -> bool {
    self.transition(preference_id, PaymentStatus::Rejected)
  }

  fn transition(&self, preference_id: &str, status: PaymentStatus) -> bool {
    let mut preferences = self.preferences.lock();
    match preferences.get_mut(preference_id) {
      Some(current) => {
        *current = status;
        true
      }
      None => false,
    }
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  #[instrument(skip(self, request), fields(external_reference = %request.external_reference, lines = request.lines.len()))]
  async fn create_preference(&self, request: &PreferenceRequest) -> Result<PreferenceResponse, GatewayError> {
    tokio::time::sleep(self.config.latency).await;

    if self.failing.load(Ordering::SeqCst) {
      return Err(GatewayError::Transport {
        source: anyhow::anyhow!("simulated gateway outage"),
      });
    }
    let total_cents = request.total_cents();
    if total_cents <= 0 {
      return Err(GatewayError::Rejected("amount must be greater than zero".to_string()));
    }

    let preference_id = format!("mock_pref_{}", Uuid::new_v4().simple());
    let redirect_url = format!(
      "{}/checkout/{}",
      self.config.checkout_base_url.trim_end_matches('/'),
      preference_id
    );
    self
      .preferences
      .lock()
      .insert(preference_id.clone(), PaymentStatus::Pending);

    info!(preference_id = %preference_id, total_cents, "created mock payment preference");
    Ok(PreferenceResponse {
      raw: json!({
        "preference_id": &preference_id,
        "external_reference": request.external_reference,
        "total_cents": total_cents,
        "redirect_url": &redirect_url,
        "status": PaymentStatus::Pending.as_str(),
      }),
      preference_id,
      redirect_url,
    })
  }

  #[instrument(skip(self))]
  async fn check_status(&self, preference_id: &str) -> Result<PaymentStatus, GatewayError> {
    tokio::time::sleep(self.config.latency).await;
    self
      .preferences
      .lock()
      .get(preference_id)
      .copied()
      .ok_or_else(|| GatewayError::UnknownPreference(preference_id.to_string()))
  }
}
