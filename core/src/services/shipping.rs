// core/src/services/shipping.rs

//! Shipping Estimator.
//!
//! Rate sources are layered: the carrier lookup first, the configured
//! synthetic tiers when the carrier fails, and a hard-coded last-resort
//! option when everything else comes up empty. Estimation never blocks
//! checkout: the public surface is infallible and always returns at least
//! one option.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::{CarrierConfig, ShippingConfig};
use crate::error::CarrierError;
use crate::models::{ShipmentItem, ShippingOption};

/// The aggregate query sent to the carrier: one synthetic package for the
/// whole cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuery {
  pub origin_postal_code: String,
  pub destination_postal_code: String,
  pub weight_kg: f64,
  pub width_cm: f64,
  pub height_cm: f64,
  pub length_cm: f64,
  pub declared_value_cents: i64,
}

/// One rate entry from the carrier. Entries carrying an error marker are
/// excluded from the quoted options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierQuote {
  pub carrier: String,
  pub service: String,
  pub price_cents: i64,
  pub lead_time_days: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Outbound carrier-rate lookup seam.
#[async_trait]
pub trait CarrierRates: Send + Sync {
  async fn rates(&self, query: &RateQuery) -> Result<Vec<CarrierQuote>, CarrierError>;
}

/// HTTP carrier client. The request timeout comes from configuration so a
/// slow carrier degrades into the fallback tiers instead of stalling
/// checkout.
pub struct HttpCarrierClient {
  http: reqwest::Client,
  config: CarrierConfig,
}

impl HttpCarrierClient {
  pub fn new(config: CarrierConfig) -> Result<Self, CarrierError> {
    let http = reqwest::Client::builder()
      .timeout(config.request_timeout)
      .build()
      .map_err(|err| CarrierError::Transport { source: err.into() })?;
    Ok(Self { http, config })
  }
}

#[async_trait]
impl CarrierRates for HttpCarrierClient {
  async fn rates(&self, query: &RateQuery) -> Result<Vec<CarrierQuote>, CarrierError> {
    let url = format!("{}/rates", self.config.base_url.trim_end_matches('/'));
    let mut request = self.http.post(&url).json(query);
    if let Some(token) = &self.config.api_token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|err| CarrierError::Transport { source: err.into() })?;
    if !response.status().is_success() {
      return Err(CarrierError::Status(response.status().as_u16()));
    }

    let quotes: Vec<CarrierQuote> = response
      .json()
      .await
      .map_err(|err| CarrierError::Transport { source: err.into() })?;
    if quotes.is_empty() {
      return Err(CarrierError::Empty);
    }
    Ok(quotes)
  }
}

/// The whole cart collapsed into one package: summed weight and declared
/// value, element-wise maximum dimensions. A simplification, not a packing
/// algorithm.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Package {
  pub weight_kg: f64,
  pub width_cm: f64,
  pub height_cm: f64,
  pub length_cm: f64,
  pub declared_value_cents: i64,
}

impl Package {
  pub(crate) fn aggregate(items: &[ShipmentItem]) -> Self {
    let mut package = Package {
      weight_kg: 0.0,
      width_cm: 0.0,
      height_cm: 0.0,
      length_cm: 0.0,
      declared_value_cents: 0,
    };
    for item in items {
      package.weight_kg += item.weight_kg * item.quantity as f64;
      package.width_cm = package.width_cm.max(item.width_cm);
      package.height_cm = package.height_cm.max(item.height_cm);
      package.length_cm = package.length_cm.max(item.length_cm);
      package.declared_value_cents += item.value_cents * item.quantity;
    }
    package
  }
}

pub struct ShippingEstimator {
  carrier: Arc<dyn CarrierRates>,
  config: ShippingConfig,
}

impl ShippingEstimator {
  pub fn new(carrier: Arc<dyn CarrierRates>, config: ShippingConfig) -> Self {
    Self { carrier, config }
  }

  /// Quotes shipping options for the destination, sorted ascending by
  /// price (stable: ties keep discovery order). Always returns at least
  /// one option.
  #[instrument(skip(self, items), fields(destination = %destination_postal_code, item_count = items.len()))]
  pub async fn estimate(&self, destination_postal_code: &str, items: &[ShipmentItem]) -> Vec<ShippingOption> {
    let package = Package::aggregate(items);

    let mut options = match self.carrier_options(destination_postal_code, &package).await {
      Ok(options) => options,
      Err(err) => {
        warn!(error = %err, "carrier lookup failed; quoting fallback tiers");
        self.fallback_options(&package)
      }
    };

    if let Some(threshold) = self.config.free_shipping_threshold_cents {
      if package.declared_value_cents >= threshold {
        debug!(
          declared_value_cents = package.declared_value_cents,
          threshold, "order qualifies for free shipping"
        );
        options.insert(
          0,
          ShippingOption {
            carrier: "flacon".to_string(),
            service: "free_shipping".to_string(),
            price_cents: 0,
            lead_time_days: self.config.free_shipping_lead_time_days,
          },
        );
      }
    }

    // Stable, so the free option stays ahead of any other zero-price entry
    // and carrier discovery order breaks price ties.
    options.sort_by_key(|option| option.price_cents);

    if options.is_empty() {
      warn!("every rate source came up empty; quoting the last-resort option");
      options.push(Self::last_resort());
    }
    options
  }

  async fn carrier_options(&self, destination: &str, package: &Package) -> Result<Vec<ShippingOption>, CarrierError> {
    let query = RateQuery {
      origin_postal_code: self.config.origin_postal_code.clone(),
      destination_postal_code: destination.to_string(),
      weight_kg: package.weight_kg,
      width_cm: package.width_cm,
      height_cm: package.height_cm,
      length_cm: package.length_cm,
      declared_value_cents: package.declared_value_cents,
    };
    let quotes = self.carrier.rates(&query).await?;

    let options: Vec<ShippingOption> = quotes
      .into_iter()
      .filter(|quote| {
        if let Some(marker) = &quote.error {
          debug!(carrier = %quote.carrier, service = %quote.service, error = %marker, "excluding errored rate entry");
          false
        } else {
          true
        }
      })
      .map(|quote| ShippingOption {
        carrier: quote.carrier,
        service: quote.service,
        price_cents: quote.price_cents,
        lead_time_days: quote.lead_time_days,
      })
      .collect();

    if options.is_empty() {
      return Err(CarrierError::Empty);
    }
    Ok(options)
  }

  /// Synthetic quotes: per tier, base price plus a linear function of
  /// weight and declared value.
  fn fallback_options(&self, package: &Package) -> Vec<ShippingOption> {
    self
      .config
      .fallback_tiers
      .iter()
      .map(|tier| ShippingOption {
        carrier: "flacon".to_string(),
        service: tier.service.clone(),
        price_cents: tier.base_cents
          + (tier.per_kg_cents as f64 * package.weight_kg).round() as i64
          + package.declared_value_cents * tier.value_permille / 1000,
        lead_time_days: tier.lead_time_days,
      })
      .collect()
  }

  /// The option of last resort when the carrier and every fallback tier
  /// are unavailable.
  pub(crate) fn last_resort() -> ShippingOption {
    ShippingOption {
      carrier: "flacon".to_string(),
      service: "standard".to_string(),
      price_cents: 1_500,
      lead_time_days: 10,
    }
  }
}
