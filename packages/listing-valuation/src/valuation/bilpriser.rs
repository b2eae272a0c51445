//! HTTP client for the bilpriser.se registry and valuation endpoints.

use async_trait::async_trait;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{from_reqwest, ValuationApi};
use crate::error::{ValuationError, ValuationResult};
use crate::types::{config::ValuationConfig, VehicleInfo};

/// Registry response: `{ "vehicle": { ... } }`.
#[derive(Debug, Deserialize)]
pub struct RegistryResponse {
    pub vehicle: RegistryVehicle,
}

#[derive(Debug, Deserialize)]
pub struct RegistryVehicle {
    #[serde(default, deserialize_with = "scalar")]
    pub model_id: String,

    #[serde(default, deserialize_with = "scalar")]
    pub estimated_distance: String,

    #[serde(default, deserialize_with = "scalar")]
    pub model_year: String,

    #[serde(default, deserialize_with = "scalar")]
    pub registration_date: String,
}

/// Valuation response: `{ "valued_dealer_price": "..." }`.
#[derive(Debug, Deserialize)]
pub struct PriceResponse {
    #[serde(default, deserialize_with = "scalar")]
    pub valued_dealer_price: String,
}

/// Accept a JSON string or number (null reads as empty).
fn scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl TryFrom<RegistryResponse> for VehicleInfo {
    type Error = ValuationError;

    fn try_from(response: RegistryResponse) -> ValuationResult<Self> {
        let v = response.vehicle;
        if v.model_id.trim().is_empty() {
            return Err(ValuationError::MissingField("model_id"));
        }

        Ok(VehicleInfo {
            model_id: v.model_id,
            distance: v.estimated_distance,
            model_year: v.model_year,
            registration_date: v.registration_date,
        })
    }
}

/// Client for the registry and valuation API.
pub struct BilprisClient {
    client: reqwest::Client,
    base_url: Url,
    user_agent: String,
    timeout: Duration,
}

impl BilprisClient {
    /// Create a client from configuration.
    pub fn new(config: &ValuationConfig) -> ValuationResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ValuationError::Http)?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
        })
    }

    /// Set a custom HTTP client. Timeout and user agent still apply per request.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// `?bpapi_action=get_vehicle_registry_se&regnr={plate}`
    pub fn registry_url(&self, plate: &str) -> ValuationResult<Url> {
        Ok(Url::parse_with_params(
            self.base_url.as_str(),
            &[("bpapi_action", "get_vehicle_registry_se"), ("regnr", plate)],
        )?)
    }

    /// `?bpapi_action=get_values&model_id=&y=&distance=&value_decrement_start=&regnr=`
    pub fn price_url(&self, plate: &str, vehicle: &VehicleInfo) -> ValuationResult<Url> {
        Ok(Url::parse_with_params(
            self.base_url.as_str(),
            &[
                ("bpapi_action", "get_values"),
                ("model_id", vehicle.model_id.as_str()),
                ("y", vehicle.model_year.as_str()),
                ("distance", vehicle.distance.as_str()),
                ("value_decrement_start", vehicle.registration_date.as_str()),
                ("regnr", plate),
            ],
        )?)
    }

    /// GET `url` and return the body of a successful response.
    async fn get_body(&self, url: Url) -> ValuationResult<String> {
        let url_str = url.to_string();
        debug!(url = %url_str, "Valuation request");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| from_reqwest(&url_str, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValuationError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| from_reqwest(&url_str, e))
    }
}

#[async_trait]
impl ValuationApi for BilprisClient {
    async fn lookup_vehicle(&self, plate: &str) -> ValuationResult<VehicleInfo> {
        let body = self.get_body(self.registry_url(plate)?).await?;
        let response: RegistryResponse = serde_json::from_str(&body)?;
        VehicleInfo::try_from(response)
    }

    async fn lookup_price(&self, plate: &str, vehicle: &VehicleInfo) -> ValuationResult<String> {
        let body = self.get_body(self.price_url(plate, vehicle)?).await?;
        let response: PriceResponse = serde_json::from_str(&body)?;

        let price = response.valued_dealer_price.trim();
        if price.is_empty() {
            return Err(ValuationError::MissingField("valued_dealer_price"));
        }
        Ok(price.to_string())
    }
}
