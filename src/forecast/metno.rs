use super::types::*;
use crate::config::Config;
use crate::utils::Coordinates;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetNoError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Rate limited by met.no")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
}

/// Client for the met.no forecast and geolookup APIs.
#[derive(Clone)]
pub struct MetNoClient {
    client: Client,
    forecast_url: String,
    geolookup_url: String,
}

impl MetNoClient {
    pub fn new(config: &Config) -> Result<Self, MetNoError> {
        let client = Client::builder()
            .user_agent(config.met_no_user_agent.clone())
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            client,
            forecast_url: config.met_no_forecast_url.clone(),
            geolookup_url: config.met_no_geolookup_url.clone(),
        })
    }

    /// Raw forecast document for `coords`, sent at full precision.
    pub async fn get_forecast(&self, coords: Coordinates) -> Result<Value, MetNoError> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Rate limited by met.no forecast API");
                Err(MetNoError::RateLimited)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(MetNoError::ApiError(format!("HTTP {}: {}", status, error_text)))
            }
        }
    }

    /// Place name near `coords`, if the geolookup service knows one.
    pub async fn lookup_place(
        &self,
        coords: Coordinates,
    ) -> Result<Option<EmbeddedLocation>, MetNoError> {
        let response = self
            .client
            .get(&self.geolookup_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetNoError::ApiError(format!("HTTP {}", status)));
        }

        let lookup: GeolookupResponse = serde_json::from_value(response.json().await?)?;
        Ok(lookup
            .name
            .filter(|name| !name.is_empty())
            .map(|name| EmbeddedLocation {
                name,
                country: lookup.country,
                region: lookup.region,
            }))
    }
}
