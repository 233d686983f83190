use super::types::*;
use crate::config::Config;
use crate::utils::Coordinates;
use reqwest::Client;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Rate limited by geocoding API")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
}

/// Reverse-geocoding client for the Google Geocoding API.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: Client,
    url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(config: &Config) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(config.met_no_user_agent.clone())
            .timeout(config.upstream_timeout())
            .build()?;

        Ok(Self {
            client,
            url: config.google_geocode_url.clone(),
            api_key: config.google_maps_api_key.clone(),
        })
    }

    /// Candidate places for `coords`, named in `language`.
    pub async fn reverse_geocode(
        &self,
        coords: Coordinates,
        language: &str,
    ) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let latlng = format!("{},{}", coords.latitude, coords.longitude);
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("latlng", latlng.as_str()),
                ("key", self.api_key.as_str()),
                ("language", language),
                ("result_type", "locality|administrative_area_level_1|country"),
            ])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(GeocodeError::RateLimited),
            status => return Err(GeocodeError::ApiError(format!("HTTP {}", status))),
        }

        let body: GeocodeResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => Ok(body.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            "OVER_QUERY_LIMIT" => Err(GeocodeError::RateLimited),
            other => Err(GeocodeError::ApiError(format!(
                "{}: {}",
                other,
                body.error_message.unwrap_or_default()
            ))),
        }
    }
}
