//! Client data layer: talks to the proxy endpoints with its own TTL cache and
//! request coalescing, and turns payloads into what the dashboard views show.

pub mod fallback;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{forecast_key, geocode_key, TtlCache, FORECAST_TTL, LOCATION_TTL};
use crate::coalesce::RequestCoalescer;
use crate::config::ClientConfig;
use crate::error::ErrorBody;
use crate::forecast::types::{EmbeddedLocation, ForecastSample, MetForecast};
use crate::geocode::types::{LocationNameResponse, UNKNOWN_LOCATION};
use crate::recommendation;
use crate::selector::{summarize_day, Day, DaySummary};
use crate::utils::Coordinates;
use fallback::FallbackChain;

const CONNECTIVITY_MESSAGE: &str =
    "We're having trouble connecting to the weather service. Please try again later.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("proxy returned HTTP {status}: {message}")]
    Proxy { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("no place name in forecast")]
    NoEmbeddedLocation,
}

impl ClientError {
    /// Text to show in place of the data.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::RateLimited(message) | ClientError::Proxy { message, .. } => message.clone(),
            ClientError::Transport(_) | ClientError::Decode(_) | ClientError::NoEmbeddedLocation => {
                CONNECTIVITY_MESSAGE.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// A fetched forecast as the client keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPayload {
    pub samples: Vec<ForecastSample>,
    pub location: Option<EmbeddedLocation>,
}

impl From<MetForecast> for ForecastPayload {
    fn from(forecast: MetForecast) -> Self {
        Self {
            samples: forecast.samples(),
            location: forecast.properties.location,
        }
    }
}

/// Handle to the proxy. Clone it freely: clones share caches and in-flight
/// requests, so every view holding one coalesces with the others.
#[derive(Clone)]
pub struct DashboardClient {
    http: Client,
    base_url: Arc<str>,
    timezone: chrono_tz::Tz,
    forecasts: TtlCache<Arc<ForecastPayload>>,
    locations: TtlCache<String>,
    forecast_in_flight: RequestCoalescer<Arc<ForecastPayload>, ClientError>,
    location_in_flight: RequestCoalescer<String, ClientError>,
}

impl DashboardClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_base_url,
            config.timezone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_base_url(
        base_url: &str,
        timezone: chrono_tz::Tz,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            timezone,
            forecasts: TtlCache::new("client-forecast", FORECAST_TTL),
            locations: TtlCache::new("client-location", LOCATION_TTL),
            forecast_in_flight: RequestCoalescer::new(),
            location_in_flight: RequestCoalescer::new(),
        })
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        self.timezone
    }

    async fn fetch_payload(&self, coords: Coordinates) -> Result<Arc<ForecastPayload>, ClientError> {
        let key = forecast_key(coords);
        if let Some(cached) = self.forecasts.get(&key).await {
            return Ok(cached);
        }

        let http = self.http.clone();
        let url = format!("{}/api/weather", self.base_url);
        let cache = self.forecasts.clone();
        let slot = key.clone();
        self.forecast_in_flight
            .run(&key, move || async move {
                let query = [
                    ("lat", coords.latitude.to_string()),
                    ("lon", coords.longitude.to_string()),
                ];
                let forecast: MetForecast = get_json(&http, &url, &query).await.map_err(|e| {
                    tracing::error!("Error fetching weather data: {}", e);
                    e
                })?;

                let payload = Arc::new(ForecastPayload::from(forecast));
                cache.put(slot, payload.clone()).await;
                Ok(payload)
            })
            .await
    }

    /// Forecast samples for `coords`, in upstream order.
    pub async fn fetch_forecast(&self, coords: Coordinates) -> Result<Vec<ForecastSample>, ClientError> {
        Ok(self.fetch_payload(coords).await?.samples.clone())
    }

    async fn geocode(&self, coords: Coordinates, language: &str) -> Result<String, ClientError> {
        let key = geocode_key(coords, language);
        if let Some(cached) = self.locations.get(&key).await {
            return Ok(cached);
        }

        let http = self.http.clone();
        let url = format!("{}/api/geocode", self.base_url);
        let cache = self.locations.clone();
        let language = language.to_string();
        let slot = key.clone();
        self.location_in_flight
            .run(&key, move || async move {
                let query = [
                    ("lat", coords.latitude.to_string()),
                    ("lng", coords.longitude.to_string()),
                    ("lang", language),
                ];
                let body: LocationNameResponse = get_json(&http, &url, &query).await?;
                let name = if body.location_name.is_empty() {
                    UNKNOWN_LOCATION.to_string()
                } else {
                    body.location_name
                };

                cache.put(slot, name.clone()).await;
                Ok(name)
            })
            .await
    }

    /// Display name for `coords`. Never fails: tries the name embedded in the
    /// forecast, then the geocode endpoint, then settles for "Unknown Location".
    pub async fn fetch_location_name(&self, coords: Coordinates, language: &str) -> String {
        FallbackChain::new()
            .then(
                "forecast",
                async move {
                    self.fetch_payload(coords)
                        .await?
                        .location
                        .as_ref()
                        .map(|l| l.name.clone())
                        .ok_or(ClientError::NoEmbeddedLocation)
                }
                .boxed(),
            )
            .then("geocode", self.geocode(coords, language).boxed())
            .resolve_or(UNKNOWN_LOCATION.to_string())
            .await
    }

    pub async fn day_summary(
        &self,
        coords: Coordinates,
        day: Day,
    ) -> Result<Option<DaySummary>, ClientError> {
        self.day_summary_at(coords, day, Utc::now()).await
    }

    /// Summary of `day` as seen at `now`; `Ok(None)` when the forecast has no
    /// samples for that day.
    pub async fn day_summary_at(
        &self,
        coords: Coordinates,
        day: Day,
        now: DateTime<Utc>,
    ) -> Result<Option<DaySummary>, ClientError> {
        let payload = self.fetch_payload(coords).await?;
        let date = day.target_date(now, &self.timezone);
        Ok(summarize_day(&payload.samples, date, &self.timezone))
    }

    pub async fn needs_umbrella(&self, coords: Coordinates) -> Result<bool, ClientError> {
        let payload = self.fetch_payload(coords).await?;
        Ok(recommendation::needs_umbrella(&payload.samples))
    }
}

async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, ClientError> {
    let response = http.get(url).query(query).send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("API error: {}", status.as_u16()));

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Err(ClientError::RateLimited(message))
    } else {
        Err(ClientError::Proxy {
            status: status.as_u16(),
            message,
        })
    }
}
