use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// met.no `locationforecast/2.0/complete` document, reduced to what the
/// dashboard reads. The proxy forwards the raw document untouched apart from
/// `properties.location`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetForecast {
    pub properties: MetProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetProperties {
    #[serde(default)]
    pub timeseries: Vec<MetTimeStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<EmbeddedLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetTimeStep {
    pub time: DateTime<Utc>,
    pub data: MetTimeStepData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetTimeStepData {
    pub instant: MetInstant,
    pub next_1_hours: Option<MetPeriod>,
    pub next_6_hours: Option<MetPeriod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetInstant {
    pub details: MetInstantDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetInstantDetails {
    pub air_temperature: f64,
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetPeriod {
    pub summary: Option<MetSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetSummary {
    pub symbol_code: String,
}

/// Place name injected into `properties.location` by the forecast proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedLocation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// met.no geolookup response.
#[derive(Debug, Clone, Deserialize)]
pub struct GeolookupResponse {
    pub name: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
}

/// One forecast instant as the selector and recommendation rule see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    /// Absent when the provider omitted the reading.
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub next_1h_code: Option<String>,
    pub next_6h_code: Option<String>,
}

impl ForecastSample {
    /// Short-range code when present, otherwise the 6-hour summary.
    pub fn condition_code(&self) -> Option<&str> {
        self.next_1h_code
            .as_deref()
            .or(self.next_6h_code.as_deref())
    }

    /// 6-hour summary first; used for whole-day headlines.
    pub fn period_code(&self) -> Option<&str> {
        self.next_6h_code
            .as_deref()
            .or(self.next_1h_code.as_deref())
    }
}

impl From<&MetTimeStep> for ForecastSample {
    fn from(step: &MetTimeStep) -> Self {
        let code = |period: &Option<MetPeriod>| {
            period
                .as_ref()
                .and_then(|p| p.summary.as_ref())
                .map(|s| s.symbol_code.clone())
        };

        Self {
            time: step.time,
            temperature: step.data.instant.details.air_temperature,
            humidity: step.data.instant.details.relative_humidity,
            wind_speed: step.data.instant.details.wind_speed,
            next_1h_code: code(&step.data.next_1_hours),
            next_6h_code: code(&step.data.next_6_hours),
        }
    }
}

impl MetForecast {
    /// Samples in upstream order; no re-sorting.
    pub fn samples(&self) -> Vec<ForecastSample> {
        self.properties
            .timeseries
            .iter()
            .map(ForecastSample::from)
            .collect()
    }
}
