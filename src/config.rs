use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

// met.no rejects requests without an identifying User-Agent.
const DEFAULT_USER_AGENT: &str = "WeatherDashboard/1.0 (weather-dashboard-server)";

/// Proxy server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub google_maps_api_key: String,
    pub google_geocode_url: String,
    pub met_no_forecast_url: String,
    pub met_no_geolookup_url: String,
    pub met_no_user_agent: String,
    pub upstream_timeout_secs: u64,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .map_err(|_| anyhow::anyhow!("GOOGLE_MAPS_API_KEY not set"))?,
            google_geocode_url: env::var("GOOGLE_GEOCODE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/geocode/json".to_string()),
            met_no_forecast_url: env::var("MET_NO_FORECAST_URL").unwrap_or_else(|_| {
                "https://api.met.no/weatherapi/locationforecast/2.0/complete".to_string()
            }),
            met_no_geolookup_url: env::var("MET_NO_GEOLOOKUP_URL")
                .unwrap_or_else(|_| "https://api.met.no/weatherapi/geolookup/1.0/".to_string()),
            met_no_user_agent: env::var("MET_NO_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            upstream_timeout_secs: parse_or("UPSTREAM_TIMEOUT_SECS", 10)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

/// Configuration for the client data layer talking to the proxy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub app_timezone: String,
    pub preferences_db: String,
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let app_timezone = env::var("APP_TIMEZONE").unwrap_or_else(|_| "Asia/Tokyo".to_string());
        crate::utils::parse_timezone(&app_timezone).map_err(|e| anyhow::anyhow!(e))?;

        Ok(ClientConfig {
            api_base_url: env::var("DASHBOARD_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            app_timezone,
            preferences_db: env::var("DASHBOARD_PREFERENCES_DB")
                .unwrap_or_else(|_| "sqlite:./weather_dashboard.db?mode=rwc".to_string()),
            request_timeout_secs: parse_or("DASHBOARD_REQUEST_TIMEOUT_SECS", 15)?,
        })
    }

    pub fn timezone(&self) -> chrono_tz::Tz {
        crate::utils::parse_timezone(&self.app_timezone).unwrap_or(chrono_tz::Asia::Tokyo)
    }
}

fn parse_or(name: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
