//! Fixtures shared by the unit tests.

use serde_json::{json, Value};
use wiremock::MockServer;

use crate::config::Config;

pub(crate) fn test_config(server: &MockServer) -> Config {
    Config {
        google_maps_api_key: "test-key".to_string(),
        google_geocode_url: format!("{}/geocode/json", server.uri()),
        met_no_forecast_url: format!("{}/locationforecast/2.0/complete", server.uri()),
        met_no_geolookup_url: format!("{}/geolookup/1.0/", server.uri()),
        met_no_user_agent: "WeatherDashboardTests/1.0".to_string(),
        upstream_timeout_secs: 5,
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

/// A met.no document with hourly steps starting at 2024-01-02T00:00Z.
/// The sixth step carries a rain code, everything else is clear.
pub(crate) fn sample_forecast() -> Value {
    let timeseries: Vec<Value> = (0..14)
        .map(|hour| {
            let code = if hour == 5 { "rain" } else { "clearsky_day" };
            json!({
                "time": format!("2024-01-02T{:02}:00:00Z", hour),
                "data": {
                    "instant": { "details": {
                        "air_temperature": 10.0 + hour as f64,
                        "relative_humidity": 70.0,
                        "wind_speed": 3.5
                    } },
                    "next_1_hours": { "summary": { "symbol_code": code } },
                    "next_6_hours": { "summary": { "symbol_code": "partlycloudy_day" } }
                }
            })
        })
        .collect();

    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [139.69, 35.69, 40] },
        "properties": {
            "meta": { "updated_at": "2024-01-01T23:30:00Z" },
            "timeseries": timeseries
        }
    })
}
