pub mod metno;
pub mod types;

use serde_json::Value;

use crate::cache::{forecast_key, TtlCache, FORECAST_TTL};
use crate::coalesce::RequestCoalescer;
use crate::error::{ProxyError, Upstream};
use crate::utils::Coordinates;
use metno::{MetNoClient, MetNoError};

impl From<MetNoError> for ProxyError {
    fn from(err: MetNoError) -> Self {
        match err {
            MetNoError::RateLimited => ProxyError::RateLimited(Upstream::Weather),
            other => ProxyError::UpstreamFailure {
                upstream: Upstream::Weather,
                detail: other.to_string(),
            },
        }
    }
}

/// Server-side forecast endpoint logic: cache, coalesce, fetch, enrich.
pub struct ForecastProxy {
    client: MetNoClient,
    cache: TtlCache<Value>,
    in_flight: RequestCoalescer<Value, ProxyError>,
}

impl ForecastProxy {
    pub fn new(client: MetNoClient) -> Self {
        Self::with_cache(client, TtlCache::new("forecast", FORECAST_TTL))
    }

    pub fn with_cache(client: MetNoClient, cache: TtlCache<Value>) -> Self {
        Self {
            client,
            cache,
            in_flight: RequestCoalescer::new(),
        }
    }

    pub async fn forecast(&self, coords: Coordinates) -> Result<Value, ProxyError> {
        let key = forecast_key(coords);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let client = self.client.clone();
        let cache = self.cache.clone();
        let slot = key.clone();
        self.in_flight
            .run(&key, move || async move {
                let mut payload = client.get_forecast(coords).await.map_err(|e| {
                    tracing::error!("Error fetching weather data: {}", e);
                    ProxyError::from(e)
                })?;

                match client.lookup_place(coords).await {
                    Ok(Some(location)) => inject_location(&mut payload, &location),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!("Error fetching location name from met.no: {}", e);
                    }
                }

                cache.put(slot, payload.clone()).await;
                Ok(payload)
            })
            .await
    }
}

/// Write `location` into `properties.location`, creating `properties` if needed.
fn inject_location(payload: &mut Value, location: &types::EmbeddedLocation) {
    let Some(root) = payload.as_object_mut() else {
        return;
    };
    let properties = root
        .entry("properties")
        .or_insert_with(|| Value::Object(Default::default()));
    if let Some(properties) = properties.as_object_mut() {
        if let Ok(location) = serde_json::to_value(location) {
            properties.insert("location".to_string(), location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_forecast, test_config};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn proxy_for(server: &MockServer) -> ForecastProxy {
        ForecastProxy::new(MetNoClient::new(&test_config(server)).unwrap())
    }

    #[tokio::test]
    async fn test_enriches_payload_with_place_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geolookup/1.0/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Oslo", "country": "Norway", "region": "Oslo"
            })))
            .mount(&server)
            .await;

        let payload = proxy_for(&server).await.forecast(Coordinates::DEFAULT).await.unwrap();

        assert_eq!(payload["properties"]["location"]["name"], "Oslo");
        assert_eq!(payload["properties"]["location"]["country"], "Norway");
        // Upstream fields pass through untouched.
        assert_eq!(payload["type"], "Feature");
    }

    #[tokio::test]
    async fn test_place_lookup_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geolookup/1.0/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let payload = proxy_for(&server).await.forecast(Coordinates::DEFAULT).await.unwrap();

        assert!(payload["properties"].get("location").is_none());
        assert!(payload["properties"]["timeseries"].is_array());
    }

    #[tokio::test]
    async fn test_nearby_coordinates_hit_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geolookup/1.0/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let first = proxy.forecast(Coordinates::new(35.6895, 139.6917).unwrap()).await.unwrap();
        let second = proxy.forecast(Coordinates::new(35.6899, 139.6902).unwrap()).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_forecast())
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geolookup/1.0/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let (a, b) = tokio::join!(
            proxy.forecast(Coordinates::DEFAULT),
            proxy.forecast(Coordinates::DEFAULT)
        );

        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_disconnected_caller_does_not_strand_the_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_forecast())
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geolookup/1.0/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let gone =
            tokio::time::timeout(Duration::from_millis(100), proxy.forecast(Coordinates::DEFAULT)).await;
        assert!(gone.is_err());

        // The abandoned fetch finishes on its own and fills the cache.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let payload = proxy.forecast(Coordinates::DEFAULT).await.unwrap();
        assert_eq!(payload["type"], "Feature");
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_distinguished_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = proxy_for(&server).await.forecast(Coordinates::DEFAULT).await.unwrap_err();

        assert_eq!(err, ProxyError::RateLimited(Upstream::Weather));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locationforecast/2.0/complete"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geolookup/1.0/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let proxy = proxy_for(&server).await;
        let err = proxy.forecast(Coordinates::DEFAULT).await.unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamFailure { upstream: Upstream::Weather, .. }));

        assert!(proxy.forecast(Coordinates::DEFAULT).await.is_ok());
    }

    #[test]
    fn test_inject_creates_properties() {
        let mut payload = serde_json::json!({ "type": "Feature" });
        inject_location(
            &mut payload,
            &types::EmbeddedLocation {
                name: "Bergen".into(),
                country: None,
                region: None,
            },
        );
        assert_eq!(
            payload["properties"]["location"],
            serde_json::json!({ "name": "Bergen" })
        );
    }
}
