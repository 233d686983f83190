pub mod google;
pub mod types;

use crate::cache::{geocode_key, TtlCache, LOCATION_TTL};
use crate::coalesce::RequestCoalescer;
use crate::error::{ProxyError, Upstream};
use crate::utils::Coordinates;
use google::{GeocodeError, GoogleGeocoder};
use types::select_location_name;

pub const DEFAULT_LANGUAGE: &str = "en";

impl From<GeocodeError> for ProxyError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::RateLimited => ProxyError::RateLimited(Upstream::Geocoding),
            other => ProxyError::UpstreamFailure {
                upstream: Upstream::Geocoding,
                detail: other.to_string(),
            },
        }
    }
}

/// Server-side geocode endpoint logic. Names are cached per language.
pub struct GeocodeProxy {
    geocoder: GoogleGeocoder,
    cache: TtlCache<String>,
    in_flight: RequestCoalescer<String, ProxyError>,
}

impl GeocodeProxy {
    pub fn new(geocoder: GoogleGeocoder) -> Self {
        Self::with_cache(geocoder, TtlCache::new("geocode", LOCATION_TTL))
    }

    pub fn with_cache(geocoder: GoogleGeocoder, cache: TtlCache<String>) -> Self {
        Self {
            geocoder,
            cache,
            in_flight: RequestCoalescer::new(),
        }
    }

    pub async fn location_name(
        &self,
        coords: Coordinates,
        language: &str,
    ) -> Result<String, ProxyError> {
        let key = geocode_key(coords, language);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let geocoder = self.geocoder.clone();
        let cache = self.cache.clone();
        let language = language.to_string();
        let slot = key.clone();
        self.in_flight
            .run(&key, move || async move {
                let results = geocoder
                    .reverse_geocode(coords, &language)
                    .await
                    .map_err(|e| {
                        tracing::error!("Error fetching geocoding data: {}", e);
                        ProxyError::from(e)
                    })?;

                let name = select_location_name(&results);
                cache.put(slot, name.clone()).await;
                Ok(name)
            })
            .await
    }
}
