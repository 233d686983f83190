use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Terminal fallback when no place name can be determined.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Google Geocoding API response.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl GeocodeResult {
    fn has_type(&self, wanted: &str) -> bool {
        self.types.iter().any(|t| t == wanted)
    }
}

/// Body of `GET /api/geocode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationNameResponse {
    pub location_name: String,
}

/// Pick the display name: locality, then state/province, then country, then
/// whatever came first, then [`UNKNOWN_LOCATION`].
pub fn select_location_name(results: &[GeocodeResult]) -> String {
    ["locality", "administrative_area_level_1", "country"]
        .iter()
        .find_map(|kind| results.iter().find(|r| r.has_type(kind)))
        .or_else(|| results.first())
        .map(|r| r.formatted_address.clone())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
}
