use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ErrorBody, ProxyError},
    forecast::ForecastProxy,
    geocode::{types::LocationNameResponse, GeocodeProxy, DEFAULT_LANGUAGE},
    utils::Coordinates,
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub forecast: Arc<ForecastProxy>,
    pub geocode: Arc<GeocodeProxy>,
}

// Query parameters arrive as raw strings so absence and garbage can be told apart.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Latitude in decimal degrees
    pub lat: Option<String>,
    /// Longitude in decimal degrees
    pub lon: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GeocodeQuery {
    /// Latitude in decimal degrees
    pub lat: Option<String>,
    /// Longitude in decimal degrees
    pub lng: Option<String>,
    /// Language tag for the place name, `en` when absent
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Weather Dashboard API", description = "Caching proxy over met.no and Google Geocoding"),
    paths(health, get_weather, get_geocode),
    components(schemas(HealthResponse, LocationNameResponse, ErrorBody)),
    tags(
        (name = "health", description = "Liveness"),
        (name = "weather", description = "Forecast and place-name lookups")
    )
)]
pub struct ApiDoc;

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Turn raw `lat`/`lon` strings into validated coordinates.
pub fn parse_coordinates(lat: Option<&str>, lon: Option<&str>) -> Result<Coordinates, ProxyError> {
    let (Some(lat), Some(lon)) = (present(lat), present(lon)) else {
        return Err(ProxyError::MissingParameter("lat/lon"));
    };

    let latitude: f64 = lat
        .parse()
        .map_err(|_| ProxyError::InvalidParameter(format!("latitude is not a number: {}", lat)))?;
    let longitude: f64 = lon
        .parse()
        .map_err(|_| ProxyError::InvalidParameter(format!("longitude is not a number: {}", lon)))?;

    Coordinates::new(latitude, longitude).map_err(ProxyError::InvalidParameter)
}

// Route handlers
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Upstream forecast document, with `properties.location` added when known.
#[utoipa::path(
    get,
    path = "/api/weather",
    tag = "weather",
    params(WeatherQuery),
    responses(
        (status = 200, description = "met.no forecast JSON"),
        (status = 400, description = "Missing or invalid coordinates", body = ErrorBody),
        (status = 429, description = "Forecast provider rate limited us", body = ErrorBody),
        (status = 500, description = "Forecast provider failed", body = ErrorBody)
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<Value>, ProxyError> {
    let coords = parse_coordinates(params.lat.as_deref(), params.lon.as_deref())?;
    let payload = state.forecast.forecast(coords).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/api/geocode",
    tag = "weather",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Best available place name", body = LocationNameResponse),
        (status = 400, description = "Missing or invalid coordinates", body = ErrorBody),
        (status = 429, description = "Geocoding provider rate limited us", body = ErrorBody),
        (status = 500, description = "Geocoding provider failed", body = ErrorBody)
    )
)]
pub async fn get_geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<LocationNameResponse>, ProxyError> {
    let coords = parse_coordinates(params.lat.as_deref(), params.lng.as_deref())?;
    let language = present(params.lang.as_deref()).unwrap_or(DEFAULT_LANGUAGE);

    let location_name = state.geocode.location_name(coords, language).await?;
    Ok(Json(LocationNameResponse { location_name }))
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather", get(get_weather))
        .route("/api/geocode", get(get_geocode))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
