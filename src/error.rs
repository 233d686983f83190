use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Which upstream a proxy error came from; picks the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Weather,
    Geocoding,
}

/// Normalized proxy failure. Every upstream problem ends up as one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("{0:?} upstream rate limited the request")]
    RateLimited(Upstream),
    #[error("{upstream:?} upstream failed: {detail}")]
    UpstreamFailure { upstream: Upstream, detail: String },
}

/// JSON error body returned by both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter(_) | ProxyError::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::UpstreamFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ProxyError::MissingParameter(_) => ErrorBody {
                error: "Latitude and longitude are required".to_string(),
                message: None,
            },
            ProxyError::InvalidParameter(detail) => ErrorBody {
                error: "Invalid coordinates".to_string(),
                message: Some(detail.clone()),
            },
            ProxyError::RateLimited(Upstream::Weather) => ErrorBody {
                error: "Rate limit exceeded. Please try again later.".to_string(),
                message: Some("The weather service is currently experiencing high demand.".to_string()),
            },
            ProxyError::RateLimited(Upstream::Geocoding) => ErrorBody {
                error: "Rate limit exceeded. Please try again later.".to_string(),
                message: Some("The location service is currently experiencing high demand.".to_string()),
            },
            ProxyError::UpstreamFailure {
                upstream: Upstream::Weather,
                ..
            } => ErrorBody {
                error: "Failed to fetch weather data".to_string(),
                message: Some(
                    "We're having trouble connecting to the weather service. Please try again later."
                        .to_string(),
                ),
            },
            ProxyError::UpstreamFailure {
                upstream: Upstream::Geocoding,
                ..
            } => ErrorBody {
                error: "Failed to fetch location data".to_string(),
                message: Some("We're having trouble determining your location name.".to_string()),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MissingParameter("lat").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::InvalidParameter("lat".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::RateLimited(Upstream::Weather).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ProxyError::UpstreamFailure {
                upstream: Upstream::Geocoding,
                detail: "HTTP 503".into()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_parameter_body_has_no_message() {
        let body = serde_json::to_value(ProxyError::MissingParameter("lon").body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Latitude and longitude are required" })
        );
    }

    #[test]
    fn test_upstream_detail_stays_out_of_body() {
        let body = ProxyError::UpstreamFailure {
            upstream: Upstream::Weather,
            detail: "HTTP 502: <html>bad gateway</html>".into(),
        }
        .body();
        assert_eq!(body.error, "Failed to fetch weather data");
        assert!(!body.message.unwrap_or_default().contains("bad gateway"));
    }
}
