//! Error types for the parcel map services.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for map rendering.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Invalid param \"{name}\" should be {expected} but got \"{value}\".")]
    InvalidParameter {
        name: String,
        value: String,
        expected: String,
    },

    #[error("Too many parcels. You are trying to render {area} parcels and the maximum allowed is {max}.")]
    AreaTooLarge { area: i64, max: i64 },

    #[error("{0}")]
    UpstreamFailure(String),

    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MapError {
    /// Name of the offending request parameter, if any.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            MapError::InvalidParameter { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MapError::InvalidParameter { .. } => "invalid_parameter",
            MapError::AreaTooLarge { .. } => "area_too_large",
            MapError::UpstreamFailure(_) => "upstream_failure",
            MapError::RenderFailure(_) => "render_failure",
            MapError::Config(_) => "config",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Only admission rejections are reported as client errors; everything
    /// else surfaces as a generic failure.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MapError::AreaTooLarge { .. } => 400,
            _ => 500,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::RenderFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = MapError::InvalidParameter {
            name: "center".to_string(),
            value: "abc".to_string(),
            expected: "a coordinate \"x,y\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid param \"center\" should be a coordinate \"x,y\" but got \"abc\"."
        );
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.parameter_name(), Some("center"));
    }

    #[test]
    fn test_area_too_large_is_client_error() {
        let err = MapError::AreaTooLarge {
            area: 20000,
            max: 15000,
        };
        assert_eq!(err.http_status_code(), 400);
        assert!(err.to_string().contains("20000"));
        assert!(err.to_string().contains("15000"));
    }
}
