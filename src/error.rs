//! Error types for Seawatch.
//!
//! The engine distinguishes between defects it can recover from (a single bad
//! record, surfaced as a warning count) and defects it cannot (a snapshot whose
//! shape is wrong, or a programmer handing non-finite coordinates to the geo
//! layer). Only the latter are represented here.

use thiserror::Error;

/// Errors raised by the situational-awareness engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MsaeError {
    /// A coordinate handed to the geo layer was NaN or infinite.
    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// The snapshot is not a bundle of record arrays.
    #[error("snapshot malformed: {0}")]
    SnapshotMalformed(String),

    /// The engine configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while fetching a snapshot from the tracking backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend rejected the bearer token; the operator must re-authenticate.
    #[error("backend rejected credentials for /{endpoint}")]
    Unauthorized { endpoint: String },

    /// The HTTP client could not be built or reached no endpoint at all.
    #[error("backend transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MsaeError::InvalidCoordinate {
            lat: f64::NAN,
            lon: 10.0,
        };
        assert_eq!(err.to_string(), "invalid coordinate (NaN, 10)");

        let err = MsaeError::SnapshotMalformed("vessels is not an array".to_string());
        assert!(err.to_string().contains("vessels is not an array"));

        let err = BackendError::Unauthorized {
            endpoint: "ports".to_string(),
        };
        assert_eq!(err.to_string(), "backend rejected credentials for /ports");
    }
}
