//! Power Mode Error Handling
//!
//! Only configuration APIs surface these errors. Effect paths (particle
//! frame loops, shake sequences, change aggregation) log and swallow them so
//! a failing host never disturbs the editing surface.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for power mode operations
pub type PowerModeResult<T> = Result<T, PowerModeError>;

#[derive(Debug, Error)]
pub enum PowerModeError {
    #[error("Surface unavailable during {operation}")]
    SurfaceUnavailable {
        operation: String,
    },

    #[error("Invalid value for option '{name}': {reason}")]
    InvalidOption {
        name: String,
        reason: String,
    },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Option '{name}' expects a {expected} value")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse {format} config: {error}")]
    ConfigParse {
        format: &'static str,
        error: String,
    },

    #[error("Unknown config format: {}", .0.display())]
    UnknownConfigFormat(PathBuf),
}

/// Helper trait for mapping host failures onto `SurfaceUnavailable`
pub trait SurfaceErrorContext<T> {
    fn surface_context(self, operation: &str) -> PowerModeResult<T>;
}

impl<T, E> SurfaceErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn surface_context(self, operation: &str) -> PowerModeResult<T> {
        self.map_err(|e| {
            log::trace!("[Surface] {} failed: {}", operation, e);
            surface_unavailable(operation)
        })
    }
}

/// Create a surface unavailable error
pub fn surface_unavailable(operation: &str) -> PowerModeError {
    PowerModeError::SurfaceUnavailable {
        operation: operation.to_string(),
    }
}

/// Create an invalid option error
pub fn invalid_option(name: &str, reason: impl std::fmt::Display) -> PowerModeError {
    PowerModeError::InvalidOption {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_context_maps_host_errors() {
        let host: Result<(), String> = Err("layer disposed".to_string());
        let err = host.surface_context("attach_visual").unwrap_err();

        match err {
            PowerModeError::SurfaceUnavailable { operation } => {
                assert_eq!(operation, "attach_visual")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = invalid_option("start_alpha", "must be in (0, 1]");
        assert_eq!(err.to_string(), "Invalid value for option 'start_alpha': must be in (0, 1]");

        let err = PowerModeError::UnknownConfigFormat(PathBuf::from("power.ini"));
        assert_eq!(err.to_string(), "Unknown config format: power.ini");
    }
}
