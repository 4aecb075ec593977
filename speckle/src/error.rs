//! Error types for particle detection.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, processing or saving an image.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read image '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to write image '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl Error {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the source image rather than the parameters or the filesystem.
    pub fn is_invalid_image(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::EmptyImage { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message() {
        let err = Error::Io {
            path: PathBuf::from("/photos/missing.png"),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/photos/missing.png"));
        assert!(msg.contains("file not found"));
        assert!(!err.is_invalid_image());
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = Error::invalid_parameter("sensitivity_max", "must be in [0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'sensitivity_max': must be in [0, 1], got 1.5"
        );
    }

    #[test]
    fn test_empty_image_is_invalid_image() {
        let err = Error::EmptyImage {
            width: 0,
            height: 12,
        };
        assert!(err.is_invalid_image());
        assert!(err.to_string().contains("0x12"));
    }
}
