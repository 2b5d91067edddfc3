// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera core
//!
//! Public operations absorb these and report absence of a result instead;
//! they exist so internal helpers can use `?` and so every absorbed failure
//! gets a readable log line.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Capture device errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Mask analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Capture-device errors
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// No capture input could be attached
    #[error("No camera available")]
    DeviceUnavailable,
    /// Locking or reconfiguring the device failed
    #[error("Configuration failed: {0}")]
    ConfigurationFailed(String),
    /// The device did not deliver a frame
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    /// A capture is already in flight
    #[error("Camera is busy")]
    Busy,
}

/// Mask analysis errors
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// The vision backend failed to run the request
    #[error("Vision backend failed: {0}")]
    BackendFailed(String),
    /// The input could not be prepared for analysis
    #[error("Invalid input image: {0}")]
    InvalidInput(String),
    /// The mask raster could not be allocated or drawn
    #[error("Rendering failed: {0}")]
    RenderFailed(String),
}

/// Preset persistence errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(String),
    /// Image encoding or decoding failed
    #[error("Image codec error: {0}")]
    Codec(String),
    /// The identity does not name a user preset
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.into())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<image::ImageError> for StorageError {
    fn from(err: image::ImageError) -> Self {
        StorageError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_wraps_sub_errors() {
        let err: AppError = CameraError::Busy.into();
        assert_eq!(err.to_string(), "Camera error: Camera is busy");

        let err: AppError = StorageError::UnknownPreset("mask_x.png".into()).into();
        assert_eq!(err.to_string(), "Storage error: Unknown preset: mask_x.png");
    }

    #[test]
    fn test_io_error_becomes_storage_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Storage(StorageError::Io(_))));
    }
}
