//! Error types for oval extraction operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for oval extraction operations
pub type Result<T> = std::result::Result<T, OvalError>;

/// Reasons a mask cannot yield an ellipse
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The mask has no foreground pixels, so no boundary exists
    #[error("no usable region: mask contains no foreground pixels")]
    NoUsableRegion,

    /// The dominant boundary is too short to determine an ellipse
    #[error("degenerate contour: need at least {needed} boundary points, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    /// The least-squares conic through the boundary is not a real ellipse
    #[error("degenerate contour: boundary does not fit a real ellipse ({0})")]
    NotAnEllipse(String),
}

/// Coarse failure category, used when tallying batch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    NotFound,
    Decode,
    DegenerateGeometry,
    Format,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not-found"),
            Self::Decode => write!(f, "decode"),
            Self::DegenerateGeometry => write!(f, "degenerate-geometry"),
            Self::Format => write!(f, "format"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Comprehensive error types for oval extraction operations
#[derive(Error, Debug)]
pub enum OvalError {
    /// A mask or source image does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A file exists but could not be decoded as an image
    #[error("Could not decode '{}': {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// The mask yields no ellipse
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(#[from] GeometryError),

    /// Malformed ellipse record or descriptor
    #[error("Format error: {0}")]
    Format(String),

    /// Input/output errors (permission denied, disk full, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OvalError {
    /// Create a new format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Self::Format(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a not-found error for a path
    pub fn not_found<P: AsRef<Path>>(path: P) -> Self {
        Self::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<Path>>(operation: &str, path: P, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(path);
        }
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create image loading error, separating absent files from corrupt ones
    pub fn image_load_error<P: AsRef<Path>>(path: P, error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self::not_found(path)
            },
            other => Self::Decode {
                path: path.as_ref().to_path_buf(),
                reason: other.to_string(),
            },
        }
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Failure category of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } | Self::Image(_) => ErrorKind::Decode,
            Self::DegenerateGeometry(_) => ErrorKind::DegenerateGeometry,
            Self::Format(_) => ErrorKind::Format,
            Self::Io(_) | Self::InvalidConfig(_) | Self::Internal(_) => ErrorKind::Other,
        }
    }
}
