//! Error types and handling for imagemin

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for imagemin operations
pub type Result<T> = std::result::Result<T, ImageminError>;

/// Main error type for imagemin operations
#[derive(Debug, Error)]
pub enum ImageminError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// Source or destination path was empty
    #[error("Source or target directory is not defined.")]
    DirectoryUndefined,

    /// Source directory does not exist or is not a directory
    #[error("The source directory '{}' does not exist.", .path.display())]
    SourceMissing { path: PathBuf },

    /// Destination directory could not be created
    #[error("Cannot create target directory '{}': {message}", .path.display())]
    CreateDestination { path: PathBuf, message: String },

    /// Conversion type string was not one of the supported targets
    #[error("Conversion type '{value}' is not valid. Use 'webp' or 'jpg'.")]
    InvalidConversion { value: String },

    /// Invalid conversion parameters
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// Decoding failed for a file
    #[error("{message}")]
    DecodeError {
        message: String,
        file: Option<PathBuf>,
    },

    /// Encoding or writing failed for a file
    #[error("{message}")]
    EncodeError {
        message: String,
        file: Option<PathBuf>,
    },

    /// File format not supported
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat {
        format: String,
        file: Option<PathBuf>,
    },

    /// HEIC decoder not compiled in or failed to initialise
    #[error("HEIC decoder unavailable: {message}")]
    HeicUnavailable {
        message: String,
        file: Option<PathBuf>,
    },
}

impl ImageminError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a new invalid conversion error
    pub fn invalid_conversion<S: Into<String>>(value: S) -> Self {
        Self::InvalidConversion {
            value: value.into(),
        }
    }

    pub fn source_missing(path: PathBuf) -> Self {
        Self::SourceMissing { path }
    }

    pub fn create_destination<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::CreateDestination {
            path,
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::DecodeError {
            message: message.into(),
            file,
        }
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::EncodeError {
            message: message.into(),
            file,
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S, file: Option<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            file,
        }
    }

    pub fn heic_unavailable<S: Into<String>>(message: S, file: Option<PathBuf>) -> Self {
        Self::HeicUnavailable {
            message: message.into(),
            file,
        }
    }

    /// Check if this error aborts the whole run
    ///
    /// Fatal errors are raised before traversal starts. A `HeicUnavailable`
    /// error is fatal only when raised at startup, i.e. without a file.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::DirectoryUndefined
            | Self::SourceMissing { .. }
            | Self::CreateDestination { .. }
            | Self::InvalidConversion { .. }
            | Self::InvalidParameters { .. }
            | Self::ConfigError { .. }
            | Self::SerdeError(_) => true,

            Self::HeicUnavailable { file, .. } => file.is_none(),

            Self::IoError(_)
            | Self::DecodeError { .. }
            | Self::EncodeError { .. }
            | Self::UnsupportedFormat { .. } => false,
        }
    }

    /// Check if this error is recoverable (the batch can continue)
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::DecodeError { file, .. }
            | Self::EncodeError { file, .. }
            | Self::UnsupportedFormat { file, .. }
            | Self::HeicUnavailable { file, .. } => file.as_ref(),

            Self::SourceMissing { path } | Self::CreateDestination { path, .. } => Some(path),

            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {}", e),
            Self::UnsupportedFormat { format, .. } => {
                format!("Unsupported image format: {}. Supported inputs: JPEG, PNG, WebP, HEIC", format)
            }
            Self::HeicUnavailable { message, .. } => {
                format!("HEIC decoding is not available ({}). Rebuild with `--features heic` and install libheif.", message)
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for ImageminError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for ImageminError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ImageminError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            match &mut error {
                ImageminError::DecodeError { file: ref mut f, .. }
                | ImageminError::EncodeError { file: ref mut f, .. }
                | ImageminError::UnsupportedFormat { file: ref mut f, .. }
                | ImageminError::HeicUnavailable { file: ref mut f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                _ => {}
            }

            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = ImageminError::config("test message");
        assert!(matches!(err, ImageminError::ConfigError { .. }));
    }

    #[test]
    fn test_fatal_errors() {
        assert!(ImageminError::DirectoryUndefined.is_fatal());
        assert!(ImageminError::source_missing(PathBuf::from("missing")).is_fatal());
        assert!(ImageminError::invalid_conversion("png").is_fatal());
        assert!(ImageminError::decode("bad data", None).is_recoverable());
        assert!(ImageminError::encode("disk full", None).is_recoverable());
    }

    #[test]
    fn test_heic_unavailable_is_fatal_only_without_file() {
        assert!(ImageminError::heic_unavailable("init failed", None).is_fatal());
        let per_file = ImageminError::heic_unavailable("not compiled", Some(PathBuf::from("a.heic")));
        assert!(per_file.is_recoverable());
    }

    #[test]
    fn test_messages_match_cli_wording() {
        assert_eq!(
            ImageminError::DirectoryUndefined.to_string(),
            "Source or target directory is not defined."
        );
        assert_eq!(
            ImageminError::source_missing(PathBuf::from("in")).to_string(),
            "The source directory 'in' does not exist."
        );
        assert_eq!(
            ImageminError::invalid_conversion("png").to_string(),
            "Conversion type 'png' is not valid. Use 'webp' or 'jpg'."
        );
    }

    #[test]
    fn test_user_messages() {
        let err = ImageminError::unsupported_format("BMP", None);
        let msg = err.user_message();
        assert!(msg.contains("Unsupported image format"));
        assert!(msg.contains("HEIC"));
    }

    #[test]
    fn test_file_context() {
        let result: Result<()> = Err(ImageminError::decode("truncated", None));
        let err = result
            .with_file_context(Path::new("photo.jpg").to_path_buf())
            .unwrap_err();

        assert_eq!(err.file_path(), Some(&PathBuf::from("photo.jpg")));
    }

    #[test]
    fn test_file_context_keeps_existing_path() {
        let result: Result<()> = Err(ImageminError::encode("x", Some(PathBuf::from("first.jpg"))));
        let err = result
            .with_file_context(PathBuf::from("second.jpg"))
            .unwrap_err();

        assert_eq!(err.file_path(), Some(&PathBuf::from("first.jpg")));
    }
}
