//! CLI-specific error types and exit codes.

use stowage_core::download::DownloadError;
use stowage_core::paths::PathError;
use stowage_media::MediaError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A download failed or was refused.
    #[error("{0}")]
    Download(String),

    /// Argument or name validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Store directory or environment misconfiguration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image decoding or encoding error.
    #[error("Image error: {0}")]
    Media(String),
}

impl CliError {
    /// Map error to a sysexits-style exit code.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Download(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Media(_) => 65,    // EX_DATAERR
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::InvalidUrl { .. } | DownloadError::InvalidFileName { .. } => {
                Self::Arguments(err.to_string())
            }
            DownloadError::Io { .. } | DownloadError::StorageMoveFailed { .. } => {
                Self::Io(err.user_message())
            }
            _ => Self::Download(err.user_message()),
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        if err.is_name_error() {
            Self::Arguments(err.to_string())
        } else {
            Self::Config(err.to_string())
        }
    }
}

impl From<MediaError> for CliError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Path(path_err) => path_err.into(),
            MediaError::Io { .. } | MediaError::NotFound(_) => Self::Io(err.to_string()),
            MediaError::Image(_) => Self::Media(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_names_are_usage_errors() {
        let err: CliError = DownloadError::invalid_file_name("..", "refers to a directory").into();
        assert_eq!(err.exit_code(), 2);

        let err: CliError = PathError::EmptyFileName.into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn store_failures_are_io_errors() {
        let err: CliError = DownloadError::storage_move_failed("/x", "denied").into();
        assert_eq!(err.exit_code(), 74);

        let err: CliError = MediaError::NotFound("/x".into()).into();
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn missing_home_is_config_error() {
        let err: CliError = PathError::NoHomeDir.into();
        assert_eq!(err.exit_code(), 78);
    }
}
