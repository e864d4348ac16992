use thiserror::Error;

/// All errors that can occur in libris-core.
#[derive(Debug, Error)]
pub enum LibrisError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown search field: {0} (expected title, author or genre)")]
    InvalidSearchField(String),

    #[error("Unknown storage backend: {0} (expected json or sqlite)")]
    UnknownBackend(String),

    #[error("Cover image not found: {0}")]
    CoverNotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LibrisError {
    /// Short machine-readable kind, used in JSON error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidSearchField(_) => "invalid_search_field",
            Self::UnknownBackend(_) => "unknown_backend",
            Self::CoverNotFound(_) => "cover_not_found",
            Self::Config(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Database(_) => "database",
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Validation(_) | Self::InvalidSearchField(_) | Self::UnknownBackend(_) => {
                ExitCode::InvalidArgs
            }
            Self::CoverNotFound(_) | Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Process exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

pub type Result<T> = std::result::Result<T, LibrisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_invalid_args() {
        let err = LibrisError::Validation("title is required".to_string());
        assert_eq!(err.exit_code(), ExitCode::InvalidArgs);
        assert_eq!(err.kind(), "validation");
        assert_eq!(i32::from(err.exit_code()), 3);
    }

    #[test]
    fn test_io_maps_to_filesystem_error() {
        let err: LibrisError = std::io::Error::other("disk full").into();
        assert_eq!(err.exit_code(), ExitCode::FileSystemError);
        assert!(err.to_string().contains("disk full"));
    }
}
