use thiserror::Error;

/// Convenient alias for results returned by the keyword-spotting pipeline.
pub type Result<T> = std::result::Result<T, KwsError>;

#[derive(Error, Debug)]
pub enum KwsError {
    /// Source is not decodable audio, or carries the wrong extension.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Training corpus root is missing or holds no labels/audio.
    #[error("directory error: {0}")]
    Directory(String),

    #[error("invalid value: {0}")]
    Value(String),

    /// Model artifact missing, or inference could not run.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid experiment details in the run store.
    #[error("tracking error: {0}")]
    Tracking(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, KwsError::NotFound(_))
    }

    /// Re-labels any failure as `NotFound`, keeping its message.
    pub(crate) fn into_not_found(self) -> Self {
        match self {
            KwsError::NotFound(_) => self,
            other => KwsError::NotFound(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::KwsError;

    #[test]
    fn into_not_found_keeps_message() {
        let err = KwsError::UnsupportedFormat("probe failed".into()).into_not_found();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("probe failed"));
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KwsError = io.into();
        assert!(matches!(err, KwsError::Io(_)));
        assert!(!err.is_not_found());
    }
}
