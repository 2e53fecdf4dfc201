use camino::Utf8PathBuf;
use thiserror::Error;

/// Failures that abort an import. Anything less severe (one bad XML member,
/// one unbalanced section) is logged and skipped by the importer instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid .slx file {path}, file may be corrupted")]
    Archive {
        path: Utf8PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Model file {path} is empty")]
    Empty { path: Utf8PathBuf },
}

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Bad request: missing or empty file, unsupported extension.
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Failed to store uploaded model")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// True when the caller sent something unusable, as opposed to the
    /// conversion itself failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ConvertError::Input(_))
    }
}
