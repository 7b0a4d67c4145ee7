use std::path::PathBuf;

use thiserror::Error;

/// Library error type for carousel operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A carousel needs at least one slide to navigate.
    #[error("carousel requires at least one slide")]
    EmptySlides,

    /// Slide source points at a remote location; only local files are loaded.
    #[error("remote slide sources are not supported: {0}")]
    RemoteSource(String),

    /// A responsive `sizes` hint could not be parsed.
    #[error("invalid sizes hint {0:?}")]
    InvalidSizes(String),

    /// Image decoding failed.
    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
