use crate::animation::{CompressionError, ContainerError};
use crate::schema::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the conversion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("script has no drawable commands (every color block was empty or missing)")]
    EmptyScript,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
