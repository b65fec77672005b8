use thiserror::Error;

/// Errors raised while preparing shared settings.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting deserialized fine but holds a value the library rejects.
    #[error("invalid setting: {0}")]
    ConfigError(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
