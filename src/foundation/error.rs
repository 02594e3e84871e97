/// Convenience result type used across tilekit.
pub type TilekitResult<T> = Result<T, TilekitError>;

/// Top-level error taxonomy for the facade and configuration layers.
///
/// The scheduling core itself has no error channel: broken preconditions there are assertions.
#[derive(thiserror::Error, Debug)]
pub enum TilekitError {
    /// Invalid caller-provided geometry, buffers or operation parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed or out-of-range scheduler configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The worker pool could not be brought up.
    #[error("pool error: {0}")]
    Pool(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TilekitError {
    /// Build a [`TilekitError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TilekitError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`TilekitError::Pool`] value.
    pub fn pool(msg: impl Into<String>) -> Self {
        Self::Pool(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
