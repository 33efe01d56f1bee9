/// Convenience result type used across Visage.
pub type VisageResult<T> = Result<T, VisageError>;

/// Top-level error taxonomy used by engine internals.
///
/// Public compositing, cropping and avatar operations never surface these to callers; they
/// convert them into their documented fallback value at the operation boundary.
#[derive(thiserror::Error, Debug)]
pub enum VisageError {
    /// Invalid caller-provided data (dimensions, ranges, identifiers).
    #[error("validation error: {0}")]
    Validation(String),

    /// A logical asset path did not resolve to an image.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// A source image does not allow direct pixel access and could not be read back.
    #[error("unreadable image: {0}")]
    Unreadable(String),

    /// Degenerate geometry such as a zero-area crop rectangle or face region.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Two buffers that must share dimensions do not.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Encoded image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Engine configuration could not be loaded or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VisageError {
    /// Build a [`VisageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VisageError::AssetNotFound`] value.
    pub fn asset_not_found(path: impl Into<String>) -> Self {
        Self::AssetNotFound(path.into())
    }

    /// Build a [`VisageError::Unreadable`] value.
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self::Unreadable(msg.into())
    }

    /// Build a [`VisageError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`VisageError::DimensionMismatch`] value.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Build a [`VisageError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`VisageError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
