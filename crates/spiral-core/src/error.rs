use thiserror::Error;

/// Failures the core can observe. None of them is fatal to the frame loop:
/// each variant has a degraded path (default count, fallback geometry,
/// camera-relative placement, default config).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpiralError {
    #[error("counter configuration missing: {0}")]
    ConfigMissing(&'static str),
    #[error("counter transport failed: {0}")]
    Transport(String),
    #[error("asset '{path}' failed to load: {reason}")]
    AssetLoad { path: String, reason: String },
    #[error("hit-test unavailable: {0}")]
    HitTestUnavailable(String),
    #[error("invalid deployment config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SpiralError>;
