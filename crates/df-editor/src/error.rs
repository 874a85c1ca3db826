use df_core::DocError;
use thiserror::Error;

/// Configuration problems found by `EditorConfig::validate`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("page size must be positive and finite, got {width}×{height}")]
    PageSize { width: f64, height: f64 },

    #[error("zoom bounds must satisfy 0 < min ≤ max, got [{min}, {max}]")]
    ZoomBounds { min: f64, max: f64 },

    #[error("zoom step must be greater than 1, got {0}")]
    ZoomStep(f64),

    #[error("history depth must be at least 1")]
    HistoryDepth,

    #[error("default font size {0}pt is too small to read (minimum {min}pt)", min = crate::config::MIN_LEGIBLE_FONT_SIZE)]
    FontSize(f64),

    #[error("default {block} size must be positive, got {width}×{height}")]
    BlockSize {
        block: &'static str,
        width: f64,
        height: f64,
    },

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by editor commands. Invariant races are not errors;
/// those commands return `false` / `None` instead.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Document(#[from] DocError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type EditorResult<T> = Result<T, EditorError>;
