use rankwatch_core::{CategoryId, ProductId, SourceError};
use rankwatch_rules::RuleError;

/// Error type for detection runs.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("invalid detection config: {0}")]
    Config(#[from] RuleError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("malformed snapshot for product {product_id} in category {category_id}: {reason}")]
    MalformedSnapshot {
        product_id: ProductId,
        category_id: CategoryId,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, DetectError>;
