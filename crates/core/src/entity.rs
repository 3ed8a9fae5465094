use serde::{Deserialize, Serialize};

pub type ProductId = i64;
pub type CategoryId = i64;
pub type BrandId = i64;

/// A tracked product. Only the identity fields the detector needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub brand_id: BrandId,
    #[serde(default)]
    pub name: String,
}

impl Product {
    /// Product name truncated for log lines.
    pub fn short_name(&self) -> &str {
        match self.name.char_indices().nth(30) {
            Some((idx, _)) => &self.name[..idx],
            None => &self.name,
        }
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "product#{}", self.id)
        } else {
            write!(f, "{} (#{})", self.short_name(), self.id)
        }
    }
}
