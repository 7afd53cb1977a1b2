//! Resolved redirect targets.

use crate::domain::Category;

/// The canonical page an identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub category: Category,
    /// Canonical id (decimal for layers and epochs, lowercase hex for rewards).
    pub id: String,
}

impl SearchTarget {
    pub fn new(category: Category, id: impl Into<String>) -> Self {
        Self {
            category,
            id: id.into(),
        }
    }

    /// `/<segment>/<id>`
    pub fn redirect_path(&self) -> String {
        format!("/{}/{}", self.category.path_segment(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_paths() {
        let cases = [
            (Category::Account, "/address/x"),
            (Category::Block, "/blocks/x"),
            (Category::Transaction, "/txs/x"),
            (Category::Activation, "/atxs/x"),
            (Category::Smesher, "/smeshers/x"),
            (Category::Reward, "/rewards/x"),
            (Category::Layer, "/layers/x"),
            (Category::Epoch, "/epochs/x"),
        ];
        for (category, path) in cases {
            assert_eq!(SearchTarget::new(category, "x").redirect_path(), path);
        }
    }
}
