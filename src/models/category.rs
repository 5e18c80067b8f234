//! Category and area models.

use serde::{Deserialize, Serialize};

/// A subject category.
///
/// The quartile belongs to a (journal, category) pairing: the same category
/// id can appear with different quartiles on different journals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    id: String,
    quartile: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, quartile: Option<String>) -> Self {
        Self {
            id: id.into(),
            quartile,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ranking tier such as "Q1", if the source row carried one.
    pub fn quartile(&self) -> Option<&str> {
        self.quartile.as_deref()
    }
}

/// A subject area grouping categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    id: String,
}

impl Area {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}
