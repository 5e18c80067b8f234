//! Identity shared by every domain object.

use serde::Serialize;

use super::{Area, Category, Journal};

/// Something with a single opaque identifier.
pub trait Identifiable {
    fn id(&self) -> &str;

    /// All identifiers of the object, which is always exactly `[id]`.
    fn ids(&self) -> Vec<String> {
        vec![self.id().to_string()]
    }
}

impl Identifiable for Journal {
    fn id(&self) -> &str {
        Journal::id(self)
    }
}

impl Identifiable for Category {
    fn id(&self) -> &str {
        Category::id(self)
    }
}

impl Identifiable for Area {
    fn id(&self) -> &str {
        Area::id(self)
    }
}

/// The result of resolving an identifier of unknown kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Journal(Journal),
    Category(Category),
    Area(Area),
}

impl Entity {
    /// Returns the kind name: "journal", "category" or "area".
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Journal(_) => "journal",
            Entity::Category(_) => "category",
            Entity::Area(_) => "area",
        }
    }

    pub fn as_journal(&self) -> Option<&Journal> {
        match self {
            Entity::Journal(journal) => Some(journal),
            _ => None,
        }
    }

    pub fn into_journal(self) -> Option<Journal> {
        match self {
            Entity::Journal(journal) => Some(journal),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match self {
            Entity::Category(category) => Some(category),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<&Area> {
        match self {
            Entity::Area(area) => Some(area),
            _ => None,
        }
    }
}

impl Identifiable for Entity {
    fn id(&self) -> &str {
        match self {
            Entity::Journal(journal) => journal.id(),
            Entity::Category(category) => category.id(),
            Entity::Area(area) => area.id(),
        }
    }
}
