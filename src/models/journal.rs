//! Journal model.

use serde::{Deserialize, Serialize};

use super::{Area, Category};

/// A journal with its descriptive metadata and classification.
///
/// Descriptive fields come from a journal store; `categories` and `areas`
/// are attached from the category stores. Built once per query and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    id: String,
    title: String,
    languages: Vec<String>,
    publisher: Option<String>,
    seal: bool,
    licence: Option<String>,
    apc: bool,
    categories: Vec<Category>,
    areas: Vec<Area>,
}

impl Journal {
    /// Starts a journal with no optional metadata and no classification.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            languages: Vec::new(),
            publisher: None,
            seal: false,
            licence: None,
            apc: false,
            categories: Vec::new(),
            areas: Vec::new(),
        }
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_publisher(mut self, publisher: Option<String>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_seal(mut self, seal: bool) -> Self {
        self.seal = seal;
        self
    }

    pub fn with_licence(mut self, licence: Option<String>) -> Self {
        self.licence = licence;
        self
    }

    pub fn with_apc(mut self, apc: bool) -> Self {
        self.apc = apc;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_areas(mut self, areas: Vec<Area>) -> Self {
        self.areas = areas;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Accepted languages, in the order the store returned them.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    /// Whether the journal holds the DOAJ seal.
    pub fn seal(&self) -> bool {
        self.seal
    }

    pub fn licence(&self) -> Option<&str> {
        self.licence.as_deref()
    }

    /// Whether the journal charges an article-processing charge.
    pub fn apc(&self) -> bool {
        self.apc
    }

    /// Categories with the quartile of this journal's pairing with each.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let journal = Journal::new("1234-5678", "Journal of Tests");
        assert_eq!(journal.id(), "1234-5678");
        assert!(journal.languages().is_empty());
        assert!(journal.publisher().is_none());
        assert!(!journal.seal());
        assert!(!journal.apc());
        assert!(journal.categories().is_empty());
    }

    #[test]
    fn test_serializes_classification() {
        let journal = Journal::new("1234-5678", "Journal of Tests")
            .with_categories(vec![Category::new("COMP", Some("Q1".to_string()))])
            .with_areas(vec![Area::new("1700")]);

        let json = serde_json::to_value(&journal).unwrap();
        assert_eq!(json["categories"][0]["id"], "COMP");
        assert_eq!(json["categories"][0]["quartile"], "Q1");
        assert_eq!(json["areas"][0]["id"], "1700");
    }
}
