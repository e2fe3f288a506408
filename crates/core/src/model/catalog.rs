use crate::model::ids::TestId;

/// A selectable test on the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: TestId,
    pub title: String,
    pub enabled: bool,
}

/// Display titles and availability of the known tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCatalog {
    entries: Vec<CatalogEntry>,
}

const FALLBACK_TITLE: &str = "NACC Test Title";

impl TestCatalog {
    #[must_use]
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Mock tests 1-8, of which the first four are open.
    #[must_use]
    pub fn nacc_default() -> Self {
        let entries = (1..=8)
            .map(|n| CatalogEntry {
                id: TestId::new(format!("test{n}")),
                title: format!("NACC Mock Test {n}"),
                enabled: n <= 4,
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn enabled(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.enabled)
    }

    #[must_use]
    pub fn get(&self, id: &TestId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn is_selectable(&self, id: &TestId) -> bool {
        self.get(id).is_some_and(|e| e.enabled)
    }

    /// Title for `id`, or a generic title for tests outside the catalog.
    #[must_use]
    pub fn title(&self, id: &TestId) -> &str {
        self.get(id).map_or(FALLBACK_TITLE, |e| e.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_opens_first_four() {
        let catalog = TestCatalog::nacc_default();
        assert_eq!(catalog.entries().len(), 8);
        assert_eq!(catalog.enabled().count(), 4);
        assert!(catalog.is_selectable(&TestId::new("test4")));
        assert!(!catalog.is_selectable(&TestId::new("test5")));
        assert!(!catalog.is_selectable(&TestId::new("test99")));
    }

    #[test]
    fn unknown_tests_get_fallback_title() {
        let catalog = TestCatalog::nacc_default();
        assert_eq!(catalog.title(&TestId::new("test2")), "NACC Mock Test 2");
        assert_eq!(catalog.title(&TestId::new("test12")), "NACC Test Title");
    }
}
