use exam_core::model::{TestCatalog, TestId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntryVm {
    pub number: usize,
    pub id: TestId,
    pub title: String,
    pub enabled: bool,
}

#[must_use]
pub fn map_menu(catalog: &TestCatalog) -> Vec<MenuEntryVm> {
    catalog
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| MenuEntryVm {
            number: i + 1,
            id: entry.id.clone(),
            title: entry.title.clone(),
            enabled: entry.enabled,
        })
        .collect()
}
