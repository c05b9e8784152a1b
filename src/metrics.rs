use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetrics {
    pub page_number: usize,
    /// Name of the page rule that drew this page.
    pub section: String,
    pub command_count: usize,
    pub content_bytes: usize,
}

/// Pages contributed by one page rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionMetrics {
    pub name: String,
    /// 1-based number of the section's first page.
    pub first_page: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckMetrics {
    pub sections: Vec<SectionMetrics>,
    pub pages: Vec<PageMetrics>,
    pub page_count: usize,
    pub command_count: usize,
    pub total_bytes: usize,
}

impl DeckMetrics {
    pub fn section(&self, name: &str) -> Option<&SectionMetrics> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }
}
