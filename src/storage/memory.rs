use std::collections::HashMap;

use crate::error::{FeedError, Result};
use crate::feed::{EventRecord, Page, PageResolver, RecentPage};

/// Page resolver over pages held in memory.
///
/// Pages are appended per category and numbered from 1. A category with no
/// pages still has an empty recent page 1, so its page count is never zero.
#[derive(Debug, Clone, Default)]
pub struct MemoryPageStore {
    pages: HashMap<String, Vec<Vec<EventRecord>>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page to `category`, returning its id.
    pub fn push_page(&mut self, category: &str, events: Vec<EventRecord>) -> u32 {
        let pages = self.pages.entry(category.to_string()).or_default();
        pages.push(events);
        u32::try_from(pages.len()).unwrap_or(u32::MAX)
    }

    pub fn page_count(&self, category: &str) -> u32 {
        self.pages
            .get(category)
            .map(|p| u32::try_from(p.len()).unwrap_or(u32::MAX))
            .unwrap_or(0)
            .max(1)
    }

    fn page(&self, page_id: u32, category: &str) -> Option<Page> {
        let pages = self.pages.get(category).map(Vec::as_slice).unwrap_or_default();
        match (page_id, pages.is_empty()) {
            (1, true) => Some(Page {
                id: 1,
                events: Vec::new(),
            }),
            (0, _) => None,
            (id, _) => pages.get(id as usize - 1).map(|events| Page {
                id,
                events: events.clone(),
            }),
        }
    }
}

impl PageResolver for MemoryPageStore {
    async fn resolve_recent(&self, category: &str) -> Result<RecentPage> {
        let id = self.page_count(category);
        self.page(id, category)
            .map(RecentPage::new)
            .ok_or_else(|| FeedError::not_found(id, category))
    }

    async fn resolve_page(&self, page_id: u32, category: &str) -> Result<Page> {
        self.page(page_id, category)
            .ok_or_else(|| FeedError::not_found(page_id, category))
    }
}
