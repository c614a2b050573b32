use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Media type of navigation links.
pub const ATOM_MEDIA_TYPE: &str = "application/atom+xml";

/// Media type of entry content carrying an event payload.
pub const ATOMFEED_MEDIA_TYPE: &str = "application/vnd.atomfeed+xml";

/// Document flavour produced by the serializer.
pub const FEED_TYPE: &str = "atom_1.0";

// ============================================================================
// Input Types
// ============================================================================

/// A single event as read from the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Tag URI, unique and stable across pages.
    pub tag_uri: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub date_created: Option<DateTime<Utc>>,
    pub category: Option<String>,
    /// Comma separated tag list.
    pub tags: Option<String>,
    pub contents: Option<String>,
}

/// A numbered page of events for one category. Higher ids are newer.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: u32,
    pub events: Vec<EventRecord>,
}

/// The newest page of a category together with the page count it implies.
///
/// `page_count` always equals `page.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPage {
    pub page: Page,
    pub page_count: u32,
}

impl RecentPage {
    pub fn new(page: Page) -> Self {
        let page_count = page.id;
        Self { page, page_count }
    }
}

// ============================================================================
// Output Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRel {
    SelfLink,
    Via,
    NextArchive,
    PrevArchive,
}

impl LinkRel {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkRel::SelfLink => "self",
            LinkRel::Via => "via",
            LinkRel::NextArchive => "next-archive",
            LinkRel::PrevArchive => "prev-archive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub rel: LinkRel,
    pub href: String,
    pub media_type: &'static str,
}

impl Link {
    pub fn new(rel: LinkRel, href: impl Into<String>) -> Self {
        Self {
            rel,
            href: href.into(),
            media_type: ATOM_MEDIA_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
}

/// Entry content block. `value` is already CDATA-wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub media_type: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub content: Option<Content>,
    pub categories: BTreeSet<String>,
}

/// A fully assembled feed, ready for serialization.
///
/// Constructed in one step by [`Feed::new`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    id: String,
    title: String,
    generator: Generator,
    authors: Vec<Person>,
    entries: Vec<Entry>,
    updated: DateTime<Utc>,
    links: Vec<Link>,
}

impl Feed {
    pub fn new(
        id: String,
        title: String,
        generator: Generator,
        authors: Vec<Person>,
        entries: Vec<Entry>,
        updated: DateTime<Utc>,
        links: Vec<Link>,
    ) -> Self {
        Self {
            id,
            title,
            generator,
            authors,
            entries,
            updated,
            links,
        }
    }

    pub fn feed_type(&self) -> &'static str {
        FEED_TYPE
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn authors(&self) -> &[Person] {
        &self.authors
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// First link with the given relation.
    pub fn link(&self, rel: LinkRel) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }
}
