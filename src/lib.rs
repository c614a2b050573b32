//! Paged Atom feeds over an append-only event log.
//!
//! Events are grouped into numbered pages per category. The newest page is
//! served as the "recent" feed; older pages are immutable archives linked
//! together with `next-archive` / `prev-archive` links (RFC 5005).
//!
//! ```ignore
//! use eventfeed::{FeedProperties, FeedService, MemoryPageStore};
//!
//! let service = FeedService::new(store, FeedProperties::default());
//! let feed = service.recent_feed("http://host/app/feed/recent", "patient").await?;
//! let xml = eventfeed::feed::to_atom_xml(&feed)?;
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod storage;

pub use config::{ConfigError, FeedProperties, FeedProperty};
pub use error::{FeedError, Result};
pub use feed::{FeedService, PageResolver};
pub use storage::{EventStore, MemoryPageStore};
