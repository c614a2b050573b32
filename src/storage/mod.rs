//! Page resolvers backing the feed service.
//!
//! - [`MemoryPageStore`] keeps pages in memory, for tests and embedding
//! - [`EventStore`] chunks an SQLite `event_records` table into fixed-size pages

mod events;
mod memory;

pub use events::EventStore;
pub use memory::MemoryPageStore;
