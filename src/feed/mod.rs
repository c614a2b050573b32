//! Feed assembly for paged event logs.
//!
//! - [`model`] - Input records and the immutable feed model
//! - [`entry`] - Event record to feed entry conversion
//! - [`paging`] - Archive navigation links and canonical page addresses
//! - [`service`] - Recent and archive feed assembly over a [`PageResolver`]
//! - [`atom`] - Atom 1.0 serialization of an assembled feed

mod atom;
pub mod entry;
pub mod model;
pub mod paging;
mod service;

pub use atom::to_atom_xml;
pub use model::{
    Content, Entry, EventRecord, Feed, Generator, Link, LinkRel, Page, Person, RecentPage,
    ATOMFEED_MEDIA_TYPE, ATOM_MEDIA_TYPE,
};
pub use service::{FeedService, PageResolver};
