use std::future::Future;
use std::sync::Arc;

use super::entry::{materialize, newest_date};
use super::model::{Feed, Generator, Link, LinkRel, Page, Person, RecentPage};
use super::paging::{canonical_uri, paging_links};
use crate::config::{FeedProperties, FeedProperty};
use crate::error::{FeedError, Result};

/// Source of numbered event pages for a category.
///
/// Implementations must be safe to call from concurrent requests.
pub trait PageResolver: Send + Sync {
    /// The newest page of `category`. Its id is the category's page count.
    fn resolve_recent(&self, category: &str) -> impl Future<Output = Result<RecentPage>> + Send;

    /// Page `page_id` of `category`, or [`FeedError::NotFound`].
    fn resolve_page(&self, page_id: u32, category: &str)
        -> impl Future<Output = Result<Page>> + Send;
}

/// Assembles recent and archive feeds from a [`PageResolver`].
///
/// Stateless per request; the properties are shared and never change after
/// construction.
pub struct FeedService<R> {
    resolver: R,
    properties: Arc<FeedProperties>,
}

impl<R: PageResolver> FeedService<R> {
    pub fn new(resolver: R, properties: impl Into<Arc<FeedProperties>>) -> Self {
        Self {
            resolver,
            properties: properties.into(),
        }
    }

    /// The live page of `category`.
    ///
    /// `via` points at the page's canonical archive address. The page count
    /// returned with the recent page drives both the body and the paging
    /// links, so a concurrent append cannot make them disagree.
    pub async fn recent_feed(&self, request_uri: &str, category: &str) -> Result<Feed> {
        let RecentPage { page, page_count } = self.resolver.resolve_recent(category).await?;
        tracing::debug!(category = %category, page_id = page.id, events = page.events.len(), "Resolved recent page");

        let mut links = vec![
            Link::new(LinkRel::SelfLink, request_uri),
            Link::new(LinkRel::Via, canonical_uri(request_uri, page.id)?),
        ];
        links.extend(paging_links(request_uri, page.id, page_count)?);

        Ok(self.build(&page, links))
    }

    /// Archive page `page_id` of `category`.
    ///
    /// `via` repeats the request URI. Paging links use the page count read
    /// after the page itself was resolved.
    ///
    /// # Errors
    ///
    /// [`FeedError::NotFound`] if the page does not exist, including ids
    /// outside `1..=page_count`.
    pub async fn archive_feed(&self, request_uri: &str, category: &str, page_id: u32) -> Result<Feed> {
        if page_id == 0 {
            return Err(FeedError::not_found(page_id, category));
        }

        let page = self.resolver.resolve_page(page_id, category).await?;
        let page_count = self.resolver.resolve_recent(category).await?.page_count;
        if page_id > page_count {
            tracing::warn!(category = %category, page_id, page_count, "Resolver returned page beyond page count");
            return Err(FeedError::not_found(page_id, category));
        }
        tracing::debug!(category = %category, page_id, page_count, events = page.events.len(), "Resolved archive page");

        let mut links = vec![
            Link::new(LinkRel::SelfLink, request_uri),
            Link::new(LinkRel::Via, request_uri),
        ];
        links.extend(paging_links(request_uri, page_id, page_count)?);

        Ok(self.build(&page, links))
    }

    fn build(&self, page: &Page, links: Vec<Link>) -> Feed {
        let props = &self.properties;
        Feed::new(
            format!("{}+{}", props.get(FeedProperty::IdPrefix), page.id),
            props.get(FeedProperty::Title).to_string(),
            Generator {
                name: props.get(FeedProperty::GeneratorTitle).to_string(),
                uri: props.get(FeedProperty::GeneratorUri).to_string(),
            },
            vec![Person {
                name: props.get(FeedProperty::Author).to_string(),
            }],
            page.events.iter().map(materialize).collect(),
            newest_date(&page.events),
            links,
        )
    }
}
