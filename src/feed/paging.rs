//! Archive navigation links and canonical page addresses.
//!
//! Archive pages live next to the requested resource: for a request to
//! `http://host/app/feed/recent`, page 3 is `http://host/app/feed/3`.
use url::Url;

use super::model::{Link, LinkRel};
use crate::error::{FeedError, Result};

/// `next-archive` / `prev-archive` links for `page_id` out of `page_count` pages.
///
/// Next is emitted before prev. A single-page category gets no links.
pub fn paging_links(request_uri: &str, page_id: u32, page_count: u32) -> Result<Vec<Link>> {
    let mut links = Vec::with_capacity(2);

    if page_id < page_count {
        links.push(Link::new(
            LinkRel::NextArchive,
            canonical_uri(request_uri, page_id + 1)?,
        ));
    }

    if page_id > 1 {
        links.push(Link::new(
            LinkRel::PrevArchive,
            canonical_uri(request_uri, page_id - 1)?,
        ));
    }

    Ok(links)
}

/// Stable address of page `page_id`.
pub fn canonical_uri(request_uri: &str, page_id: u32) -> Result<String> {
    Ok(format!("{}/{}", service_uri(request_uri)?, page_id))
}

/// The request URI without its last path segment, query, or fragment.
///
/// Port 80 is dropped; any other explicit port is kept. Port and path are
/// taken as written in the request, without normalization.
///
/// # Errors
///
/// [`FeedError::InvalidRequest`] if the URI does not parse, has no host,
/// or its path contains no `/`.
pub fn service_uri(request_uri: &str) -> Result<String> {
    let invalid = |reason: &str| FeedError::InvalidRequest(format!("{request_uri}: {reason}"));

    let url = Url::parse(request_uri).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let (authority, path) = split_authority(request_uri).ok_or_else(|| invalid("missing authority"))?;

    let parent = path
        .rfind('/')
        .map(|idx| &path[..idx])
        .ok_or_else(|| invalid("path has no '/'"))?;

    Ok(match explicit_port(authority) {
        Some(port) if port != 80 => format!("{}://{}:{}{}", url.scheme(), host, port, parent),
        _ => format!("{}://{}{}", url.scheme(), host, parent),
    })
}

/// Raw authority and path of `scheme://authority/path?query#fragment`.
fn split_authority(uri: &str) -> Option<(&str, &str)> {
    let (_, rest) = uri.split_once("://")?;
    let (authority, tail) = rest.split_at(rest.find(['/', '?', '#']).unwrap_or(rest.len()));
    let path = &tail[..tail.find(['?', '#']).unwrap_or(tail.len())];
    Some((authority, path))
}

/// Port written in the authority, if any.
fn explicit_port(authority: &str) -> Option<u16> {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let port = match host_port.strip_prefix('[') {
        Some(v6) => v6.split_once(']')?.1.strip_prefix(':')?,
        None => host_port.rsplit_once(':')?.1,
    };
    port.parse().ok()
}
