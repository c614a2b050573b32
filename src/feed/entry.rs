use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;

use super::model::{Content, Entry, EventRecord, ATOMFEED_MEDIA_TYPE};

/// Convert one event record into a feed entry.
pub fn materialize(record: &EventRecord) -> Entry {
    Entry {
        id: record.tag_uri.clone(),
        title: record.title.clone(),
        published: record.timestamp,
        updated: record.timestamp,
        created: record.date_created.unwrap_or(record.timestamp),
        content: record.contents.as_deref().map(|contents| Content {
            media_type: ATOMFEED_MEDIA_TYPE,
            value: wrap_in_cdata(contents),
        }),
        categories: categories(record.tags.as_deref(), record.category.as_deref()),
    }
}

/// Timestamp of the newest record, or the start of today (UTC) for an empty page.
pub fn newest_date(records: &[EventRecord]) -> DateTime<Utc> {
    records
        .iter()
        .map(|r| r.timestamp)
        .max()
        .unwrap_or_else(start_of_today)
}

fn start_of_today() -> DateTime<Utc> {
    let now = Utc::now();
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(now)
}

fn wrap_in_cdata(contents: &str) -> String {
    format!("<![CDATA[{contents}]]>")
}

/// Union of the comma separated tags and the primary category.
///
/// Empty tag tokens and a blank category contribute nothing.
fn categories(tags: Option<&str>, category: Option<&str>) -> BTreeSet<String> {
    let mut set: BTreeSet<String> = tags
        .unwrap_or_default()
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(category) = category.filter(|c| !c.trim().is_empty()) {
        set.insert(category.to_string());
    }

    set
}
