use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use super::model::{Entry, Feed};
use crate::error::{FeedError, Result};

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Writes a [`Feed`] as an Atom 1.0 XML document.
///
/// Entry content arrives CDATA-wrapped from the entry builder and stays a
/// CDATA section, split wherever the payload itself contains `]]>`.
/// Everything else is escaped.
pub fn to_atom_xml(feed: &Feed) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("feed");
    root.push_attribute(("xmlns", ATOM_NAMESPACE));
    write(&mut writer, Event::Start(root))?;

    text_element(&mut writer, "title", feed.title())?;

    for link in feed.links() {
        let mut el = BytesStart::new("link");
        el.push_attribute(("rel", link.rel.as_str()));
        el.push_attribute(("type", link.media_type));
        el.push_attribute(("href", link.href.as_str()));
        write(&mut writer, Event::Empty(el))?;
    }

    for author in feed.authors() {
        write(&mut writer, Event::Start(BytesStart::new("author")))?;
        text_element(&mut writer, "name", &author.name)?;
        write(&mut writer, Event::End(BytesEnd::new("author")))?;
    }

    text_element(&mut writer, "id", feed.id())?;

    let generator = feed.generator();
    let mut el = BytesStart::new("generator");
    el.push_attribute(("uri", generator.uri.as_str()));
    write(&mut writer, Event::Start(el))?;
    write(&mut writer, Event::Text(BytesText::new(&generator.name)))?;
    write(&mut writer, Event::End(BytesEnd::new("generator")))?;

    date_element(&mut writer, "updated", feed.updated())?;

    for entry in feed.entries() {
        write_entry(&mut writer, entry)?;
    }

    write(&mut writer, Event::End(BytesEnd::new("feed")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| FeedError::Serialize(e.to_string()))
}

fn write_entry(writer: &mut XmlWriter, entry: &Entry) -> Result<()> {
    write(writer, Event::Start(BytesStart::new("entry")))?;

    text_element(writer, "title", &entry.title)?;

    for term in &entry.categories {
        let mut el = BytesStart::new("category");
        el.push_attribute(("term", term.as_str()));
        write(writer, Event::Empty(el))?;
    }

    text_element(writer, "id", &entry.id)?;
    date_element(writer, "updated", entry.updated)?;
    date_element(writer, "published", entry.published)?;
    date_element(writer, "created", entry.created)?;

    if let Some(content) = &entry.content {
        let mut el = BytesStart::new("content");
        el.push_attribute(("type", content.media_type));
        write(writer, Event::Start(el))?;
        let text = match cdata_body(&content.value) {
            Some(body) => BytesText::from_escaped(split_cdata(body)),
            None => BytesText::new(&content.value),
        };
        write(writer, Event::Text(text))?;
        write(writer, Event::End(BytesEnd::new("content")))?;
    }

    write(writer, Event::End(BytesEnd::new("entry")))
}

/// The text between `<![CDATA[` and the final `]]>`, if `value` is wrapped.
fn cdata_body(value: &str) -> Option<&str> {
    value.strip_prefix("<![CDATA[")?.strip_suffix("]]>")
}

/// Re-wrap `body` so an embedded `]]>` cannot close the section early.
fn split_cdata(body: &str) -> String {
    format!("<![CDATA[{}]]>", body.replace("]]>", "]]]]><![CDATA[>"))
}

fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(value)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn date_element(writer: &mut XmlWriter, name: &str, value: DateTime<Utc>) -> Result<()> {
    text_element(writer, name, &value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| FeedError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::model::{Content, Generator, Link, LinkRel, Person, ATOMFEED_MEDIA_TYPE};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn sample_feed(content: Option<&str>) -> Feed {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Feed::new(
            "+1".to_string(),
            "Events & more".to_string(),
            Generator {
                name: "Atomfeed".to_string(),
                uri: "https://github.com/ICT4H/atomfeed".to_string(),
            },
            vec![Person {
                name: "Atomfeed".to_string(),
            }],
            vec![Entry {
                id: "tag:atomfeed.ict4h.org:1".to_string(),
                title: "Patient".to_string(),
                published: ts,
                updated: ts,
                created: ts,
                content: content.map(|c| Content {
                    media_type: ATOMFEED_MEDIA_TYPE,
                    value: format!("<![CDATA[{c}]]>"),
                }),
                categories: BTreeSet::from(["patient".to_string()]),
            }],
            ts,
            vec![Link::new(LinkRel::SelfLink, "http://host/feed/recent?a=1&b=2")],
        )
    }

    #[test]
    fn test_document_structure() {
        let xml = to_atom_xml(&sample_feed(None)).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<feed xmlns=\"http://www.w3.org/2005/Atom\">"));
        assert!(xml.contains("<title>Events &amp; more</title>"));
        assert!(xml.contains("<generator uri=\"https://github.com/ICT4H/atomfeed\">Atomfeed</generator>"));
        assert!(xml.contains("<updated>2024-01-02T03:04:05Z</updated>"));
        assert!(xml.contains("<category term=\"patient\"/>"));
        assert!(xml.contains("<created>2024-01-02T03:04:05Z</created>"));
        assert!(xml.contains("href=\"http://host/feed/recent?a=1&amp;b=2\""));
        assert!(!xml.contains("<content"));
    }

    #[test]
    fn test_content_cdata_written_verbatim() {
        let xml = to_atom_xml(&sample_feed(Some("<patient id=\"1\"/>"))).unwrap();
        assert!(xml.contains("<content type=\"application/vnd.atomfeed+xml\">"));
        assert!(xml.contains("<![CDATA[<patient id=\"1\"/>]]>"));
    }

    #[test]
    fn test_cdata_terminator_in_content_split() {
        let xml = to_atom_xml(&sample_feed(Some("a]]><b/>"))).unwrap();
        assert!(xml.contains("<![CDATA[a]]]]><![CDATA[><b/>]]></content>"));
    }

    #[test]
    fn test_unwrapped_content_value_escaped() {
        let mut entry = sample_feed(None).entries()[0].clone();
        entry.content = Some(Content {
            media_type: ATOMFEED_MEDIA_TYPE,
            value: "<raw>".to_string(),
        });
        let feed = Feed::new(
            "+1".to_string(),
            "t".to_string(),
            Generator {
                name: "g".to_string(),
                uri: "u".to_string(),
            },
            Vec::new(),
            vec![entry],
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Vec::new(),
        );
        let xml = to_atom_xml(&feed).unwrap();
        assert!(xml.contains("&lt;raw&gt;"));
    }
}
