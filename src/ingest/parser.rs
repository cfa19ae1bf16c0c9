use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::errors::{NewsflowError, NewsflowResult};
use crate::ingest::sanitizer;

const MAX_SUMMARY_LENGTH: usize = 300;

/// A feed classified by structure, with its items still carrying raw
/// per-format fields.
#[derive(Debug)]
pub enum ParsedFeed {
    Rss(Vec<RssItem>),
    Atom(Vec<AtomEntry>),
    Empty,
}

#[derive(Debug, Default)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    pub content_encoded: Option<String>,
}

#[derive(Debug, Default)]
pub struct AtomEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub links: Vec<AtomLink>,
}

#[derive(Debug, Default)]
pub struct AtomLink {
    pub href: Option<String>,
    pub rel: Option<String>,
    pub text: String,
}

/// Format-independent view of one feed item, before enrichment.
#[derive(Debug, Default)]
pub struct RawArticle {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub raw_date: Option<String>,
}

impl ParsedFeed {
    pub fn into_articles(self) -> Vec<RawArticle> {
        match self {
            ParsedFeed::Rss(items) => items.into_iter().map(RssItem::into_article).collect(),
            ParsedFeed::Atom(entries) => entries.into_iter().map(AtomEntry::into_article).collect(),
            ParsedFeed::Empty => Vec::new(),
        }
    }
}

impl RssItem {
    fn into_article(self) -> RawArticle {
        RawArticle {
            title: self.title,
            link: self.link,
            summary: self.description.clone(),
            body: self.content_encoded.or(self.description),
            raw_date: self.pub_date,
        }
    }
}

impl AtomEntry {
    /// Atom entries may carry several links; the alternate link is the
    /// article page. Later alternates override earlier picks, and a link
    /// without an href falls back to its element text.
    fn resolve_link(&self) -> Option<String> {
        let mut resolved: Option<String> = None;
        for link in &self.links {
            let is_alternate = link.rel.as_deref() == Some("alternate");
            if resolved.is_none() || is_alternate {
                let href = link.href.as_deref().filter(|href| !href.is_empty());
                resolved = Some(match href {
                    Some(href) => href.to_string(),
                    None => link.text.clone(),
                });
            }
        }
        resolved
    }

    fn into_article(self) -> RawArticle {
        let link = self.resolve_link();
        RawArticle {
            title: self.title,
            link,
            summary: self.summary.clone(),
            body: self.content.or(self.summary),
            raw_date: self.published.or(self.updated),
        }
    }
}

/// Parse feed XML into a tagged result. RSS `<item>` elements win when
/// present, otherwise Atom `<entry>` elements (any namespace prefix);
/// neither yields `Empty`. Malformed XML fails the whole parse.
pub fn parse_feed(xml: &str) -> NewsflowResult<ParsedFeed> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut entries = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if start.name().as_ref() == b"item" {
                    items.push(read_rss_item(&mut reader)?);
                } else if start.local_name().as_ref() == b"entry" {
                    entries.push(read_atom_entry(&mut reader)?);
                }
            }
            Event::Empty(start) => {
                if start.name().as_ref() == b"item" {
                    items.push(RssItem::default());
                } else if start.local_name().as_ref() == b"entry" {
                    entries.push(AtomEntry::default());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !items.is_empty() {
        Ok(ParsedFeed::Rss(items))
    } else if !entries.is_empty() {
        Ok(ParsedFeed::Atom(entries))
    } else {
        Ok(ParsedFeed::Empty)
    }
}

fn read_rss_item(reader: &mut Reader<&[u8]>) -> NewsflowResult<RssItem> {
    let mut item = RssItem::default();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = start.name().as_ref().to_vec();
                let text = read_element_text(reader)?;
                match name.as_slice() {
                    b"title" => item.title = Some(text),
                    b"link" => item.link = Some(text),
                    b"description" => item.description = Some(text),
                    b"pubDate" => item.pub_date = Some(text),
                    b"content:encoded" => item.content_encoded = Some(text),
                    _ => {}
                }
            }
            Event::Empty(start) => match start.name().as_ref() {
                b"title" => item.title = Some(String::new()),
                b"link" => item.link = Some(String::new()),
                b"description" => item.description = Some(String::new()),
                b"pubDate" => item.pub_date = Some(String::new()),
                b"content:encoded" => item.content_encoded = Some(String::new()),
                _ => {}
            },
            Event::End(end) if end.name().as_ref() == b"item" => break,
            Event::Eof => {
                return Err(NewsflowError::FeedParse(
                    "unexpected end of document inside <item>".to_string(),
                ))
            }
            _ => {}
        }
    }
    Ok(item)
}

fn read_atom_entry(reader: &mut Reader<&[u8]>) -> NewsflowResult<AtomEntry> {
    let mut entry = AtomEntry::default();
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let local = start.local_name().as_ref().to_vec();
                let (href, rel) = if local == b"link" {
                    (attribute(&start, b"href"), attribute(&start, b"rel"))
                } else {
                    (None, None)
                };
                let text = read_element_text(reader)?;
                match local.as_slice() {
                    b"title" => entry.title = Some(text),
                    b"summary" => entry.summary = Some(text),
                    b"content" => entry.content = Some(text),
                    b"published" => entry.published = Some(text),
                    b"updated" => entry.updated = Some(text),
                    b"link" => entry.links.push(AtomLink { href, rel, text }),
                    _ => {}
                }
            }
            Event::Empty(start) => {
                let local = start.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"title" => entry.title = Some(String::new()),
                    b"summary" => entry.summary = Some(String::new()),
                    b"content" => entry.content = Some(String::new()),
                    b"published" => entry.published = Some(String::new()),
                    b"updated" => entry.updated = Some(String::new()),
                    b"link" => entry.links.push(AtomLink {
                        href: attribute(&start, b"href"),
                        rel: attribute(&start, b"rel"),
                        text: String::new(),
                    }),
                    _ => {}
                }
            }
            Event::End(end) if end.local_name().as_ref() == b"entry" => break,
            Event::Eof => {
                return Err(NewsflowError::FeedParse(
                    "unexpected end of document inside <entry>".to_string(),
                ))
            }
            _ => {}
        }
    }
    Ok(entry)
}

/// Collect the text content of the element just opened, consuming its
/// whole subtree. Nested markup contributes only its text.
pub(crate) fn read_element_text(reader: &mut Reader<&[u8]>) -> NewsflowResult<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Text(t) => text.push_str(&t.decode().unwrap_or_default()),
            Event::CData(data) => text.push_str(&String::from_utf8_lossy(&data.into_inner())),
            Event::GeneralRef(entity) => {
                if let Ok(Some(ch)) = entity.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match entity.into_inner().as_ref() {
                        b"amp" => text.push('&'),
                        b"lt" => text.push('<'),
                        b"gt" => text.push('>'),
                        b"quot" => text.push('"'),
                        b"apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Event::Eof => {
                return Err(NewsflowError::FeedParse(
                    "unexpected end of document inside element".to_string(),
                ))
            }
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

fn attribute(start: &BytesStart, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

/// Normalize a feed date to UTC: RFC-1123/2822 first, then ISO-8601;
/// anything unparseable (or absent) becomes the current time.
pub fn normalize_date(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Utc::now();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(trimmed) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return parsed.with_timezone(&Utc);
    }
    Utc::now()
}

/// Plain-text summary of article content, cut at the summary limit.
pub fn strip_to_summary(content: &str) -> String {
    let text = sanitizer::plain_text(content);
    if text.chars().count() <= MAX_SUMMARY_LENGTH {
        return text;
    }
    let cut: String = text.chars().take(MAX_SUMMARY_LENGTH - 3).collect();
    format!("{}...", cut)
}

static IMAGE_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)src="(https?://[^"]+\.(?:jpg|jpeg|png|gif|webp|svg)[^"]*)""#)
        .expect("valid regex")
});

static ANY_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src="(https?://[^"]+)""#).expect("valid regex"));

/// First absolute image URL in the content: prefer srcs with an image
/// extension, fall back to any absolute src.
pub fn extract_image(content: &str) -> Option<String> {
    IMAGE_SRC_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            ANY_SRC_RE
                .captures(content)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <item>
      <title>Post Title</title>
      <link>https://example.com/post-1</link>
      <description>This is a summary</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test</title>
  <entry>
    <title>Entry One</title>
    <link rel="self" href="https://example.com/feed/1"/>
    <link rel="alternate" href="https://example.com/entry-1"/>
    <summary>Entry summary</summary>
    <updated>2024-02-02T08:30:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_fields() {
        let parsed = parse_feed(SAMPLE_RSS).unwrap();
        let ParsedFeed::Rss(items) = parsed else {
            panic!("expected RSS");
        };
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title.as_deref(), Some("Post Title"));
        assert_eq!(item.link.as_deref(), Some("https://example.com/post-1"));
        assert_eq!(item.description.as_deref(), Some("This is a summary"));
        assert_eq!(item.pub_date.as_deref(), Some("Mon, 01 Jan 2024 12:00:00 GMT"));
        assert_eq!(item.content_encoded, None);
    }

    #[test]
    fn test_parse_rss_content_encoded_cdata() {
        let xml = r#"<rss><channel><item>
            <title>T</title>
            <link>https://example.com/a</link>
            <description>short</description>
            <content:encoded><![CDATA[<p>Full <b>body</b></p>]]></content:encoded>
        </item></channel></rss>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].body.as_deref(), Some("<p>Full <b>body</b></p>"));
        assert_eq!(articles[0].summary.as_deref(), Some("short"));
    }

    #[test]
    fn test_parse_rss_entities_unescaped() {
        let xml = r#"<rss><channel><item>
            <title>Bits &amp; Pieces &#8212; weekly</title>
            <link>https://example.com/b</link>
        </item></channel></rss>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(
            articles[0].title.as_deref(),
            Some("Bits & Pieces \u{2014} weekly")
        );
    }

    #[test]
    fn test_parse_rss_empty_description_kept() {
        let xml = r#"<rss><channel><item>
            <title>T</title>
            <link>https://example.com/c</link>
            <description/>
        </item></channel></rss>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles[0].summary.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_rss_item_without_link() {
        let xml = "<rss><channel><item><title>No link</title></item></channel></rss>";
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, None);
    }

    #[test]
    fn test_parse_atom_alternate_link_wins() {
        let parsed = parse_feed(SAMPLE_ATOM).unwrap();
        let ParsedFeed::Atom(entries) = parsed else {
            panic!("expected Atom");
        };
        let article = entries.into_iter().next().unwrap().into_article();
        assert_eq!(article.link.as_deref(), Some("https://example.com/entry-1"));
        assert_eq!(article.summary.as_deref(), Some("Entry summary"));
        assert_eq!(article.raw_date.as_deref(), Some("2024-02-02T08:30:00Z"));
    }

    #[test]
    fn test_parse_atom_first_link_without_rel() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><entry>
            <title>E</title>
            <link href="https://example.com/plain"/>
        </entry></feed>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles[0].link.as_deref(), Some("https://example.com/plain"));
    }

    #[test]
    fn test_parse_atom_empty_href_falls_back_to_text() {
        let xml = r#"<feed><entry>
            <title>E</title>
            <link rel="alternate" href="">https://example.com/from-text</link>
        </entry></feed>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(
            articles[0].link.as_deref(),
            Some("https://example.com/from-text")
        );
    }

    #[test]
    fn test_parse_atom_content_falls_back_to_summary() {
        let xml = r#"<feed><entry>
            <title>E</title>
            <link href="https://example.com/e"/>
            <summary>only summary</summary>
        </entry></feed>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles[0].body.as_deref(), Some("only summary"));
    }

    #[test]
    fn test_parse_atom_updated_when_no_published() {
        let xml = r#"<feed><entry>
            <title>E</title>
            <link href="https://example.com/e"/>
            <updated>2024-03-03T00:00:00Z</updated>
        </entry></feed>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles[0].raw_date.as_deref(), Some("2024-03-03T00:00:00Z"));
    }

    #[test]
    fn test_parse_prefixed_atom_entries() {
        let xml = r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom">
            <atom:entry>
                <atom:title>Prefixed</atom:title>
                <atom:link href="https://example.com/p"/>
            </atom:entry>
        </atom:feed>"#;
        let articles = parse_feed(xml).unwrap().into_articles();
        assert_eq!(articles[0].title.as_deref(), Some("Prefixed"));
        assert_eq!(articles[0].link.as_deref(), Some("https://example.com/p"));
    }

    #[test]
    fn test_parse_neither_format_yields_empty() {
        let parsed = parse_feed("<html><body>not a feed</body></html>").unwrap();
        assert!(matches!(parsed, ParsedFeed::Empty));
        assert!(parse_feed("<data><row>1</row></data>")
            .unwrap()
            .into_articles()
            .is_empty());
    }

    #[test]
    fn test_parse_malformed_xml_fails() {
        assert!(parse_feed("<rss><channel><item><title>Broken").is_err());
        assert!(parse_feed("<rss><channel><item></wrong></item></channel></rss>").is_err());
    }

    #[test]
    fn test_normalize_date_rfc1123() {
        let parsed = normalize_date(Some("Mon, 01 Jan 2024 12:00:00 GMT"));
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T12:00:00+00:00");
    }

    #[test]
    fn test_normalize_date_iso_instant() {
        let parsed = normalize_date(Some("2024-01-01T12:00:00Z"));
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T12:00:00+00:00");
    }

    #[test]
    fn test_normalize_date_iso_offset_converted_to_utc() {
        let parsed = normalize_date(Some("2024-01-01T12:00:00+02:00"));
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn test_normalize_date_fallbacks_to_now() {
        let before = Utc::now();
        for raw in [None, Some(""), Some("   "), Some("not a date")] {
            let parsed = normalize_date(raw);
            assert!(parsed >= before);
        }
    }

    #[test]
    fn test_strip_to_summary_short_text_kept() {
        assert_eq!(
            strip_to_summary("<p>A <b>short</b> summary</p>"),
            "A short summary"
        );
    }

    #[test]
    fn test_strip_to_summary_truncates_long_text() {
        let long = "word ".repeat(100);
        let summary = strip_to_summary(&long);
        assert_eq!(summary.chars().count(), 300);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_extract_image_prefers_image_extensions() {
        let content = r#"<iframe src="https://player.example.com/v"></iframe>
            <img src="https://cdn.example.com/photo.JPG?w=800">"#;
        assert_eq!(
            extract_image(content).as_deref(),
            Some("https://cdn.example.com/photo.JPG?w=800")
        );
    }

    #[test]
    fn test_extract_image_falls_back_to_any_src() {
        let content = r#"<img src="https://cdn.example.com/image-no-ext">"#;
        assert_eq!(
            extract_image(content).as_deref(),
            Some("https://cdn.example.com/image-no-ext")
        );
    }

    #[test]
    fn test_extract_image_ignores_relative_srcs() {
        assert_eq!(extract_image(r#"<img src="/local/pic.png">"#), None);
        assert_eq!(extract_image("no images at all"), None);
    }
}
