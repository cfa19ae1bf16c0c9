use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};
use scraper::Html;
use url::Url;

/// Tags allowed in stored article content: the usual formatting and table
/// tags plus the media embeds feeds actually ship.
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "caption", "cite", "code", "col", "colgroup", "dd", "div", "dl",
    "dt", "em", "h1", "h2", "h3", "h4", "h5", "h6", "i", "img", "li", "ol", "p", "pre", "q",
    "small", "span", "strike", "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "u", "ul", "figure", "figcaption", "picture", "source", "video", "audio",
    "iframe",
];

fn allowed_attributes() -> HashMap<&'static str, HashSet<&'static str>> {
    let mut attrs: HashMap<&str, HashSet<&str>> = HashMap::new();
    attrs.insert("a", ["href", "title", "target", "rel"].into());
    attrs.insert("blockquote", ["cite"].into());
    attrs.insert("col", ["span", "width"].into());
    attrs.insert("colgroup", ["span", "width"].into());
    attrs.insert(
        "img",
        ["src", "alt", "title", "width", "height", "loading"].into(),
    );
    attrs.insert("ol", ["start", "type"].into());
    attrs.insert("q", ["cite"].into());
    attrs.insert("table", ["summary", "width"].into());
    attrs.insert("td", ["abbr", "axis", "colspan", "rowspan", "width"].into());
    attrs.insert(
        "th",
        ["abbr", "axis", "colspan", "rowspan", "scope", "width"].into(),
    );
    attrs.insert("ul", ["type"].into());
    attrs.insert(
        "iframe",
        ["src", "width", "height", "frameborder", "allowfullscreen", "allow"].into(),
    );
    attrs.insert("video", ["src", "poster", "controls", "width", "height"].into());
    attrs.insert("audio", ["src", "controls"].into());
    attrs.insert("source", ["src", "type"].into());
    attrs
}

/// Filter untrusted HTML down to the allowlist, resolving relative URLs
/// against `base_url`. An unparseable base drops relative URLs instead.
pub fn clean(html: &str, base_url: &str) -> String {
    let mut builder = Builder::new();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .tag_attributes(allowed_attributes())
        .generic_attributes(HashSet::new())
        .url_schemes(["http", "https", "mailto", "data"].into())
        // mailto is for anchors only, data URLs are for images only
        .attribute_filter(|element, attribute, value| {
            let scheme_of = |v: &str| v.trim_start().to_ascii_lowercase();
            if element == "img" && attribute == "src" && scheme_of(value).starts_with("mailto:") {
                return None;
            }
            if element == "a" && attribute == "href" && scheme_of(value).starts_with("data:") {
                return None;
            }
            Some(Cow::Borrowed(value))
        })
        .link_rel(None);

    match Url::parse(base_url) {
        Ok(base) => builder.url_relative(UrlRelative::RewriteWithBase(base)),
        Err(_) => builder.url_relative(UrlRelative::Deny),
    };

    builder.clean(html).to_string()
}

/// Collapse an HTML fragment to whitespace-normalized plain text.
pub fn plain_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            text.push_str(text_node);
        }
        // Add space after block elements to preserve word boundaries
        if let Some(element) = node.value().as_element() {
            match element.name() {
                "p" | "br" | "div" | "li" => text.push(' '),
                _ => {}
            }
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
