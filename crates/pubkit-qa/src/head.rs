//! Head tag extraction
//!
//! Targeted regex scan over the document head; enough for server-rendered
//! pages without pulling in an HTML parser.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<html\b([^>]*)>").expect("html tag regex"));
static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title regex"));
static VOID_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<(meta|link)\b([^>]*)>").expect("meta/link regex"));
static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#).expect("attribute regex")
});

/// Head tags the QA suite checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadTags {
    /// `<html lang>`
    pub lang: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub robots: Option<String>,
    /// hreflang → href, in document order
    pub alternates: IndexMap<String, String>,
}

impl HeadTags {
    /// Extract from a full HTML document
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let head = head_section(html);
        let mut tags = Self {
            lang: HTML_TAG
                .captures(html)
                .and_then(|c| attributes(&c[1]).remove("lang"))
                .filter(|l| !l.is_empty()),
            title: TITLE
                .captures(head)
                .map(|c| decode_entities(c[1].trim()))
                .filter(|t| !t.is_empty()),
            ..Self::default()
        };

        for cap in VOID_TAG.captures_iter(head) {
            let mut attrs = attributes(&cap[2]);
            match cap[1].to_ascii_lowercase().as_str() {
                "meta" => {
                    let Some(name) = attrs.remove("name") else { continue };
                    let content = attrs.remove("content");
                    match name.to_ascii_lowercase().as_str() {
                        "description" if tags.description.is_none() => tags.description = content,
                        "robots" if tags.robots.is_none() => tags.robots = content,
                        _ => {}
                    }
                }
                _ => {
                    let rel = attrs.remove("rel").unwrap_or_default().to_ascii_lowercase();
                    let Some(href) = attrs.remove("href") else { continue };
                    if rel.split_whitespace().any(|r| r == "canonical") {
                        tags.canonical.get_or_insert(href);
                    } else if rel.split_whitespace().any(|r| r == "alternate") {
                        if let Some(hreflang) = attrs.remove("hreflang") {
                            tags.alternates.entry(hreflang).or_insert(href);
                        }
                    }
                }
            }
        }
        tags
    }
}

fn head_section(html: &str) -> &str {
    let lower = html.to_ascii_lowercase();
    match lower.find("</head") {
        Some(end) => &html[..end],
        None => html,
    }
}

/// Attribute names lowercased, values entity-decoded
fn attributes(raw: &str) -> HashMap<String, String> {
    ATTR.captures_iter(raw)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4)).map_or("", |m| m.as_str());
            (c[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
