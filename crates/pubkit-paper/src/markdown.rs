//! Markdown paper source parser
//!
//! Uses pulldown-cmark to walk a paper written in Markdown and pull out the
//! pieces the metrics, bundle and readiness code care about: title, abstract,
//! keywords, headings, code blocks, tables and image references.

use crate::error::PaperError;
use once_cell::sync::Lazy;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser as MdParser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static KEYWORDS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*[*_]*(?:keywords|index terms)[*_]*\s*[:\u{2014}-]\s*[*_]*\s*(.+?)\s*$")
        .expect("keywords regex")
});

/// Heading found in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text
    pub title: String,
}

/// Fenced or indented code block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// First word of the info string (e.g. "rust", "mermaid")
    pub language: Option<String>,
    /// Code content
    pub code: String,
}

impl CodeBlock {
    /// Whether this block is a Mermaid diagram
    #[inline]
    #[must_use]
    pub fn is_mermaid(&self) -> bool {
        self.language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("mermaid"))
    }
}

/// Image reference (`![alt](path)`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Alt text
    pub alt: String,
    /// Destination as written in the source
    pub path: String,
}

impl ImageRef {
    /// Whether the destination points at a remote resource
    #[must_use]
    pub fn is_remote(&self) -> bool {
        let lower = self.path.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
    }
}

/// Parsed Markdown paper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperSource {
    /// Title from frontmatter or the first H1
    pub title: Option<String>,
    /// Abstract text (frontmatter `abstract` or the "Abstract" section)
    pub abstract_text: Option<String>,
    /// Keywords in source order
    pub keywords: Vec<String>,
    /// Headings in document order
    pub sections: Vec<Heading>,
    /// Code blocks in document order
    pub code_blocks: Vec<CodeBlock>,
    /// Number of tables
    pub tables: usize,
    /// Image references in document order
    pub images: Vec<ImageRef>,
    /// Prose text: everything outside code blocks, tables and frontmatter
    pub prose: String,
    /// Frontmatter metadata (if any)
    pub frontmatter: Option<serde_yaml::Value>,
}

impl PaperSource {
    /// Read and parse a Markdown file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PaperError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PaperError::io_error(path, e))?;
        Self::parse(&content)
    }

    /// Parse Markdown content
    pub fn parse(content: &str) -> Result<Self, PaperError> {
        let (frontmatter, body) = split_frontmatter(content)?;
        let mut source = walk(body);

        if let Some(meta) = &frontmatter {
            if let Some(title) = meta.get("title").and_then(serde_yaml::Value::as_str) {
                source.title = Some(title.trim().to_string());
            }
            if let Some(text) = meta.get("abstract").and_then(serde_yaml::Value::as_str) {
                source.abstract_text = Some(text.trim().to_string());
            }
            if let Some(keywords) = meta.get("keywords") {
                let from_meta = keywords_from_yaml(keywords);
                if !from_meta.is_empty() {
                    source.keywords = from_meta;
                }
            }
        }

        if source.keywords.is_empty() {
            source.keywords = keywords_from_body(body);
        }

        source.frontmatter = frontmatter;
        Ok(source)
    }

    /// Mermaid diagrams in the document
    pub fn mermaid_blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.code_blocks.iter().filter(|b| b.is_mermaid())
    }
}

/// Split a leading `---` YAML block off the document
fn split_frontmatter(content: &str) -> Result<(Option<serde_yaml::Value>, &str), PaperError> {
    let trimmed = content.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return Ok((None, content));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if matches!(line.trim_end(), "---" | "...") {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
            return Ok((Some(value), body));
        }
        offset += line.len();
    }
    Err(PaperError::UnterminatedFrontmatter)
}

fn keywords_from_yaml(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .filter_map(serde_yaml::Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        serde_yaml::Value::String(s) => split_keywords(s),
        _ => Vec::new(),
    }
}

fn keywords_from_body(body: &str) -> Vec<String> {
    KEYWORDS_LINE
        .captures(body)
        .map(|c| split_keywords(&c[1]))
        .unwrap_or_default()
}

fn split_keywords(line: &str) -> Vec<String> {
    line.split([',', ';'])
        .map(|k| k.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '.')))
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn walk(body: &str) -> PaperSource {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut source = PaperSource::default();
    let mut code: Option<(Option<String>, String)> = None;
    let mut heading: Option<(u8, String)> = None;
    let mut image: Option<(String, String)> = None;
    let mut table_depth = 0usize;
    // (level of the Abstract heading, collected text)
    let mut abstract_section: Option<(u8, String)> = None;
    let mut abstract_done = false;

    for event in MdParser::new_ext(body, options) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((level as u8, String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = heading.take() {
                    let title = title.trim().to_string();
                    if source.title.is_none() && level == 1 {
                        source.title = Some(title.clone());
                    }
                    if let Some((abstract_level, _)) = &abstract_section {
                        if level <= *abstract_level {
                            abstract_done = true;
                        }
                    }
                    if !abstract_done
                        && abstract_section.is_none()
                        && title.eq_ignore_ascii_case("abstract")
                    {
                        abstract_section = Some((level, String::new()));
                    }
                    source.prose.push_str(&title);
                    source.prose.push('\n');
                    source.sections.push(Heading { level, title });
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, code)) = code.take() {
                    source.code_blocks.push(CodeBlock { language, code });
                }
            }
            Event::Start(Tag::Table(_)) => {
                table_depth += 1;
                source.tables += 1;
            }
            Event::End(TagEnd::Table) => {
                table_depth = table_depth.saturating_sub(1);
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                image = Some((dest_url.to_string(), String::new()));
            }
            Event::End(TagEnd::Image) => {
                if let Some((path, alt)) = image.take() {
                    source.images.push(ImageRef { alt, path });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buf)) = code.as_mut() {
                    buf.push_str(&text);
                } else if let Some((_, alt)) = image.as_mut() {
                    alt.push_str(&text);
                } else if let Some((_, title)) = heading.as_mut() {
                    title.push_str(&text);
                } else if table_depth == 0 {
                    source.prose.push_str(&text);
                    if let Some((_, buf)) = abstract_section.as_mut() {
                        if !abstract_done {
                            buf.push_str(&text);
                        }
                    }
                }
            }
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::BlockQuote(_)) => {
                if code.is_none() && table_depth == 0 {
                    source.prose.push('\n');
                    if let Some((_, buf)) = abstract_section.as_mut() {
                        if !abstract_done {
                            buf.push('\n');
                        }
                    }
                }
            }
            _ => {}
        }
    }

    source.abstract_text = abstract_section
        .map(|(_, text)| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_sections_and_code() {
        let content = r#"# Event Sourcing at Scale

## Abstract

This paper presents a log-structured design.

## 1. Introduction

Body text.

```mermaid
graph TD; A-->B;
```

```rust
fn main() {}
```
"#;
        let source = PaperSource::parse(content).unwrap();
        assert_eq!(source.title.as_deref(), Some("Event Sourcing at Scale"));
        assert_eq!(source.sections.len(), 3);
        assert_eq!(source.code_blocks.len(), 2);
        assert_eq!(source.mermaid_blocks().count(), 1);
        assert_eq!(
            source.abstract_text.as_deref(),
            Some("This paper presents a log-structured design.")
        );
    }

    #[test]
    fn frontmatter_overrides_title_and_keywords() {
        let content = "---\ntitle: From Meta\nkeywords: [caching, consistency]\n---\n# Heading Title\n\nKeywords: ignored, also ignored\n";
        let source = PaperSource::parse(content).unwrap();
        assert_eq!(source.title.as_deref(), Some("From Meta"));
        assert_eq!(source.keywords, vec!["caching", "consistency"]);
        assert!(source.frontmatter.is_some());
    }

    #[test]
    fn keywords_line_variants() {
        let plain = PaperSource::parse("Keywords: a, b; c\n").unwrap();
        assert_eq!(plain.keywords, vec!["a", "b", "c"]);

        let bold = PaperSource::parse("**Keywords:** distributed systems, CRDTs.\n").unwrap();
        assert_eq!(bold.keywords, vec!["distributed systems", "CRDTs"]);
    }

    #[test]
    fn unterminated_frontmatter_is_error() {
        let err = PaperSource::parse("---\ntitle: x\n# no close\n").unwrap_err();
        assert!(matches!(err, PaperError::UnterminatedFrontmatter));
    }

    #[test]
    fn tables_and_images_are_counted_outside_prose() {
        let content = "Intro words.\n\n| a | b |\n|---|---|\n| cell | text |\n\n![Figure one](figures/arch.png)\n";
        let source = PaperSource::parse(content).unwrap();
        assert_eq!(source.tables, 1);
        assert_eq!(source.images.len(), 1);
        assert_eq!(source.images[0].path, "figures/arch.png");
        assert_eq!(source.images[0].alt, "Figure one");
        assert!(!source.prose.contains("cell"));
        assert!(!source.prose.contains("Figure one"));
    }

    #[test]
    fn abstract_stops_at_next_heading() {
        let content = "## Abstract\n\nShort summary.\n\n## Background\n\nNot abstract.\n";
        let source = PaperSource::parse(content).unwrap();
        assert_eq!(source.abstract_text.as_deref(), Some("Short summary."));
    }

    #[test]
    fn remote_images_detected() {
        let image = ImageRef {
            alt: String::new(),
            path: "https://example.com/a.png".to_string(),
        };
        assert!(image.is_remote());
    }
}
