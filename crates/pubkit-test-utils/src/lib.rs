//! Testing utilities for the pubkit workspace
//!
//! Plain-text fixtures (papers, LaTeX sources, HTML pages, registries) and a
//! helper to drop them into a temp directory. Kept free of workspace crates so
//! every crate can use it as a dev-dependency.

#![allow(missing_docs)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const FILLER: &[&str] = &[
    "the", "cache", "layer", "keeps", "hot", "entries", "close", "to", "every", "reader",
];

/// Builder for a Markdown paper with known metrics
///
/// The defaults produce a paper that meets the default readiness thresholds.
#[derive(Debug, Clone)]
pub struct PaperFixture {
    pub title: String,
    pub body_words: usize,
    pub diagrams: usize,
    pub tables: usize,
    pub keywords: usize,
    pub abstract_words: usize,
    pub frontmatter: bool,
}

impl Default for PaperFixture {
    fn default() -> Self {
        Self {
            title: "Adaptive Edge Caching".to_string(),
            body_words: 5200,
            diagrams: 4,
            tables: 1,
            keywords: 10,
            abstract_words: 180,
            frontmatter: false,
        }
    }
}

impl PaperFixture {
    pub fn body_words(mut self, n: usize) -> Self {
        self.body_words = n;
        self
    }

    pub fn diagrams(mut self, n: usize) -> Self {
        self.diagrams = n;
        self
    }

    pub fn tables(mut self, n: usize) -> Self {
        self.tables = n;
        self
    }

    pub fn keywords(mut self, n: usize) -> Self {
        self.keywords = n;
        self
    }

    pub fn abstract_words(mut self, n: usize) -> Self {
        self.abstract_words = n;
        self
    }

    pub fn with_frontmatter(mut self) -> Self {
        self.frontmatter = true;
        self
    }

    pub fn keyword_list(&self) -> Vec<String> {
        (1..=self.keywords).map(|i| format!("topic{i}")).collect()
    }

    /// Render the Markdown document
    ///
    /// Prose word count is `body_words + abstract_words` plus the heading
    /// words and (without frontmatter) the `Keywords:` line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let keywords = self.keyword_list();
        if self.frontmatter {
            let _ = writeln!(out, "---\ntitle: {}\nkeywords: [{}]\n---", self.title, keywords.join(", "));
        }
        let _ = writeln!(out, "# {}\n", self.title);
        if !self.frontmatter {
            let _ = writeln!(out, "Keywords: {}\n", keywords.join(", "));
        }
        let _ = writeln!(out, "## Abstract\n\n{}\n", words(self.abstract_words));

        let sections = 4;
        let per_section = self.body_words / sections;
        for s in 0..sections {
            let count = if s == sections - 1 {
                self.body_words - per_section * (sections - 1)
            } else {
                per_section
            };
            let _ = writeln!(out, "## Section\n\n{}\n", words(count));
        }

        for i in 0..self.diagrams {
            let _ = writeln!(out, "```mermaid\ngraph TD\n  A{i} --> B{i}\n```\n");
        }
        for _ in 0..self.tables {
            out.push_str("| metric | value |\n| --- | --- |\n| hits | 42 |\n\n");
        }
        out
    }
}

/// `n` filler words, broken into sentences of ten
pub fn words(n: usize) -> String {
    let mut out = String::with_capacity(n * 6);
    for i in 0..n {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(FILLER[i % FILLER.len()]);
        if i % FILLER.len() == FILLER.len() - 1 || i == n - 1 {
            out.push('.');
        }
    }
    out
}

/// A pre-camera-ready LaTeX paper with every kind of defect the normalizer fixes
pub fn messy_latex() -> String {
    [
        r"\documentclass[12pt]{article}",
        r"\title{Adaptive Edge Caching\thanks{Internal review copy.}}",
        r"\author{Old Author}",
        r"\date{\today}",
        "% Generated by pandoc",
        r"\begin{document}",
        r"\maketitle",
        r"\begin{abstract}",
        "In this paper, we present a cache with hit rate α and miss penalty Δ.",
        r"\end{abstract}",
        "Status: draft",
        r"\section{1. Introduction}",
        "Warm caches help. Warm caches help.",
        r"\subsection{1.1 Setup}",
        r"We keep \verb|}| verbatim and close groups}.",
        r"\begin{verbatim}",
        "Status: kept in listing α",
        r"\end{verbatim}",
        r"\end{document}",
        "",
    ]
    .join("\n")
}

/// A Markdown paper with metadata lines and numbered headings
pub fn messy_markdown() -> String {
    [
        "# Adaptive Edge Caching",
        "",
        "**Status:** draft",
        "Word count: 5123",
        "",
        "## Abstract",
        "",
        "We present We present a cache with hit rate $α$.",
        "",
        "## 1. Introduction",
        "",
        "Warm caches help. Warm caches help.",
        "",
        "```text",
        "## 2. Not a heading",
        "Status: inside code",
        "```",
        "",
    ]
    .join("\n")
}

/// Minimal HTML page with the head tags the QA suite inspects
pub fn localized_page(lang: &str, path: &str, locales: &[&str]) -> String {
    let mut head = String::new();
    let _ = writeln!(head, "<title>Research | {lang}</title>");
    let _ = writeln!(
        head,
        r#"<meta name="description" content="Applied research and engineering ({lang})">"#
    );
    let _ = writeln!(head, r#"<link rel="canonical" href="https://example.org/{lang}{path}">"#);
    for alt in locales {
        let _ = writeln!(
            head,
            r#"<link rel="alternate" hreflang="{alt}" href="https://example.org/{alt}{path}">"#
        );
    }
    let _ = writeln!(
        head,
        r#"<link rel="alternate" hreflang="x-default" href="https://example.org/en{path}">"#
    );
    let _ = writeln!(head, r#"<meta property="og:title" content="Research">"#);
    format!("<!doctype html>\n<html lang=\"{lang}\">\n<head>\n{head}</head>\n<body><main>ok</main></body>\n</html>\n")
}

/// Registry with two papers, as TOML
pub fn registry_toml() -> &'static str {
    r#"
[[paper]]
id = "edge-caching"
slug = "adaptive-edge-caching"
title = "Adaptive Edge Caching"
keywords = ["caching", "edge"]
source = "papers/edge-caching.md"
venue = "acm"

[[paper]]
id = "log-structured"
slug = "log-structured-queues"
title = "Log-Structured Queues"
"#
}

/// Write `contents` to `root/relative`, creating parent directories
pub fn write_fixture(root: &Path, relative: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_has_exact_count() {
        let text = words(23);
        assert_eq!(text.split_whitespace().count(), 23);
        assert!(text.ends_with('.'));
    }

    #[test]
    fn default_paper_has_four_diagrams() {
        let paper = PaperFixture::default().render();
        assert_eq!(paper.matches("```mermaid").count(), 4);
        assert!(paper.contains("Keywords: topic1, topic2"));
    }

    #[test]
    fn page_declares_lang() {
        let page = localized_page("de", "/about", &["en", "de"]);
        assert!(page.contains(r#"<html lang="de">"#));
        assert!(page.contains(r#"hreflang="x-default""#));
    }
}
