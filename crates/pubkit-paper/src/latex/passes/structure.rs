//! Venue-driven structure rewrites: document class, author block, section numbering

use super::Pass;
use crate::latex::scan::{group_end, is_protected_at, lines, map_lines, strip_comment, LineEdit};
use crate::latex::DocKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static DOCUMENT_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*\\documentclass\s*(?:\[[^\]]*\])?\s*\{[^}\n]*\}[^\n%]*").expect("documentclass regex")
});

/// `2.`, `2.1`, `10.2.1.` or `IV.`
const DOTTED_NUMBER: &str = r"(?:\d{1,2}\.(?:\d{1,2}\.?)*|[IVXLC]+\.)";
/// Dotted numbers plus a bare `2`
const ANY_NUMBER: &str = r"(?:\d{1,2}(?:\.\d{1,2})*\.?|[IVXLC]+\.)";

fn latex_section_number(number: &str) -> Regex {
    Regex::new(&format!(
        r"\\((?:sub){{0,2}}section|chapter|paragraph)(\*?)\{{\s*(?:{number}\s+)+"
    ))
    .expect("latex section regex")
}

fn md_section_number(levels: &str, number: &str) -> Regex {
    Regex::new(&format!(r"^(#{{{levels}}})[ \t]+(?:{number}[ \t]+)+")).expect("md section regex")
}

static LATEX_SECTION_NUMBER: Lazy<Regex> = Lazy::new(|| latex_section_number(DOTTED_NUMBER));
static LATEX_SECTION_ANY_NUMBER: Lazy<Regex> = Lazy::new(|| latex_section_number(ANY_NUMBER));
static MD_SECTION_NUMBER: Lazy<Regex> = Lazy::new(|| md_section_number("1,6", DOTTED_NUMBER));
static MD_SECTION_ANY_NUMBER: Lazy<Regex> = Lazy::new(|| md_section_number("2,6", ANY_NUMBER));

/// Unstarred LaTeX headings and Markdown headings below the title
static LATEX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:(?:sub){0,2}section|chapter|paragraph)\{").expect("latex heading regex"));
static MD_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{2,6}[ \t]+").expect("md heading regex"));
/// `1 `, `1.2 `: numbering without a trailing dot
static BARE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,2}(?:\.\d{1,2})*\s").expect("bare number regex"));

/// Commands that make up an author block
const AUTHOR_COMMANDS: &[&str] = &[r"\author", r"\affiliation", r"\email", r"\orcid"];

/// Replaces the `\documentclass` line with the venue's
#[derive(Debug, Clone)]
pub struct DocumentClass {
    line: String,
}

impl DocumentClass {
    /// Use `line` as the document class declaration
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

impl Pass for DocumentClass {
    fn name(&self) -> &'static str {
        "document-class"
    }

    fn applies_to(&self, kind: DocKind) -> bool {
        kind == DocKind::Latex
    }

    fn apply<'a>(&self, text: &'a str, _kind: DocKind) -> Cow<'a, str> {
        match DOCUMENT_CLASS.find(text) {
            Some(m) if m.as_str().trim_end() != self.line => {
                let mut out = String::with_capacity(text.len());
                out.push_str(&text[..m.start()]);
                out.push_str(&self.line);
                out.push_str(&text[m.end()..]);
                Cow::Owned(out)
            }
            _ => Cow::Borrowed(text),
        }
    }
}

/// Replaces the existing author block, or inserts one after `\title{...}`
#[derive(Debug, Clone)]
pub struct AuthorBlock {
    block: String,
}

impl AuthorBlock {
    /// Use a pre-rendered block (see [`Venue::render_authors`](crate::latex::Venue::render_authors))
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
        }
    }
}

impl Pass for AuthorBlock {
    fn name(&self) -> &'static str {
        "author-block"
    }

    fn applies_to(&self, kind: DocKind) -> bool {
        kind == DocKind::Latex
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        if self.block.is_empty() {
            return Cow::Borrowed(text);
        }

        if let Some(start) = find_command(text, kind, r"\author") {
            let end = author_span_end(text, start);
            if text[start..end] == self.block {
                return Cow::Borrowed(text);
            }
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..start]);
            out.push_str(&self.block);
            out.push_str(&text[end..]);
            return Cow::Owned(out);
        }

        if let Some(start) = find_command(text, kind, r"\title") {
            if let Some(end) = command_end(text, start + r"\title".len()) {
                let mut out = String::with_capacity(text.len() + self.block.len() + 1);
                out.push_str(&text[..end]);
                out.push('\n');
                out.push_str(&self.block);
                out.push_str(&text[end..]);
                return Cow::Owned(out);
            }
        }
        Cow::Borrowed(text)
    }
}

/// First unprotected occurrence of `command` not followed by a letter
fn find_command(text: &str, kind: DocKind, command: &str) -> Option<usize> {
    text.match_indices(command)
        .map(|(at, _)| at)
        .find(|&at| {
            let next = text[at + command.len()..].chars().next();
            !next.is_some_and(char::is_alphabetic) && !is_protected_at(text, kind, at)
        })
}

/// End of a command's optional `[...]` and mandatory `{...}` argument
fn command_end(text: &str, mut at: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(at) == Some(&b'[') {
        at += text[at..].find(']')? + 1;
    }
    group_end(text, at)
}

/// End of the run of author-related commands starting at `start`
fn author_span_end(text: &str, start: usize) -> usize {
    let mut end = start;
    let mut cursor = start;
    loop {
        let Some(command) = AUTHOR_COMMANDS.iter().find(|c| {
            text[cursor..].starts_with(**c)
                && !text[cursor + c.len()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphabetic)
        }) else {
            break;
        };
        let Some(group) = command_end(text, cursor + command.len()) else {
            break;
        };
        end = group;
        let rest = &text[end..];
        cursor = end + (rest.len() - rest.trim_start().len());
    }
    end
}

/// Strips manual numbering from section headings
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionNumbers;

impl Pass for SectionNumbers {
    fn name(&self) -> &'static str {
        "section-numbers"
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        let bare = uniformly_numbered(text, kind);
        map_lines(text, kind, |line| {
            let rewritten = match kind {
                DocKind::Latex if bare => LATEX_SECTION_ANY_NUMBER.replace_all(line, r"\$1$2{"),
                DocKind::Latex => LATEX_SECTION_NUMBER.replace_all(line, r"\$1$2{"),
                DocKind::Markdown => match MD_SECTION_ANY_NUMBER.replace(line, "$1 ") {
                    Cow::Owned(s) if bare => Cow::Owned(s),
                    _ => MD_SECTION_NUMBER.replace(line, "$1 "),
                },
            };
            match rewritten {
                Cow::Borrowed(_) => LineEdit::Keep,
                Cow::Owned(s) => LineEdit::Replace(s),
            }
        })
    }
}

/// Bare integers count as numbering only when every heading (at least two)
/// uses the `1` / `1.2` style; otherwise `10 Lessons Learned` is a title
fn uniformly_numbered(text: &str, kind: DocKind) -> bool {
    let mut headings = 0usize;
    for line in lines(text, kind).iter().filter(|l| !l.protected) {
        let (heading, code) = match kind {
            DocKind::Latex => (&*LATEX_HEADING, strip_comment(line.content())),
            DocKind::Markdown => (&*MD_HEADING, line.content()),
        };
        for m in heading.find_iter(code) {
            if !BARE_PREFIX.is_match(&code[m.end()..]) {
                return false;
            }
            headings += 1;
        }
    }
    headings >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::{Author, Venue};
    use pretty_assertions::assert_eq;

    #[test]
    fn replaces_document_class() {
        let pass = DocumentClass::new(Venue::Acm.document_class());
        let input = "\\documentclass[12pt,a4paper]{article}\n\\begin{document}\n";
        let out = pass.apply(input, DocKind::Latex);
        assert_eq!(out, "\\documentclass[sigconf]{acmart}\n\\begin{document}\n");
        assert!(matches!(pass.apply(&out, DocKind::Latex), Cow::Borrowed(_)));
    }

    #[test]
    fn replaces_multiline_pandoc_class() {
        let pass = DocumentClass::new(Venue::Acm.document_class());
        let input = "% Options for packages loaded elsewhere\n\\PassOptionsToPackage{unicode}{hyperref}\n%\n\\documentclass[\n]{article}\n\\usepackage{amsmath,amssymb}\n";
        let out = pass.apply(input, DocKind::Latex);
        assert_eq!(
            out,
            "% Options for packages loaded elsewhere\n\\PassOptionsToPackage{unicode}{hyperref}\n%\n\\documentclass[sigconf]{acmart}\n\\usepackage{amsmath,amssymb}\n"
        );

        let spaced = pass.apply("\\documentclass [\n  11pt,\n  twocolumn\n] {article}\n", DocKind::Latex);
        assert_eq!(spaced, "\\documentclass[sigconf]{acmart}\n");
    }

    #[test]
    fn author_block_replaces_acm_siblings() {
        let author = Author {
            name: "New Name".to_string(),
            affiliation: "Lab".to_string(),
            email: None,
            orcid: None,
        };
        let pass = AuthorBlock::new(Venue::Acm.render_authors(&[author]));
        let input = "\\title{T}\n\\author{Old}\n\\affiliation{\\institution{Old Lab}}\n\\email{old@x.org}\n\\begin{abstract}\n";
        let out = pass.apply(input, DocKind::Latex);
        assert_eq!(
            out,
            "\\title{T}\n\\author{New Name}\n\\affiliation{\\institution{Lab}}\n\\begin{abstract}\n"
        );
        assert!(matches!(pass.apply(&out, DocKind::Latex), Cow::Borrowed(_)));
    }

    #[test]
    fn author_block_inserted_after_title() {
        let pass = AuthorBlock::new(r"\author{A}");
        let out = pass.apply("\\title[short]{Long Title}\n\\maketitle\n", DocKind::Latex);
        assert_eq!(out, "\\title[short]{Long Title}\n\\author{A}\n\\maketitle\n");
    }

    #[test]
    fn authorrunning_is_not_an_author_block() {
        let pass = AuthorBlock::new(r"\author{A}");
        let out = pass.apply("\\authorrunning{X}\n\\title{T}\n", DocKind::Latex);
        assert_eq!(out, "\\authorrunning{X}\n\\title{T}\n\\author{A}\n");
    }

    #[test]
    fn strips_section_numbers() {
        let latex = SectionNumbers.apply("\\section{2. Method}\n\\subsection*{2.1 Setup}\n\\section{2024 Results}\n", DocKind::Latex);
        assert_eq!(latex, "\\section{Method}\n\\subsection*{Setup}\n\\section{2024 Results}\n");

        let md = SectionNumbers.apply("## 3. Evaluation\n### IV. Results\n## 2024 Results\n", DocKind::Markdown);
        assert_eq!(md, "## Evaluation\n### Results\n## 2024 Results\n");
    }

    #[test]
    fn numbers_in_titles_survive() {
        let latex = "\\section{10 Lessons Learned}\n\\section{2. Method}\n";
        assert_eq!(
            SectionNumbers.apply(latex, DocKind::Latex),
            "\\section{10 Lessons Learned}\n\\section{Method}\n"
        );
        let lone = "\\section{10 Lessons Learned}\n";
        assert!(matches!(SectionNumbers.apply(lone, DocKind::Latex), Cow::Borrowed(_)));

        let md = "# Caching\n## 3 Reasons to Cache\n";
        assert!(matches!(SectionNumbers.apply(md, DocKind::Markdown), Cow::Borrowed(_)));
        let mixed = "## 3 Reasons to Cache\n## Background\n";
        assert!(matches!(SectionNumbers.apply(mixed, DocKind::Markdown), Cow::Borrowed(_)));
    }

    #[test]
    fn bare_numbers_stripped_when_every_heading_has_one() {
        let latex = "\\section{1 Introduction}\n\\subsection{1.1 Setup}\n\\section*{Acknowledgments}\n\\section{2 Method}\n";
        assert_eq!(
            SectionNumbers.apply(latex, DocKind::Latex),
            "\\section{Introduction}\n\\subsection{Setup}\n\\section*{Acknowledgments}\n\\section{Method}\n"
        );

        let md = "# 5 Tips for Caches\n## 1 Introduction\n## 2 Evaluation\n";
        let once = SectionNumbers.apply(md, DocKind::Markdown).into_owned();
        assert_eq!(once, "# 5 Tips for Caches\n## Introduction\n## Evaluation\n");
        assert!(matches!(SectionNumbers.apply(&once, DocKind::Markdown), Cow::Borrowed(_)));
    }

    #[test]
    fn stacked_numbers_settle_in_one_pass() {
        let once = SectionNumbers.apply("## 1. 2. Intro\n", DocKind::Markdown).into_owned();
        assert_eq!(once, "## Intro\n");
        assert!(matches!(SectionNumbers.apply(&once, DocKind::Markdown), Cow::Borrowed(_)));
    }
}
