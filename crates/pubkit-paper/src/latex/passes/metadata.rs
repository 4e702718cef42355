//! Forbidden metadata removal

use super::{then, Pass};
use crate::error::LatexError;
use crate::latex::scan::{group_end, map_lines, map_segments, LineEdit};
use crate::latex::DocKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Line patterns removed before submission
pub const DEFAULT_FORBIDDEN_PATTERNS: &[&str] = &[
    r"(?i)^\s*[*_>]*\s*(?:status|word count|version|last updated|revision|internal notes?|confidential)\s*[*_]*\s*:",
    r"(?i)^\s*[*_]*\s*draft\s*[*_]*\s*(?:[-:\x{2014}].*)?$",
    r"(?i)^\s*(?:%+|<!--)\s*generated (?:by|with)\b",
    r"^\s*\\date\{.*\}\s*$",
];

static DEFAULTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_FORBIDDEN_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("default metadata pattern"))
        .collect()
});

/// Deletes whole lines that carry internal metadata, plus inline `\thanks{...}`
#[derive(Debug, Clone)]
pub struct StripMetadata {
    patterns: Vec<Regex>,
}

impl Default for StripMetadata {
    fn default() -> Self {
        Self {
            patterns: DEFAULTS.clone(),
        }
    }
}

impl StripMetadata {
    /// Default patterns plus `extra`
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Result<Self, LatexError> {
        let mut patterns = DEFAULTS.clone();
        for pattern in extra {
            let pattern = pattern.as_ref();
            patterns.push(Regex::new(pattern).map_err(|source| LatexError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?);
        }
        Ok(Self { patterns })
    }

    fn is_forbidden(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }
}

impl Pass for StripMetadata {
    fn name(&self) -> &'static str {
        "strip-metadata"
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        let stripped = map_lines(text, kind, |line| {
            if self.is_forbidden(line) {
                LineEdit::Delete
            } else {
                LineEdit::Keep
            }
        });
        match kind {
            DocKind::Latex => then(stripped, |t| map_segments(t, kind, remove_thanks)),
            DocKind::Markdown => stripped,
        }
    }
}

fn remove_thanks(segment: &str) -> Cow<'_, str> {
    const THANKS: &str = r"\thanks";
    if !segment.contains(THANKS) {
        return Cow::Borrowed(segment);
    }
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(at) = rest.find(THANKS) {
        let open = at + THANKS.len();
        let after_ws = open + rest[open..].len() - rest[open..].trim_start().len();
        match group_end(rest, after_ws) {
            Some(end) => {
                out.push_str(&rest[..at]);
                rest = &rest[end..];
            }
            None => {
                out.push_str(&rest[..open]);
                rest = &rest[open..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_metadata_lines() {
        let input = "# Title\n**Status:** draft\nWord count: 5123\nDRAFT\nBody stays.\n";
        let out = StripMetadata::default().apply(input, DocKind::Markdown);
        assert_eq!(out, "# Title\nBody stays.\n");
    }

    #[test]
    fn strips_date_and_thanks() {
        let input = "\\title{Paper\\thanks{Funded by X.}}\n\\date{\\today}\n% Generated by pandoc\nText.\n";
        let out = StripMetadata::default().apply(input, DocKind::Latex);
        assert_eq!(out, "\\title{Paper}\nText.\n");
    }

    #[test]
    fn keeps_lines_that_only_mention_words() {
        let input = "The draft protocol has a version field.\n";
        let out = StripMetadata::default().apply(input, DocKind::Markdown);
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn extra_patterns_are_validated() {
        assert!(StripMetadata::with_extra(&["(unclosed"]).is_err());
        let pass = StripMetadata::with_extra(&["^Reviewer:"]).unwrap();
        assert_eq!(pass.apply("Reviewer: 2\nok\n", DocKind::Markdown), "ok\n");
    }

    #[test]
    fn verbatim_content_is_untouched() {
        let input = "\\begin{verbatim}\nStatus: kept\n\\end{verbatim}\n";
        let out = StripMetadata::default().apply(input, DocKind::Latex);
        assert_eq!(out, input);
    }
}
