//! Stray closing brace removal

use super::Pass;
use crate::latex::scan::segments;
use crate::latex::DocKind;
use std::borrow::Cow;

/// Drops `}` characters that close no open group
///
/// Depth is tracked across the whole document, skipping comments,
/// verbatim environments, escaped braces and `\verb` arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrayBraces;

impl Pass for StrayBraces {
    fn name(&self) -> &'static str {
        "stray-braces"
    }

    fn applies_to(&self, kind: DocKind) -> bool {
        kind == DocKind::Latex
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        let mut drops: Vec<usize> = Vec::new();
        let mut depth = 0usize;
        let mut offset = 0usize;

        for segment in segments(text, kind) {
            if !segment.protected {
                scan_segment(segment.text, offset, &mut depth, &mut drops);
            }
            offset += segment.text.len();
        }

        if drops.is_empty() {
            return Cow::Borrowed(text);
        }
        tracing::debug!(count = drops.len(), "removing stray closing braces");
        let mut out = String::with_capacity(text.len());
        let mut last = 0usize;
        for at in drops {
            out.push_str(&text[last..at]);
            last = at + 1;
        }
        out.push_str(&text[last..]);
        Cow::Owned(out)
    }
}

fn scan_segment(segment: &str, offset: usize, depth: &mut usize, drops: &mut Vec<usize>) {
    let bytes = segment.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if let Some(skip) = verb_argument_len(&segment[i..]) {
                    i += skip;
                } else {
                    i += 2;
                }
                continue;
            }
            b'{' => *depth += 1,
            b'}' => {
                if *depth == 0 {
                    drops.push(offset + i);
                } else {
                    *depth -= 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
}

/// Length of a `\verb|...|` (or `\verb*|...|`) run starting at the backslash
fn verb_argument_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix(r"\verb")?;
    let rest_start = text.len() - rest.len();
    let (star, rest) = match rest.strip_prefix('*') {
        Some(r) => (1, r),
        None => (0, rest),
    };
    let delimiter = rest.chars().next().filter(|c| !c.is_alphabetic() && !c.is_whitespace())?;
    let body = &rest[delimiter.len_utf8()..];
    let close = body.find(delimiter)?;
    Some(rest_start + star + delimiter.len_utf8() + close + delimiter.len_utf8())
}
