//! Protected-region scanning shared by the passes
//!
//! Passes never touch verbatim-like LaTeX environments, LaTeX comments or
//! fenced Markdown code. This module splits a document into lines and
//! segments tagged with whether they may be rewritten.

use super::DocKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static VERBATIM_BEGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\begin\{(verbatim|Verbatim|lstlisting|minted|comment)(\*?)\}").expect("verbatim regex")
});

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("fence regex"));

/// A line including its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    pub(crate) text: &'a str,
    pub(crate) protected: bool,
}

impl<'a> Line<'a> {
    /// Line content without the trailing `\n` / `\r\n`
    pub(crate) fn content(&self) -> &'a str {
        self.text.trim_end_matches(['\n', '\r'])
    }

    /// Line terminator (possibly empty)
    pub(crate) fn terminator(&self) -> &'a str {
        &self.text[self.content().len()..]
    }
}

/// A run of text that is either rewritable or protected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment<'a> {
    pub(crate) text: &'a str,
    pub(crate) protected: bool,
}

/// Split into lines, marking verbatim environments and code fences
pub(crate) fn lines(text: &str, kind: DocKind) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    // closing marker we are waiting for, if inside a protected block
    let mut closing: Option<String> = None;

    for raw in text.split_inclusive('\n') {
        let content = raw.trim_end_matches(['\n', '\r']);
        match closing.take() {
            Some(marker) => {
                let done = match kind {
                    DocKind::Latex => content.contains(marker.as_str()),
                    DocKind::Markdown => {
                        let trimmed = content.trim();
                        trimmed.starts_with(marker.as_str())
                            && trimmed.chars().all(|c| c == marker.chars().next().unwrap_or('`'))
                    }
                };
                if !done {
                    closing = Some(marker);
                }
                out.push(Line {
                    text: raw,
                    protected: true,
                });
            }
            None => {
                let opened = match kind {
                    DocKind::Latex => VERBATIM_BEGIN.captures(strip_comment(content)).and_then(|c| {
                        let end = format!("\\end{{{}{}}}", &c[1], &c[2]);
                        // single-line environment closes on the same line
                        let after = &content[c.get(0).map_or(0, |m| m.end())..];
                        (!after.contains(end.as_str())).then_some(end)
                    }),
                    DocKind::Markdown => FENCE.captures(content).map(|c| c[1].to_string()),
                };
                let protected = opened.is_some()
                    || (kind == DocKind::Latex && VERBATIM_BEGIN.is_match(strip_comment(content)));
                closing = opened;
                out.push(Line {
                    text: raw,
                    protected,
                });
            }
        }
    }
    out
}

/// Split into segments; LaTeX comments become protected segments.
/// Adjacent segments with the same protection are merged, so joining all
/// segment texts reproduces the input.
pub(crate) fn segments(text: &str, kind: DocKind) -> Vec<Segment<'_>> {
    let mut ranges: Vec<(usize, usize, bool)> = Vec::new();
    let mut push = |from: usize, to: usize, protected: bool| {
        if from == to {
            return;
        }
        match ranges.last_mut() {
            Some(last) if last.2 == protected => last.1 = to,
            _ => ranges.push((from, to, protected)),
        }
    };

    let mut start = 0usize;
    for line in lines(text, kind) {
        let end = start + line.text.len();
        let content_end = start + line.content().len();
        if line.protected {
            push(start, end, true);
        } else if kind == DocKind::Latex {
            let code_end = start + strip_comment(line.content()).len();
            push(start, code_end, false);
            push(code_end, content_end, true);
            push(content_end, end, false);
        } else {
            push(start, end, false);
        }
        start = end;
    }

    ranges
        .into_iter()
        .map(|(from, to, protected)| Segment {
            text: &text[from..to],
            protected,
        })
        .collect()
}

/// Part of a LaTeX line before an unescaped `%`
pub(crate) fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'%' => return &line[..i],
            _ => i += 1,
        }
    }
    line
}

/// Rewrite every unprotected segment
pub(crate) fn map_segments<'a, F>(text: &'a str, kind: DocKind, mut f: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> Cow<'_, str>,
{
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    for segment in segments(text, kind) {
        if segment.protected {
            out.push_str(segment.text);
        } else {
            let rewritten = f(segment.text);
            if let Cow::Owned(s) = rewritten {
                changed |= s != segment.text;
                out.push_str(&s);
            } else {
                out.push_str(segment.text);
            }
        }
    }
    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Per-line edit decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineEdit {
    Keep,
    Replace(String),
    Delete,
}

/// Edit unprotected lines; the callback sees the line without its terminator
pub(crate) fn map_lines<F>(text: &str, kind: DocKind, mut f: F) -> Cow<'_, str>
where
    F: FnMut(&str) -> LineEdit,
{
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    for line in lines(text, kind) {
        if line.protected {
            out.push_str(line.text);
            continue;
        }
        match f(line.content()) {
            LineEdit::Keep => out.push_str(line.text),
            LineEdit::Replace(s) if s == line.content() => out.push_str(line.text),
            LineEdit::Replace(s) => {
                changed = true;
                out.push_str(&s);
                out.push_str(line.terminator());
            }
            LineEdit::Delete => changed = true,
        }
    }
    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Byte index just past the `}` matching the `{` at `open`
pub(crate) fn group_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Whether byte offset `at` falls inside a protected segment
pub(crate) fn is_protected_at(text: &str, kind: DocKind, at: usize) -> bool {
    let mut start = 0usize;
    for segment in segments(text, kind) {
        let end = start + segment.text.len();
        if (start..end).contains(&at) {
            return segment.protected;
        }
        start = end;
    }
    false
}
