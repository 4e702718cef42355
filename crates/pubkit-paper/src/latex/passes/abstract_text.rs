//! Abstract opening and repeated-sentence cleanup

use super::Pass;
use crate::latex::scan::{is_protected_at, map_segments};
use crate::latex::DocKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static MD_ABSTRACT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^#{1,6}[ \t]*abstract[ \t]*\r?$").expect("abstract heading regex"));

static MD_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s").expect("heading regex"));

static CONVENTIONAL_OPENER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:in this (?:paper|work|article),?\s+we\s+(?:present|propose|introduce|describe)|we\s+(?:present|propose|introduce|describe)|this\s+(?:work|article|study)\s+(?:presents|proposes|introduces|describes)|this\s+paper\s+(?:presents|proposes|introduces|describes))\b",
    )
    .expect("opener regex")
});

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\r?\n").expect("paragraph regex"));

const LATEX_BEGIN: &str = r"\begin{abstract}";
const LATEX_END: &str = r"\end{abstract}";
const MAX_PHRASE_WORDS: usize = 8;
const MIN_DUPLICATE_WORDS: usize = 3;

/// Rewrites the start of the abstract
///
/// Repeated leading phrases ("This paper presents This paper presents") are
/// collapsed, and a conventional opener is replaced by the configured one.
/// The opening is never prepended to an abstract that does not start with a
/// recognised opener.
#[derive(Debug, Clone, Default)]
pub struct AbstractOpening {
    opening: Option<String>,
}

impl AbstractOpening {
    /// Use `opening` as the canonical first words, or only collapse repeats when `None`
    pub fn new(opening: Option<String>) -> Self {
        Self {
            opening: opening.filter(|o| !o.trim().is_empty()),
        }
    }

    fn rewrite(&self, body: &str) -> Option<String> {
        let leading = body.len() - body.trim_start().len();
        let content = &body[leading..];
        let mut text = collapse_repeats(content).into_owned();
        if let Some(opening) = &self.opening {
            if !starts_with_ignore_case(&text, opening) {
                if let Some(m) = CONVENTIONAL_OPENER.find(&text) {
                    text = format!("{opening}{}", &text[m.end()..]);
                }
            }
            text = collapse_repeats(&text).into_owned();
        }
        (text != content).then(|| format!("{}{text}", &body[..leading]))
    }
}

impl Pass for AbstractOpening {
    fn name(&self) -> &'static str {
        "abstract-opening"
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        let Some((start, end)) = abstract_body(text, kind) else {
            return Cow::Borrowed(text);
        };
        match self.rewrite(&text[start..end]) {
            Some(body) => {
                let mut out = String::with_capacity(text.len());
                out.push_str(&text[..start]);
                out.push_str(&body);
                out.push_str(&text[end..]);
                Cow::Owned(out)
            }
            None => Cow::Borrowed(text),
        }
    }
}

/// Byte range of the abstract body
fn abstract_body(text: &str, kind: DocKind) -> Option<(usize, usize)> {
    match kind {
        DocKind::Latex => {
            let begin = text
                .match_indices(LATEX_BEGIN)
                .map(|(at, _)| at)
                .find(|&at| !is_protected_at(text, kind, at))?;
            let start = begin + LATEX_BEGIN.len();
            let end = start + text[start..].find(LATEX_END)?;
            Some((start, end))
        }
        DocKind::Markdown => {
            let heading = MD_ABSTRACT_HEADING
                .find_iter(text)
                .find(|m| !is_protected_at(text, kind, m.start()))?;
            let start = text[heading.end()..]
                .find('\n')
                .map_or(text.len(), |i| heading.end() + i + 1);
            let end = MD_HEADING
                .find(&text[start..])
                .map_or(text.len(), |m| start + m.start());
            Some((start, end))
        }
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Drop leading phrases that are immediately repeated
fn collapse_repeats(text: &str) -> Cow<'_, str> {
    let mut current = text;
    'outer: loop {
        let spans = word_spans(current, 2 * MAX_PHRASE_WORDS);
        for n in 2..=MAX_PHRASE_WORDS {
            if spans.len() < 2 * n {
                break;
            }
            let repeated = (0..n).all(|i| {
                let (a0, a1) = spans[i];
                let (b0, b1) = spans[n + i];
                current[a0..a1].eq_ignore_ascii_case(&current[b0..b1])
            });
            if repeated {
                current = &current[spans[n].0..];
                continue 'outer;
            }
        }
        break;
    }
    if current.len() == text.len() {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(current.to_string())
    }
}

/// Byte spans of up to `limit` whitespace-separated words
fn word_spans(text: &str, limit: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, i));
                if spans.len() == limit {
                    return spans;
                }
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Removes a sentence that exactly repeats the one before it
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateSentences;

impl Pass for DuplicateSentences {
    fn name(&self) -> &'static str {
        "duplicate-sentences"
    }

    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str> {
        map_segments(text, kind, dedupe_segment)
    }
}

fn dedupe_segment(segment: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(segment.len());
    let mut changed = false;
    let mut last = 0usize;
    for brk in PARAGRAPH_BREAK.find_iter(segment) {
        let paragraph = &segment[last..brk.start()];
        let deduped = dedupe_paragraph(paragraph);
        changed |= matches!(deduped, Cow::Owned(_));
        out.push_str(&deduped);
        out.push_str(brk.as_str());
        last = brk.end();
    }
    let deduped = dedupe_paragraph(&segment[last..]);
    changed |= matches!(deduped, Cow::Owned(_));
    out.push_str(&deduped);

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(segment)
    }
}

fn dedupe_paragraph(paragraph: &str) -> Cow<'_, str> {
    let sentences = split_sentences(paragraph);
    if sentences.len() < 2 {
        return Cow::Borrowed(paragraph);
    }

    let mut kept: Vec<(&str, &str)> = Vec::with_capacity(sentences.len());
    let mut previous: Option<String> = None;
    let mut changed = false;
    for (sentence, trailer) in sentences {
        let normalized = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
        let long_enough = normalized.split(' ').count() >= MIN_DUPLICATE_WORDS;
        if long_enough && previous.as_deref() == Some(normalized.as_str()) {
            if let Some(last) = kept.last_mut() {
                last.1 = trailer;
            }
            changed = true;
            continue;
        }
        kept.push((sentence, trailer));
        previous = Some(normalized);
    }

    if !changed {
        return Cow::Borrowed(paragraph);
    }
    let mut out = String::with_capacity(paragraph.len());
    for (sentence, trailer) in kept {
        out.push_str(sentence);
        out.push_str(trailer);
    }
    Cow::Owned(out)
}

/// Split into (sentence, trailing whitespace) pairs; joining them restores the input
fn split_sentences(paragraph: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut chars = paragraph.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        match chars.peek() {
            Some(&(_, next)) if next.is_whitespace() => {}
            Some(_) => continue,
            None => {}
        }
        let mut trailer_end = end;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            trailer_end = j + w.len_utf8();
            chars.next();
        }
        out.push((&paragraph[start..end], &paragraph[end..trailer_end]));
        start = trailer_end;
    }
    if start < paragraph.len() {
        out.push((&paragraph[start..], ""));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn opening() -> AbstractOpening {
        AbstractOpening::new(Some("This paper presents".to_string()))
    }

    #[test]
    fn collapses_doubled_opening() {
        let input = "\\begin{abstract}\nThis paper presents This paper presents a cache.\n\\end{abstract}\n";
        let out = opening().apply(input, DocKind::Latex);
        assert_eq!(out, "\\begin{abstract}\nThis paper presents a cache.\n\\end{abstract}\n");
    }

    #[test]
    fn rewrites_conventional_opener_once() {
        let input = "## Abstract\n\nIn this paper, we present a scheduler.\n\n## Introduction\n";
        let once = opening().apply(input, DocKind::Markdown).into_owned();
        assert_eq!(once, "## Abstract\n\nThis paper presents a scheduler.\n\n## Introduction\n");
        assert!(matches!(opening().apply(&once, DocKind::Markdown), Cow::Borrowed(_)));
    }

    #[test]
    fn never_prepends_opening() {
        let input = "\\begin{abstract}\nModern caches fail.\n\\end{abstract}";
        assert!(matches!(opening().apply(input, DocKind::Latex), Cow::Borrowed(_)));
    }

    #[test]
    fn opener_replacement_that_creates_a_repeat_is_collapsed() {
        let input = "## Abstract\nWe present This paper presents a log.\n";
        let out = opening().apply(input, DocKind::Markdown);
        assert_eq!(out, "## Abstract\nThis paper presents a log.\n");
    }

    #[test]
    fn without_opening_only_repeats_collapse() {
        let pass = AbstractOpening::new(None);
        let input = "## Abstract\nWe present we present a tool.\n";
        assert_eq!(pass.apply(input, DocKind::Markdown), "## Abstract\nwe present a tool.\n");
    }

    #[test]
    fn drops_repeated_sentences() {
        let input = "The cache is warm. The cache is warm. It serves reads.\n\nThe cache is warm.\n";
        let out = DuplicateSentences.apply(input, DocKind::Markdown);
        assert_eq!(out, "The cache is warm. It serves reads.\n\nThe cache is warm.\n");
    }

    #[test]
    fn keeps_short_repeats_and_trailing_layout() {
        assert!(matches!(DuplicateSentences.apply("No. No.\n", DocKind::Markdown), Cow::Borrowed(_)));
        assert_eq!(
            DuplicateSentences.apply("A b c. A b c.\n", DocKind::Markdown),
            "A b c.\n"
        );
    }

    #[test]
    fn split_sentences_roundtrips() {
        let text = "One two. Three?  Four! e.g.five";
        let joined: String = split_sentences(text).iter().map(|(s, t)| format!("{s}{t}")).collect();
        assert_eq!(joined, text);
    }
}
