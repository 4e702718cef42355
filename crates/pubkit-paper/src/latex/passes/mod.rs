//! Normalization passes
//!
//! Each pass is one targeted rewrite. A pass must be idempotent on its own;
//! the [`Normalizer`](super::Normalizer) additionally iterates the whole
//! pipeline to a fixed point and reports the pass that refuses to settle.

use super::DocKind;
use std::borrow::Cow;

mod abstract_text;
mod braces;
mod greek;
mod metadata;
mod structure;

pub use abstract_text::{AbstractOpening, DuplicateSentences};
pub use braces::StrayBraces;
pub use greek::{greek_macro, GreekLetters};
pub use metadata::{StripMetadata, DEFAULT_FORBIDDEN_PATTERNS};
pub use structure::{AuthorBlock, DocumentClass, SectionNumbers};

/// A single named rewrite
pub trait Pass: Send + Sync {
    /// Stable pass name, used in reports and errors
    fn name(&self) -> &'static str;

    /// Whether the pass runs for this document kind
    fn applies_to(&self, kind: DocKind) -> bool {
        let _ = kind;
        true
    }

    /// Rewrite the document; return `Cow::Borrowed` when nothing changes
    fn apply<'a>(&self, text: &'a str, kind: DocKind) -> Cow<'a, str>;
}

impl std::fmt::Debug for dyn Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass").field("name", &self.name()).finish()
    }
}

/// Run `f` on the output of a previous rewrite, keeping the borrow when `f` changes nothing
pub(crate) fn then<'a>(first: Cow<'a, str>, f: impl FnOnce(&str) -> Cow<'_, str>) -> Cow<'a, str> {
    let next = match f(&first) {
        Cow::Owned(s) => Some(s),
        Cow::Borrowed(_) => None,
    };
    match next {
        Some(s) => Cow::Owned(s),
        None => first,
    }
}
