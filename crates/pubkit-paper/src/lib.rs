//! pubkit paper sources
//!
//! Everything that reads or rewrites a research paper's source files.
//!
//! # Core Concepts
//!
//! - [`PaperSource`]: Parsed Markdown paper (frontmatter, headings, code blocks, prose)
//! - [`PaperMetrics`]: Word, diagram, table and keyword counts derived from a source
//! - [`ReadinessThresholds`]: Publication gate over the metrics
//! - [`PaperRegistry`]: Validated list of papers with slugs and detail routes
//! - [`latex::Normalizer`]: Idempotent camera-ready cleanup of `.tex`/`.md` files
//!
//! # Example
//!
//! ```rust,ignore
//! use pubkit_paper::prelude::*;
//!
//! let source = PaperSource::load("papers/caching/paper.md").await?;
//! let metrics = PaperMetrics::from_source(&source);
//! let report = ReadinessThresholds::default().evaluate(&metrics);
//! println!("{report}");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod markdown;
mod metrics;
mod readiness;
mod registry;

pub mod latex;

pub use error::{LatexError, PaperError, RegistryError};
pub use markdown::{CodeBlock, Heading, ImageRef, PaperSource};
pub use metrics::{count_words, PaperMetrics};
pub use readiness::{ReadinessCheck, ReadinessReport, ReadinessThresholds};
pub use registry::{PaperEntry, PaperRegistry};

/// Common imports
pub mod prelude {
    pub use crate::latex::{DocKind, LatexOptions, Mode, Normalizer, Venue};
    pub use crate::{
        PaperEntry, PaperMetrics, PaperRegistry, PaperSource, ReadinessReport, ReadinessThresholds,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
