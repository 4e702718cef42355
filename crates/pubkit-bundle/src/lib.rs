//! pubkit submission bundles
//!
//! Regenerates a venue submission directory from a Markdown paper:
//! Pandoc-generated `main.tex`, flattened `figures/`, a README and a
//! `manifest.json` with checksums.
//!
//! # Example
//!
//! ```rust,ignore
//! use pubkit_bundle::{BundleOptions, Bundler};
//! use pubkit_paper::latex::Venue;
//!
//! let options = BundleOptions::new("papers/caching/paper.md", Venue::Arxiv);
//! let manifest = Bundler::default().build(&options).await?;
//! println!("{} figures", manifest.figures.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod bundler;
mod error;
mod figures;
mod manifest;
mod tool;

pub use bundler::{BundleOptions, Bundler};
pub use error::BundleError;
pub use figures::{is_svg, rewrite_graphics_paths, FigureRecord, SvgConverter};
pub use manifest::{sha256_hex, BundleManifest, MAIN_TEX, MANIFEST_FILE, README_FILE};
pub use tool::{ProcessToolRunner, ToolOutput, ToolRunner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
