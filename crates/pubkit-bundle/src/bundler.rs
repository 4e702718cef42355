//! Bundle regeneration
//!
//! ```text
//! paper.md ──parse──► image refs ──copy/convert──► out/figures/
//!     │
//!     └──pandoc──► out/main.tex ──rewrite paths──► normalize ──► README.md, manifest.json
//! ```

use crate::error::BundleError;
use crate::figures::{is_svg, rewrite_graphics_paths, FigureNamer, FigureRecord, SvgConverter};
use crate::manifest::{sha256_hex, BundleManifest, MAIN_TEX, README_FILE};
use crate::tool::{ProcessToolRunner, ToolRunner};
use pubkit_paper::latex::{LatexOptions, Mode, Normalizer, Venue};
use pubkit_paper::PaperSource;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs for one bundle build
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Markdown source
    pub source: PathBuf,
    /// Bundle directory (created if missing)
    pub out_dir: PathBuf,
    /// Venue and normalization settings
    pub latex: LatexOptions,
    /// Pandoc executable
    pub pandoc: String,
    /// SVG to PNG converter; SVGs are copied unchanged when `None`
    pub svg_converter: Option<SvgConverter>,
    /// Directory for an optional xelatex review PDF
    pub review_pdf: Option<PathBuf>,
    /// Run the normalization pipeline over `main.tex`
    pub normalize: bool,
}

impl BundleOptions {
    /// Defaults for `source`: `submission/<venue>/`, pandoc from `PATH`, normalization on
    pub fn new(source: impl Into<PathBuf>, venue: Venue) -> Self {
        Self {
            source: source.into(),
            out_dir: PathBuf::from("submission").join(venue.as_str()),
            latex: LatexOptions {
                venue,
                ..LatexOptions::default()
            },
            pandoc: "pandoc".to_string(),
            svg_converter: Some(SvgConverter::default()),
            review_pdf: None,
            normalize: true,
        }
    }

    /// Target venue
    #[inline]
    #[must_use]
    pub fn venue(&self) -> Venue {
        self.latex.venue
    }
}

/// Builds submission bundles
#[derive(Clone)]
pub struct Bundler {
    runner: Arc<dyn ToolRunner>,
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler").finish_non_exhaustive()
    }
}

impl Default for Bundler {
    fn default() -> Self {
        Self::new(Arc::new(ProcessToolRunner))
    }
}

impl Bundler {
    /// Create with a custom tool runner
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self { runner }
    }

    /// Regenerate the bundle described by `options`
    ///
    /// Missing figures and a failing review PDF are recorded and logged;
    /// a failing pandoc run is fatal.
    pub async fn build(&self, options: &BundleOptions) -> Result<BundleManifest, BundleError> {
        let source_path = tokio::fs::canonicalize(&options.source)
            .await
            .map_err(|e| BundleError::io_error(&options.source, e))?;
        let source_dir = source_path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let paper = PaperSource::load(&source_path).await?;
        let title = paper.title.clone().unwrap_or_else(|| file_stem(&source_path));
        tracing::info!(source = %source_path.display(), venue = %options.venue(), "building bundle");

        let figures_dir = options.out_dir.join("figures");
        tokio::fs::create_dir_all(&figures_dir)
            .await
            .map_err(|e| BundleError::io_error(&figures_dir, e))?;
        let out_dir = tokio::fs::canonicalize(&options.out_dir)
            .await
            .map_err(|e| BundleError::io_error(&options.out_dir, e))?;

        let (figures, missing) = self.collect_figures(&paper, &source_dir, &out_dir, options).await?;

        let args: Vec<String> = vec![
            source_path.display().to_string(),
            "--from".into(),
            "markdown".into(),
            "--to".into(),
            "latex".into(),
            "--standalone".into(),
            "--output".into(),
            MAIN_TEX.into(),
        ];
        self.runner
            .run(&options.pandoc, &args, &out_dir)
            .await?
            .check(&options.pandoc)?;

        let main_tex = out_dir.join(MAIN_TEX);
        let latex = tokio::fs::read_to_string(&main_tex)
            .await
            .map_err(|e| BundleError::io_error(&main_tex, e))?;
        let rewritten = rewrite_graphics_paths(&latex, &figures);
        if rewritten != latex {
            tokio::fs::write(&main_tex, &rewritten)
                .await
                .map_err(|e| BundleError::io_error(&main_tex, e))?;
        }

        if options.normalize {
            let report = Normalizer::from_options(&options.latex)?
                .normalize_file(&main_tex, Mode::Write)
                .await?;
            tracing::debug!(passes = ?report.passes, "normalized main.tex");
        }

        let final_tex = tokio::fs::read(&main_tex)
            .await
            .map_err(|e| BundleError::io_error(&main_tex, e))?;

        let review_pdf = match &options.review_pdf {
            Some(dir) => self.render_review_pdf(&source_path, &source_dir, dir, options).await,
            None => None,
        };

        let manifest = BundleManifest {
            title,
            venue: options.venue(),
            main_tex: MAIN_TEX.to_string(),
            main_tex_sha256: sha256_hex(&final_tex),
            normalized: options.normalize,
            figures,
            missing,
            readme: README_FILE.to_string(),
            review_pdf,
            generated_at: chrono::Utc::now(),
        };

        let readme = out_dir.join(README_FILE);
        tokio::fs::write(&readme, manifest.render_readme())
            .await
            .map_err(|e| BundleError::io_error(&readme, e))?;
        manifest.write(&out_dir).await?;

        tracing::info!(
            out_dir = %out_dir.display(),
            figures = manifest.figures.len(),
            missing = manifest.missing.len(),
            "bundle written"
        );
        Ok(manifest)
    }

    async fn collect_figures(
        &self,
        paper: &PaperSource,
        source_dir: &Path,
        out_dir: &Path,
        options: &BundleOptions,
    ) -> Result<(Vec<FigureRecord>, Vec<String>), BundleError> {
        let mut namer = FigureNamer::default();
        let mut by_resolved: HashMap<PathBuf, usize> = HashMap::new();
        let mut figures: Vec<FigureRecord> = Vec::new();
        let mut missing = Vec::new();

        for image in &paper.images {
            if image.is_remote() {
                tracing::debug!(path = %image.path, "skipping remote image");
                continue;
            }
            if figures.iter().any(|f| f.source == image.path) || missing.contains(&image.path) {
                continue;
            }
            let resolved = source_dir.join(&image.path);
            if !tokio::fs::try_exists(&resolved).await.unwrap_or(false) {
                tracing::warn!(path = %image.path, "figure not found");
                missing.push(image.path.clone());
                continue;
            }
            // Same file referenced through a different spelling
            if let Some(&index) = by_resolved.get(&resolved) {
                let mut alias = figures[index].clone();
                alias.source.clone_from(&image.path);
                figures.push(alias);
                continue;
            }

            let record = self
                .bundle_figure(&image.path, &resolved, out_dir, &mut namer, options)
                .await?;
            by_resolved.insert(resolved, figures.len());
            figures.push(record);
        }
        Ok((figures, missing))
    }

    async fn bundle_figure(
        &self,
        written: &str,
        resolved: &Path,
        out_dir: &Path,
        namer: &mut FigureNamer,
        options: &BundleOptions,
    ) -> Result<FigureRecord, BundleError> {
        let file_name = resolved
            .file_name()
            .map_or_else(|| "figure".to_string(), |n| n.to_string_lossy().into_owned());

        if is_svg(resolved) {
            if let Some(converter) = &options.svg_converter {
                let png_name = namer.assign(&format!("{}.png", file_stem(resolved)));
                let dest = out_dir.join("figures").join(&png_name);
                let args = converter.args_for(resolved, &dest);
                match self.runner.run(&converter.program, &args, out_dir).await {
                    Ok(output) if output.success() => {
                        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                            return record(written, &png_name, &dest, true).await;
                        }
                        tracing::warn!(path = written, "svg converter wrote no output, copying svg");
                    }
                    Ok(output) => tracing::warn!(
                        path = written,
                        status = ?output.status,
                        stderr = %output.stderr.trim(),
                        "svg conversion failed, copying svg"
                    ),
                    Err(e) => tracing::warn!(path = written, error = %e, "svg converter unavailable, copying svg"),
                }
            }
        }

        let name = namer.assign(&file_name);
        let dest = out_dir.join("figures").join(&name);
        tokio::fs::copy(resolved, &dest)
            .await
            .map_err(|e| BundleError::io_error(resolved, e))?;
        tracing::debug!(from = written, to = %name, "copied figure");
        record(written, &name, &dest, false).await
    }

    async fn render_review_pdf(
        &self,
        source: &Path,
        source_dir: &Path,
        review_dir: &Path,
        options: &BundleOptions,
    ) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(review_dir).await {
            tracing::warn!(dir = %review_dir.display(), error = %e, "cannot create review directory");
            return None;
        }
        let pdf = review_dir.join(format!("{}-{}.pdf", file_stem(source), options.venue()));
        let pdf = if pdf.is_absolute() {
            pdf
        } else {
            std::env::current_dir().map_or(pdf.clone(), |cwd| cwd.join(&pdf))
        };
        let args = vec![
            source.display().to_string(),
            "--from".to_string(),
            "markdown".to_string(),
            "--pdf-engine=xelatex".to_string(),
            "--output".to_string(),
            pdf.display().to_string(),
        ];
        match self.runner.run(&options.pandoc, &args, source_dir).await {
            Ok(output) if output.success() => {
                tracing::info!(pdf = %pdf.display(), "review pdf written");
                Some(pdf)
            }
            Ok(output) => {
                tracing::warn!(status = ?output.status, stderr = %output.stderr.trim(), "review pdf failed");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "review pdf failed");
                None
            }
        }
    }
}

async fn record(written: &str, name: &str, dest: &Path, converted: bool) -> Result<FigureRecord, BundleError> {
    let bytes = tokio::fs::read(dest)
        .await
        .map_err(|e| BundleError::io_error(dest, e))?;
    Ok(FigureRecord {
        source: written.to_string(),
        dest: format!("figures/{name}"),
        sha256: sha256_hex(&bytes),
        converted,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "paper".to_string(), |s| s.to_string_lossy().into_owned())
}
