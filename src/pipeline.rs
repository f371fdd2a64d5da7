use image::DynamicImage;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::naming;
use crate::png;

/// Names, writes, and reads dream PNGs in one output directory.
///
/// The output directory is created when the writer is built. Every operation
/// after that is a single synchronous filesystem call; the writer holds no
/// other state.
///
/// # Example
///
/// ```rust,no_run
/// use dream_png::config::Config;
/// use dream_png::pipeline::PngWriter;
/// use serde_json::json;
///
/// let writer = PngWriter::new(&Config::new("outputs/img-samples"))?;
/// let image = image::open("render.png")?;
///
/// let prefix = writer.unique_prefix()?;
/// let name = dream_png::naming::output_filename(&prefix, "42");
/// let path = writer.save_image_and_prompt_to_png(&image, "a cat", &json!({"seed": 42}), &name)?;
/// println!("Saved {}", path.display());
///
/// let metadata = writer.retrieve_metadata(&name)?;
/// assert_eq!(metadata["seed"], 42);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PngWriter {
    outdir: PathBuf,
}

impl PngWriter {
    /// Bind a writer to `config.outdir`, creating the directory if needed.
    pub fn new(config: &Config) -> Result<Self> {
        let outdir = config.outdir.clone();
        std::fs::create_dir_all(&outdir).map_err(|e| Error::io(&outdir, e))?;
        Ok(Self { outdir })
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Next unused numeric prefix in the output directory.
    ///
    /// See [`naming::unique_prefix`]; concurrent writers may race.
    pub fn unique_prefix(&self) -> Result<String> {
        naming::unique_prefix(&self.outdir)
    }

    /// Save `image` to `<outdir>/<name>` with its prompt and metadata.
    pub fn save_image_and_prompt_to_png<M: Serialize + ?Sized>(
        &self,
        image: &DynamicImage,
        prompt: &str,
        metadata: &M,
        name: &str,
    ) -> Result<PathBuf> {
        png::save_image_and_prompt_to_png(&self.outdir, image, prompt, metadata, name)
    }

    /// Return the `sd-metadata` stored in `<outdir>/<basename>`.
    ///
    /// The prompt is dropped; use [`png::retrieve_metadata`] to get both.
    pub fn retrieve_metadata(&self, basename: &str) -> Result<Value> {
        let all = png::retrieve_metadata(&self.outdir.join(basename))?;
        Ok(all.sd_metadata)
    }
}

/// Collect PNG files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks) and results are sorted by path.
pub fn collect_pngs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_png(path) {
                images.push(path.clone());
            } else {
                log::warn!("Skipping non-PNG file: {}", path.display());
            }
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_png(p))
                .collect();
            found.sort();
            images.extend(found);
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Check if a file has a `.png` extension (any case).
fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}
