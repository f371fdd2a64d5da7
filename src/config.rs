use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory generated images are written to.
pub const DEFAULT_OUTDIR: &str = "outputs/img-samples";

/// Top-level configuration for dream-png.
///
/// Built once and handed to [`PngWriter::new`](crate::pipeline::PngWriter::new);
/// nothing in the crate falls back to the current directory on its own.
///
/// # Loading
///
/// ```rust,no_run
/// use dream_png::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.outdir = "renders".into();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory output images are named in, written to, and read back from.
    pub outdir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from(DEFAULT_OUTDIR),
        }
    }
}

impl Config {
    /// Create a config for the given output directory.
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self { outdir: outdir.into() }
    }

    /// `config.json` beside the running executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Cannot locate the dream-png executable")?;
        match exe.parent() {
            Some(dir) => Ok(dir.join("config.json")),
            None => anyhow::bail!("Executable {} has no parent directory", exe.display()),
        }
    }

    /// Read the config from `path` (or [`Config::config_path`]).
    ///
    /// A missing file is not an error: the defaults are used, so images go to
    /// [`DEFAULT_OUTDIR`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve(path)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                log::warn!(
                    "No config at {}, writing images to {}",
                    path.display(),
                    config.outdir.display()
                );
                return Ok(config);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot read config {}", path.display()));
            }
        };

        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Config {} is not valid JSON", path.display()))?;
        log::debug!("Output directory from {}: {}", path.display(), config.outdir.display());
        Ok(config)
    }

    /// Write the config as pretty JSON to `path` (or [`Config::config_path`]).
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = Self::resolve(path)?;
        let json = serde_json::to_string_pretty(self).context("Cannot encode config as JSON")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Cannot write config {}", path.display()))?;
        log::info!("Saved config to {} (outdir {})", path.display(), self.outdir.display());
        Ok(())
    }

    fn resolve(path: Option<&Path>) -> Result<PathBuf> {
        path.map_or_else(Self::config_path, |p| Ok(p.to_path_buf()))
    }
}
