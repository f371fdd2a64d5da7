//! # dream-png
//!
//! Sequential output naming and prompt metadata for generated PNG images.
//!
//! Generated images land flat in one output directory as
//! `<prefix>.<suffix>.png`, where the prefix is a six-digit counter. The
//! prompt and the generation parameters travel inside the PNG itself as two
//! text entries, `Dream` and `sd-metadata`, so the file alone is enough to
//! reproduce it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dream_png::config::Config;
//! use dream_png::naming::output_filename;
//! use dream_png::pipeline::PngWriter;
//! use serde_json::json;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Creates the output directory if it doesn't exist
//!     let writer = PngWriter::new(&Config::load(Some("config.json".as_ref()))?)?;
//!
//!     let image = image::open("render.png")?;
//!     let name = output_filename(&writer.unique_prefix()?, "42");
//!     let path = writer.save_image_and_prompt_to_png(
//!         &image,
//!         "\"a cat\" -s50 -S42",
//!         &json!({"steps": 50, "seed": 42}),
//!         &name,
//!     )?;
//!
//!     let all = dream_png::png::retrieve_metadata(&path)?;
//!     println!("{} was made from {:?}", path.display(), all.dream);
//!     Ok(())
//! }
//! ```
//!
//! ## Limitations
//!
//! Prefixes come from scanning the directory, not from a lock or counter
//! file. Two processes writing into the same directory at once can end up
//! with the same prefix.
//!
//! ## Modules
//!
//! - [`config`] — Configuration types and loading/saving
//! - [`error`] — Error type shared by every operation
//! - [`naming`] — Next-prefix scan and output filename convention
//! - [`png`] — `Dream`/`sd-metadata` text chunk writing and reading
//! - [`pipeline`] — [`PngWriter`](pipeline::PngWriter) bound to an output directory, PNG collection

pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod png;

pub use error::{Error, Result};
