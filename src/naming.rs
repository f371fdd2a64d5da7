//! Sequential output filenames.
//!
//! Generated images are stored flat in one directory and named
//! `<prefix>.<suffix>.png`, where the prefix is a zero-padded counter:
//!
//! - `000001.1234567.png`
//! - `000002.42.png`
//!
//! [`unique_prefix`] scans the directory for the highest existing counter and
//! returns the next one. The scan is not atomic: two processes naming files in
//! the same directory at the same time can both receive the same prefix. This
//! is a single-writer convenience, not a lock.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Width the numeric prefix is zero-padded to.
pub const PREFIX_WIDTH: usize = 6;

// `<digits>.<anything>.png`, extension in any case.
static OUTPUT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\..*\.(?i:png)$").expect("output name pattern is valid")
});

/// Return the next unused numeric prefix in `dir`.
///
/// Yields `"000001"` when nothing in the directory looks like an output file.
pub fn unique_prefix(dir: &Path) -> Result<String> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    // (prefix, filename) of the highest output seen so far
    let mut highest: Option<(u64, String)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(n) = parse_prefix(name)? {
            if highest.as_ref().is_none_or(|(h, _)| n > *h) {
                highest = Some((n, name.to_string()));
            }
        }
    }

    let next = match highest {
        None => 1,
        Some((n, name)) => n.checked_add(1).ok_or(Error::PrefixExhausted { name })?,
    };
    log::debug!("Next prefix in {} is {next}", dir.display());
    Ok(format_prefix(next))
}

/// Parse the leading counter of an output filename.
///
/// Returns `Ok(None)` for names that don't follow the output convention.
pub fn parse_prefix(name: &str) -> Result<Option<u64>> {
    let Some(caps) = OUTPUT_NAME.captures(name) else {
        return Ok(None);
    };
    caps[1]
        .parse::<u64>()
        .map(Some)
        .map_err(|source| Error::Prefix { name: name.to_string(), source })
}

/// Zero-pad a counter to [`PREFIX_WIDTH`] digits.
pub fn format_prefix(n: u64) -> String {
    format!("{n:0width$}", width = PREFIX_WIDTH)
}

/// Build `<prefix>.<suffix>.png`.
pub fn output_filename(prefix: &str, suffix: &str) -> String {
    format!("{prefix}.{suffix}.png")
}
