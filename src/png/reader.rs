use img_parts::Bytes;
use img_parts::png::Png;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::{DREAM_KEY, SD_METADATA_KEY, text};
use crate::error::{Error, Result};

/// Prompt and generation parameters recovered from a dream PNG.
///
/// Serializes as `{"sd-metadata": ..., "Dream": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DreamMetadata {
    #[serde(rename = "sd-metadata")]
    pub sd_metadata: Value,
    #[serde(rename = "Dream")]
    pub dream: String,
}

/// Read every text entry stored in a PNG file.
pub fn read_text_chunks(path: &Path) -> Result<HashMap<String, String>> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let png = Png::from_bytes(Bytes::from(bytes)).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text::collect_text(&png))
}

/// Read the `sd-metadata` and `Dream` entries from a PNG file.
///
/// A missing `sd-metadata` reads as `{}` and a missing `Dream` as `""`.
pub fn retrieve_metadata(path: &Path) -> Result<DreamMetadata> {
    let mut entries = read_text_chunks(path)?;

    let raw = entries.remove(SD_METADATA_KEY);
    if raw.is_none() {
        log::debug!("No {SD_METADATA_KEY} entry in {}", path.display());
    }
    let sd_metadata = serde_json::from_str(raw.as_deref().unwrap_or("{}")).map_err(|source| {
        Error::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let dream = entries.remove(DREAM_KEY).unwrap_or_default();

    Ok(DreamMetadata { sd_metadata, dream })
}
