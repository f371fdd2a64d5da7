use image::{DynamicImage, ImageFormat};
use img_parts::Bytes;
use img_parts::png::Png;
use serde::Serialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::{DREAM_KEY, SD_METADATA_KEY, text};
use crate::error::{Error, Result};

/// Save `image` as a PNG at `dir/name`, embedding the prompt and metadata.
///
/// `prompt` is stored verbatim under `Dream`; `metadata` is JSON-encoded and
/// stored under `sd-metadata`. An existing file at the target is overwritten.
/// Returns the full path written.
pub fn save_image_and_prompt_to_png<M: Serialize + ?Sized>(
    dir: &Path,
    image: &DynamicImage,
    prompt: &str,
    metadata: &M,
    name: &str,
) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string(metadata).map_err(Error::Serialize)?;

    let mut encoded = Vec::new();
    image.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

    // The encoder output is always a well-formed PNG
    let mut png = Png::from_bytes(Bytes::from(encoded)).map_err(|source| Error::Decode {
        path: path.clone(),
        source,
    })?;
    text::insert_before_idat(
        &mut png,
        vec![
            text::text_chunk(DREAM_KEY, prompt),
            text::text_chunk(SD_METADATA_KEY, &json),
        ],
    );

    std::fs::write(&path, png.encoder().bytes()).map_err(|e| Error::io(&path, e))?;

    log::debug!("Wrote {}", path.display());
    Ok(path)
}
