//! Prompt metadata stored in PNG text chunks.
//!
//! This module provides two main functions:
//!
//! - [`save_image_and_prompt_to_png`] — Encode an image as PNG with `Dream` and `sd-metadata` entries
//! - [`retrieve_metadata`] — Read those two entries back from any PNG
//!
//! The entries are ordinary PNG text chunks, so any tool that understands
//! `tEXt`/`iTXt` can inspect them without this crate. Reading also accepts
//! entries another tool re-saved compressed (`zTXt`, compressed `iTXt`).

mod reader;
mod text;
mod writer;

pub use reader::{DreamMetadata, read_text_chunks, retrieve_metadata};
pub use writer::save_image_and_prompt_to_png;

/// Text key holding the free-form prompt.
pub const DREAM_KEY: &str = "Dream";
/// Text key holding the JSON-encoded generation parameters.
pub const SD_METADATA_KEY: &str = "sd-metadata";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use image::{DynamicImage, Rgb, RgbImage};
    use img_parts::png::{Png, PngChunk};
    use serde_json::json;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([200, 10, 30])))
    }

    #[test]
    fn save_then_retrieve() {
        let dir = TempDir::new().unwrap();
        let metadata = json!({"steps": 50, "seed": 42});

        let path =
            save_image_and_prompt_to_png(dir.path(), &sample_image(), "a cat", &metadata, "000006.0.png")
                .unwrap();
        assert_eq!(path, dir.path().join("000006.0.png"));

        let md = retrieve_metadata(&path).unwrap();
        assert_eq!(md.sd_metadata, metadata);
        assert_eq!(md.dream, "a cat");
    }

    #[test]
    fn saved_file_is_still_a_decodable_image() {
        let dir = TempDir::new().unwrap();
        let path =
            save_image_and_prompt_to_png(dir.path(), &sample_image(), "x", &json!({}), "a.0.png").unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
        assert_eq!(img.to_rgb8().get_pixel(0, 0), &Rgb([200, 10, 30]));
    }

    #[test]
    fn serializes_as_keyed_object() {
        let md = DreamMetadata {
            sd_metadata: json!({"seed": 1}),
            dream: "p".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&md).unwrap(),
            json!({"sd-metadata": {"seed": 1}, "Dream": "p"})
        );
    }

    #[test]
    fn nested_metadata_and_wide_prompt() {
        let dir = TempDir::new().unwrap();
        let metadata = json!({
            "model": "stable diffusion",
            "image": {"prompt": [{"prompt": "猫", "weight": 1.0}], "cfg_scale": 7.5},
            "variations": [],
            "init_img": null,
        });
        let prompt = "\"a cat\" -s50 -W512 -H512 -C7.5 -Ak_lms -S42 猫";

        let path =
            save_image_and_prompt_to_png(dir.path(), &sample_image(), prompt, &metadata, "000001.42.png")
                .unwrap();
        let md = retrieve_metadata(&path).unwrap();
        assert_eq!(md.sd_metadata, metadata);
        assert_eq!(md.dream, prompt);
    }

    #[test]
    fn retrieve_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let path = save_image_and_prompt_to_png(
            dir.path(),
            &sample_image(),
            "same",
            &json!({"seed": 7}),
            "000001.7.png",
        )
        .unwrap();
        assert_eq!(retrieve_metadata(&path).unwrap(), retrieve_metadata(&path).unwrap());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let name = "000002.0.png";
        save_image_and_prompt_to_png(dir.path(), &sample_image(), "first", &json!({"n": 1}), name).unwrap();
        let path =
            save_image_and_prompt_to_png(dir.path(), &sample_image(), "second", &json!({"n": 2}), name)
                .unwrap();

        let md = retrieve_metadata(&path).unwrap();
        assert_eq!(md.dream, "second");
        assert_eq!(md.sd_metadata, json!({"n": 2}));
    }

    #[test]
    fn plain_png_has_empty_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.png");
        sample_image().save(&path).unwrap();

        let md = retrieve_metadata(&path).unwrap();
        assert_eq!(md.sd_metadata, json!({}));
        assert_eq!(md.dream, "");
        assert!(read_text_chunks(&path).unwrap().is_empty());
    }

    /// Write a plain PNG, then splice `chunks` in ahead of its image data.
    fn png_with_chunks(dir: &TempDir, name: &str, chunks: Vec<PngChunk>) -> PathBuf {
        let path = dir.path().join(name);
        sample_image().save(&path).unwrap();
        let mut png = Png::from_bytes(fs::read(&path).unwrap().into()).unwrap();
        text::insert_before_idat(&mut png, chunks);
        fs::write(&path, png.encoder().bytes()).unwrap();
        path
    }

    fn ztxt(key: &str, value: &str) -> PngChunk {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(value.as_bytes()).unwrap();
        let mut contents = key.as_bytes().to_vec();
        contents.extend_from_slice(&[0, 0]);
        contents.extend(encoder.finish().unwrap());
        PngChunk::new(*b"zTXt", contents.into())
    }

    #[test]
    fn invalid_stored_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = png_with_chunks(
            &dir,
            "broken.png",
            vec![text::text_chunk(SD_METADATA_KEY, "{not json")],
        );

        let err = retrieve_metadata(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn compressed_entries_are_read() {
        let dir = TempDir::new().unwrap();
        let path = png_with_chunks(
            &dir,
            "000001.0.png",
            vec![ztxt(SD_METADATA_KEY, r#"{"seed":42}"#), ztxt(DREAM_KEY, "a cat")],
        );

        let md = retrieve_metadata(&path).unwrap();
        assert_eq!(md.sd_metadata, json!({"seed": 42}));
        assert_eq!(md.dream, "a cat");
    }

    #[test]
    fn entries_after_image_data_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("000001.0.png");
        sample_image().save(&path).unwrap();
        let mut png = Png::from_bytes(fs::read(&path).unwrap().into()).unwrap();
        // just before IEND
        let end = png.chunks().len() - 1;
        png.chunks_mut().insert(end, text::text_chunk(DREAM_KEY, "late prompt"));
        fs::write(&path, png.encoder().bytes()).unwrap();

        assert_eq!(retrieve_metadata(&path).unwrap().dream, "late prompt");
    }

    #[test]
    fn non_png_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let err = retrieve_metadata(&path).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = retrieve_metadata(&dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn unwritable_target_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = save_image_and_prompt_to_png(
            &dir.path().join("no-such-dir"),
            &sample_image(),
            "p",
            &json!({}),
            "000001.0.png",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn unserializable_metadata_is_a_serialize_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);

        let dir = TempDir::new().unwrap();
        let err = save_image_and_prompt_to_png(dir.path(), &sample_image(), "p", &bad, "000001.0.png")
            .unwrap_err();
        assert!(matches!(err, Error::Serialize(_)));
        assert!(!dir.path().join("000001.0.png").exists());
    }
}
