use flate2::read::ZlibDecoder;
use img_parts::Bytes;
use img_parts::png::{Png, PngChunk};
use std::collections::HashMap;
use std::io::Read;

const TEXT: [u8; 4] = *b"tEXt";
const ITXT: [u8; 4] = *b"iTXt";
const ZTXT: [u8; 4] = *b"zTXt";
const IDAT: [u8; 4] = *b"IDAT";

// Only zlib/deflate is defined for PNG text compression
const COMPRESSION_DEFLATE: u8 = 0;
// Cap on inflated text, guards against decompression bombs
const MAX_INFLATED_LEN: u64 = 8 * 1024 * 1024;

/// Build a text chunk for `key = value`.
///
/// Latin-1 values go into a plain `tEXt` chunk. Anything else is stored as an
/// uncompressed UTF-8 `iTXt` chunk with no language tag.
pub(crate) fn text_chunk(key: &str, value: &str) -> PngChunk {
    match (to_latin1(key), to_latin1(value)) {
        (Some(key), Some(value)) => {
            let mut contents = Vec::with_capacity(key.len() + 1 + value.len());
            contents.extend_from_slice(&key);
            contents.push(0);
            contents.extend_from_slice(&value);
            PngChunk::new(TEXT, Bytes::from(contents))
        }
        _ => {
            // keyword \0 compression-flag compression-method language \0 translated-keyword \0 text
            let mut contents = Vec::with_capacity(key.len() + 5 + value.len());
            contents.extend_from_slice(key.as_bytes());
            contents.extend_from_slice(&[0, 0, 0, 0, 0]);
            contents.extend_from_slice(value.as_bytes());
            PngChunk::new(ITXT, Bytes::from(contents))
        }
    }
}

/// Insert chunks ahead of the image data.
pub(crate) fn insert_before_idat(png: &mut Png, chunks: Vec<PngChunk>) {
    let chunks_mut = png.chunks_mut();
    // IHDR is always first, so fall back to just after it
    let pos = chunks_mut
        .iter()
        .position(|c| c.kind() == IDAT)
        .unwrap_or(1usize.min(chunks_mut.len()));
    for (offset, chunk) in chunks.into_iter().enumerate() {
        chunks_mut.insert(pos + offset, chunk);
    }
}

/// Collect every readable text entry in the PNG.
///
/// Later chunks override earlier ones with the same keyword. Compressed
/// entries are inflated; chunks that can't be parsed or inflated are skipped.
pub(crate) fn collect_text(png: &Png) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for chunk in png.chunks() {
        let parsed = match chunk.kind() {
            TEXT => parse_text(chunk.contents()),
            ITXT => parse_itxt(chunk.contents()),
            ZTXT => parse_ztxt(chunk.contents()),
            _ => continue,
        };
        if let Some((key, value)) = parsed {
            entries.insert(key, value);
        }
    }
    entries
}

fn parse_text(contents: &[u8]) -> Option<(String, String)> {
    let Some(nul) = contents.iter().position(|&b| b == 0) else {
        log::debug!("Skipping tEXt chunk without keyword separator");
        return None;
    };
    Some((from_latin1(&contents[..nul]), from_latin1(&contents[nul + 1..])))
}

fn parse_itxt(contents: &[u8]) -> Option<(String, String)> {
    let nul = contents.iter().position(|&b| b == 0)?;
    let key = from_latin1(&contents[..nul]);
    let rest = &contents[nul + 1..];
    let [flag, method, rest @ ..] = rest else {
        log::debug!("Skipping truncated iTXt chunk {key:?}");
        return None;
    };
    // language tag, then translated keyword
    let lang_end = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_end + 1..];
    let translated_end = rest.iter().position(|&b| b == 0)?;
    let text = &rest[translated_end + 1..];

    let text = match (*flag, *method) {
        (0, _) => text.to_vec(),
        (1, COMPRESSION_DEFLATE) => inflate(&key, text)?,
        _ => {
            log::debug!("Skipping iTXt chunk {key:?} with unknown compression {flag}/{method}");
            return None;
        }
    };
    Some((key, String::from_utf8_lossy(&text).into_owned()))
}

fn parse_ztxt(contents: &[u8]) -> Option<(String, String)> {
    let Some(nul) = contents.iter().position(|&b| b == 0) else {
        log::debug!("Skipping zTXt chunk without keyword separator");
        return None;
    };
    let key = from_latin1(&contents[..nul]);
    let [method, data @ ..] = &contents[nul + 1..] else {
        log::debug!("Skipping truncated zTXt chunk {key:?}");
        return None;
    };
    if *method != COMPRESSION_DEFLATE {
        log::debug!("Skipping zTXt chunk {key:?} with unknown compression {method}");
        return None;
    }
    let text = inflate(&key, data)?;
    Some((key, from_latin1(&text)))
}

fn inflate(key: &str, data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut decoder = ZlibDecoder::new(data).take(MAX_INFLATED_LEN + 1);
    if let Err(e) = decoder.read_to_end(&mut out) {
        log::debug!("Skipping text chunk {key:?}, could not inflate: {e}");
        return None;
    }
    if out.len() as u64 > MAX_INFLATED_LEN {
        log::debug!("Skipping text chunk {key:?}, inflated text exceeds {MAX_INFLATED_LEN} bytes");
        return None;
    }
    Some(out)
}

fn to_latin1(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

fn from_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
