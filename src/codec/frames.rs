use std::path::Path;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Column width used by MIME-style base64 line folding.
pub const BASE64_LINE_WIDTH: usize = 76;

/// Insignificant formatting stripped from frames before diffing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Frames are compared exactly as given.
    None,
    /// Line breaks inside base64 payloads are ignored (RFC 4648 section 3.1).
    #[default]
    Base64LineFolding,
}

impl Normalization {
    /// Apply the normalization to one frame.
    pub fn apply(self, frame: &str) -> String {
        match self {
            Self::None => frame.to_owned(),
            Self::Base64LineFolding => normalize_base64(frame),
        }
    }
}

/// Encoded image format of a captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF.
    Gif,
    /// WebP.
    WebP,
    /// BMP.
    Bmp,
    /// SVG document.
    Svg,
}

impl FrameFormat {
    /// MIME type used in the frame's data URI.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Detect the format from encoded bytes, falling back to the file extension.
    pub fn detect(bytes: &[u8], path: Option<&Path>) -> FlipbookResult<Self> {
        if let Ok(fmt) = image::guess_format(bytes) {
            match fmt {
                image::ImageFormat::Png => return Ok(Self::Png),
                image::ImageFormat::Jpeg => return Ok(Self::Jpeg),
                image::ImageFormat::Gif => return Ok(Self::Gif),
                image::ImageFormat::WebP => return Ok(Self::WebP),
                image::ImageFormat::Bmp => return Ok(Self::Bmp),
                _ => {}
            }
        }
        if looks_like_svg(bytes) {
            return Ok(Self::Svg);
        }
        let ext = path
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("svg") => Ok(Self::Svg),
            Some("png") => Ok(Self::Png),
            Some("jpg" | "jpeg") => Ok(Self::Jpeg),
            Some("gif") => Ok(Self::Gif),
            Some("webp") => Ok(Self::WebP),
            Some("bmp") => Ok(Self::Bmp),
            _ => Err(FlipbookError::validation(match path {
                Some(p) => format!("cannot detect frame format of '{}'", p.display()),
                None => "cannot detect frame format".to_owned(),
            })),
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    String::from_utf8_lossy(head).contains("<svg")
}

/// Encode raw frame bytes as a `data:<mime>;base64,<payload>` URI (unfolded).
pub fn encode_frame(bytes: &[u8], format: FrameFormat) -> String {
    format!("data:{};base64,{}", format.mime(), STANDARD.encode(bytes))
}

/// Read a frame file from disk and encode it as a data URI.
pub fn encode_frame_file(path: &Path) -> FlipbookResult<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read frame '{}'", path.display()))?;
    let format = FrameFormat::detect(&bytes, Some(path))?;
    Ok(encode_frame(&bytes, format))
}

/// Split a base64 data URI into its MIME type and decoded payload.
pub fn decode_frame(uri: &str) -> FlipbookResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FlipbookError::validation("frame is not a data URI"))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| FlipbookError::validation("frame data URI is not base64-encoded"))?;
    let bytes = STANDARD
        .decode(normalize_base64(payload))
        .context("decode base64 frame payload")?;
    Ok((mime.to_owned(), bytes))
}

/// Remove line folding from a base64 document.
pub fn normalize_base64(doc: &str) -> String {
    doc.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Re-fold a base64 document into `width`-column lines, leaving the first `offset` characters
/// (e.g. a data URI prefix) unfolded.
pub fn rewrap_base64(doc: &str, offset: usize, width: usize) -> String {
    let flat = normalize_base64(doc);
    if width == 0 {
        return flat;
    }
    let split = flat
        .char_indices()
        .nth(offset)
        .map_or(flat.len(), |(idx, _)| idx);
    let (prefix, payload) = flat.split_at(split);

    let chars: Vec<char> = payload.chars().collect();
    let lines: Vec<String> = chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect();
    format!("{prefix}{}", lines.join("\n"))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/frames.rs"]
mod tests;
