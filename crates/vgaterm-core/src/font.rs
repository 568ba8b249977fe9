//! Raw VGA bitmap fonts.
//!
//! A font is 256 glyphs of `width * height` bits each, stored row-major,
//! one bit per pixel, most significant bit leftmost. Raw font files carry no
//! header; the glyph size is inferred from the file length.

use std::fmt;
use std::path::Path;

/// Number of glyphs in a VGA font.
pub const GLYPHS: usize = 256;

/// Errors from font loading and patching.
#[derive(Debug)]
pub enum FontError {
    /// Glyph dimensions that do not describe whole bytes.
    InvalidDimensions { width: u8, height: u8 },
    /// Fewer bytes than the glyph range needs.
    TooShort { expected: usize, actual: usize },
    /// No `(w, 2w)` glyph size matches the data length.
    UndetectedSize { len: usize },
    /// Glyph range past the end of the font.
    OutOfRange { start: u8, count: usize },
    /// The font file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid glyph size {width}x{height}")
            }
            Self::TooShort { expected, actual } => {
                write!(f, "font data too short: need {expected} bytes, got {actual}")
            }
            Self::UndetectedSize { len } => {
                write!(f, "cannot infer glyph size from {len} bytes")
            }
            Self::OutOfRange { start, count } => {
                write!(f, "glyph range {start}+{count} exceeds {GLYPHS} glyphs")
            }
            Self::Io(err) => write!(f, "cannot read font file: {err}"),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FontError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Infer `(width, height)` from a raw font length.
///
/// The glyph is assumed to be twice as tall as it is wide; 4096 bytes gives
/// the standard 8x16 VGA font.
#[must_use]
pub fn detect_dimensions(len: usize) -> Option<(u8, u8)> {
    let bits = (len / GLYPHS) * 8;
    (1..=64usize)
        .find(|w| 2 * w * w == bits)
        .map(|w| (w as u8, (2 * w) as u8))
}

/// A loaded 256-glyph bitmap font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    width: u8,
    height: u8,
    data: Vec<u8>,
}

/// A blank 8x16 font. No glyph bitmaps ship with the crate; hosts install
/// real glyphs through [`Font::from_file`] or the font commands.
impl Default for Font {
    fn default() -> Self {
        Self {
            width: 8,
            height: 16,
            data: vec![0; 16 * GLYPHS],
        }
    }
}

impl Font {
    /// An all-blank font of the given size.
    pub fn blank(width: u8, height: u8) -> Result<Self, FontError> {
        let bpg = glyph_bytes(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; bpg * GLYPHS],
        })
    }

    /// Build a font from data describing all 256 glyphs.
    ///
    /// Extra trailing bytes are ignored.
    pub fn load(data: &[u8], width: u8, height: u8) -> Result<Self, FontError> {
        let bpg = glyph_bytes(width, height)?;
        let expected = bpg * GLYPHS;
        if data.len() < expected {
            return Err(FontError::TooShort {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data: data[..expected].to_vec(),
        })
    }

    /// Build a font from raw data, inferring the glyph size.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FontError> {
        let (width, height) =
            detect_dimensions(data.len()).ok_or(FontError::UndetectedSize { len: data.len() })?;
        Self::load(data, width, height)
    }

    /// Read a raw font file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_bytes(&data).inspect_err(|err| {
            tracing::warn!(path = %path.display(), %err, "rejected font file");
        })
    }

    /// Overwrite `count` glyphs starting at `start`.
    ///
    /// On error the font is unchanged.
    pub fn patch_range(&mut self, data: &[u8], start: u8, count: usize) -> Result<(), FontError> {
        if usize::from(start) + count > GLYPHS {
            return Err(FontError::OutOfRange { start, count });
        }
        let bpg = self.bytes_per_glyph();
        let len = bpg * count;
        if data.len() < len {
            return Err(FontError::TooShort {
                expected: len,
                actual: data.len(),
            });
        }
        let at = usize::from(start) * bpg;
        self.data[at..at + len].copy_from_slice(&data[..len]);
        Ok(())
    }

    /// Glyph width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Glyph height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Bytes per glyph.
    #[inline]
    #[must_use]
    pub fn bytes_per_glyph(&self) -> usize {
        usize::from(self.width) * usize::from(self.height) / 8
    }

    /// Bitmap for one character.
    #[must_use]
    pub fn glyph(&self, c: u8) -> &[u8] {
        let bpg = self.bytes_per_glyph();
        let at = usize::from(c) * bpg;
        &self.data[at..at + bpg]
    }

    /// The whole bitmap.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

fn glyph_bytes(width: u8, height: u8) -> Result<usize, FontError> {
    let bits = usize::from(width) * usize::from(height);
    if bits == 0 || bits % 8 != 0 {
        return Err(FontError::InvalidDimensions { width, height });
    }
    Ok(bits / 8)
}
