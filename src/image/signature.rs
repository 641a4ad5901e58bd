//! Magic-number table and image classification.

use crate::error::{FormError, Result};
use crate::model::image::ImageFormat;

/// Shortest buffer every signature check can be run against.
/// The deepest range read is bytes 8..12 (`WEBP`).
pub const MIN_SNIFF_LEN: usize = 12;

/// A conjunction of byte ranges: every `(offset, bytes)` pair must match.
#[derive(Debug, Clone, Copy)]
pub struct Pattern(pub &'static [(usize, &'static [u8])]);

/// One table entry: a format and its alternative patterns (any may match).
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub format: ImageFormat,
    pub patterns: &'static [Pattern],
}

/// Signatures in priority order. The first entry with a matching pattern wins.
pub static SIGNATURES: &[Signature] = &[
    Signature {
        format: ImageFormat::Png,
        patterns: &[Pattern(&[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])])],
    },
    Signature {
        format: ImageFormat::Jpeg,
        patterns: &[
            Pattern(&[(0, &[0xFF, 0xD8, 0xFF])]),
            Pattern(&[(6, b"JFIF")]),
            Pattern(&[(6, b"Exif")]),
        ],
    },
    Signature {
        format: ImageFormat::Gif,
        patterns: &[Pattern(&[(0, b"GIF87a")]), Pattern(&[(0, b"GIF89a")])],
    },
    Signature {
        format: ImageFormat::Webp,
        patterns: &[Pattern(&[(0, b"RIFF"), (8, b"WEBP")])],
    },
];

impl Pattern {
    /// `true` if every range of the pattern is present in `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.0
            .iter()
            .all(|&(offset, expected)| data.get(offset..offset + expected.len()) == Some(expected))
    }
}

impl Signature {
    pub fn matches(&self, data: &[u8]) -> bool {
        self.patterns.iter().any(|p| p.matches(data))
    }
}

/// Identify the image format of `data` from its leading bytes.
///
/// Buffers shorter than [`MIN_SNIFF_LEN`] are rejected up front, so a
/// truncated header never matches partially.
pub fn classify(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < MIN_SNIFF_LEN {
        tracing::trace!(len = data.len(), "Buffer too short to sniff");
        return Err(FormError::UnsupportedImageType);
    }

    match SIGNATURES.iter().find(|sig| sig.matches(data)) {
        Some(sig) => {
            tracing::trace!(len = data.len(), format = %sig.format, "Sniffed image");
            Ok(sig.format)
        }
        None => {
            tracing::trace!(len = data.len(), "No image signature matched");
            Err(FormError::UnsupportedImageType)
        }
    }
}

/// Like [`classify`], returning the MIME type string directly.
pub fn image_mime_type(data: &[u8]) -> Result<&'static str> {
    classify(data).map(ImageFormat::mime_type)
}
