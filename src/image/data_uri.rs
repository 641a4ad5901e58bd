//! Inline `data:` URIs for image bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{FormError, Result};
use crate::model::image::ImageFormat;

use super::signature::classify;

/// Encode image bytes as `data:<mime>;base64,<payload>`.
///
/// The MIME type comes from sniffing `data`; anything that is not a
/// recognized image fails with [`FormError::UnsupportedImageType`].
pub fn to_data_uri(data: &[u8]) -> Result<String> {
    let format = classify(data)?;
    let mime = format.mime_type();

    let mut uri = String::with_capacity(encoded_len(mime, data.len()));
    uri.push_str("data:");
    uri.push_str(mime);
    uri.push_str(";base64,");
    STANDARD.encode_string(data, &mut uri);
    Ok(uri)
}

/// Decode a data URI produced by [`to_data_uri`] back into its format and bytes.
///
/// The declared MIME type must be one of the recognized image types and
/// must agree with what the decoded bytes sniff as.
pub fn parse_data_uri(uri: &str) -> Result<(ImageFormat, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FormError::InvalidDataUri("missing 'data:' scheme".into()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| FormError::InvalidDataUri("not a base64 data URI".into()))?;

    let declared = ImageFormat::from_mime_type(mime)
        .ok_or_else(|| FormError::InvalidDataUri(format!("unsupported media type '{mime}'")))?;

    let data = STANDARD
        .decode(payload)
        .map_err(|e| FormError::InvalidDataUri(e.to_string()))?;

    let sniffed = classify(&data)?;
    if sniffed != declared {
        return Err(FormError::InvalidDataUri(format!(
            "declared {declared} but content is {sniffed}"
        )));
    }

    Ok((declared, data))
}

/// Exact length of the URI for `len` input bytes.
fn encoded_len(mime: &str, len: usize) -> usize {
    "data:".len() + mime.len() + ";base64,".len() + len.div_ceil(3) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEAD: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_bytes(len: usize) -> Vec<u8> {
        let mut data = PNG_HEAD.to_vec();
        data.extend((0..len.saturating_sub(8)).map(|i| i as u8));
        data
    }

    #[test]
    fn test_prefix_and_payload() {
        let data = png_bytes(12);
        let uri = to_data_uri(&data).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(&uri["data:image/png;base64,".len()..], STANDARD.encode(&data));
    }

    #[test]
    fn test_length_matches_formula() {
        for len in [12, 13, 14, 15, 100] {
            let data = png_bytes(len);
            let uri = to_data_uri(&data).unwrap();
            assert_eq!(uri.len(), "data:image/png;base64,".len() + len.div_ceil(3) * 4);
            assert_eq!(uri.len(), encoded_len("image/png", len));
        }
    }

    #[test]
    fn test_uses_standard_padded_alphabet() {
        // 0xFB 0xFF encodes to "+/8=" in the standard alphabet.
        let mut data = png_bytes(12);
        data.extend_from_slice(&[0xFB, 0xFF]);
        let uri = to_data_uri(&data).unwrap();
        assert!(uri.ends_with('='));
        assert!(!uri.contains('-') && !uri.contains('_'));
    }

    #[test]
    fn test_unsupported_propagates() {
        assert!(matches!(
            to_data_uri(b"plain text, not an image"),
            Err(FormError::UnsupportedImageType)
        ));
    }

    #[test]
    fn test_parse_round_trip() {
        let data = png_bytes(40);
        let uri = to_data_uri(&data).unwrap();
        let (format, decoded) = parse_data_uri(&uri).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_parse_rejects_mismatched_type() {
        let data = png_bytes(40);
        let uri = format!("data:image/gif;base64,{}", STANDARD.encode(&data));
        assert!(matches!(
            parse_data_uri(&uri),
            Err(FormError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_data_uri("http://example.com/a.png").is_err());
        assert!(parse_data_uri("data:image/png,rawdata").is_err());
        assert!(parse_data_uri("data:text/plain;base64,aGk=").is_err());
        assert!(parse_data_uri("data:image/png;base64,@@@").is_err());
    }
}
