//! DTD Source Encoding Detection and Conversion
//!
//! DTDs shipped with editors are usually ASCII or UTF-8, but external
//! subsets saved by Windows tools come as UTF-16 with a BOM. Everything is
//! converted to UTF-8 before the scanner sees it.

use super::error::{DtdError, Result};

/// Encoding of a DTD source, detected from BOM or byte patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl SourceEncoding {
    /// Detect encoding from byte order mark or initial bytes
    pub fn detect(input: &[u8]) -> Self {
        if input.len() < 2 {
            return SourceEncoding::Utf8;
        }

        match (input[0], input[1]) {
            (0xFF, 0xFE) => SourceEncoding::Utf16Le,
            (0xFE, 0xFF) => SourceEncoding::Utf16Be,
            // A DTD almost always starts with "<!" or "%" - in UTF-16 without
            // BOM that shows up as an interleaved NUL.
            (0x00, b'<') | (0x00, b'%') => SourceEncoding::Utf16Be,
            (b'<', 0x00) | (b'%', 0x00) => SourceEncoding::Utf16Le,
            _ => SourceEncoding::Utf8,
        }
    }
}

/// Convert raw DTD bytes to a UTF-8 string.
///
/// A UTF-8 BOM is stripped. Invalid UTF-8 is replaced rather than rejected;
/// names are the only thing the engine cares about and those are ASCII in
/// every real-world DTD.
pub fn decode_source(input: &[u8]) -> Result<String> {
    match SourceEncoding::detect(input) {
        SourceEncoding::Utf8 => {
            let body = input.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(input);
            Ok(String::from_utf8_lossy(body).into_owned())
        }
        SourceEncoding::Utf16Le => decode_utf16(input, &[0xFF, 0xFE], u16::from_le_bytes, "LE"),
        SourceEncoding::Utf16Be => decode_utf16(input, &[0xFE, 0xFF], u16::from_be_bytes, "BE"),
    }
}

fn decode_utf16(
    input: &[u8],
    bom: &[u8; 2],
    unit: fn([u8; 2]) -> u16,
    label: &str,
) -> Result<String> {
    let bytes = input.strip_prefix(bom).unwrap_or(input);

    if bytes.len() % 2 != 0 {
        return Err(DtdError::Encoding(format!(
            "invalid UTF-16 {}: odd number of bytes",
            label
        )));
    }

    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| unit([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16(&code_units)
        .map_err(|e| DtdError::Encoding(format!("invalid UTF-16 {}: {}", label, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8() {
        assert_eq!(SourceEncoding::detect(b"<!ELEMENT a EMPTY>"), SourceEncoding::Utf8);
        assert_eq!(SourceEncoding::detect(&[0xEF, 0xBB, 0xBF, b'<']), SourceEncoding::Utf8);
    }

    #[test]
    fn test_detect_utf16_without_bom() {
        assert_eq!(SourceEncoding::detect(&[b'<', 0x00, b'!', 0x00]), SourceEncoding::Utf16Le);
        assert_eq!(SourceEncoding::detect(&[0x00, b'%', 0x00, b'a']), SourceEncoding::Utf16Be);
    }

    #[test]
    fn test_strips_utf8_bom() {
        let text = decode_source(&[0xEF, 0xBB, 0xBF, b'<', b'!']).unwrap();
        assert_eq!(text, "<!");
    }

    #[test]
    fn test_decode_utf16_le() {
        let bytes = vec![0xFF, 0xFE, b'<', 0x00, b'!', 0x00];
        assert_eq!(decode_source(&bytes).unwrap(), "<!");
    }

    #[test]
    fn test_decode_utf16_be() {
        let bytes = vec![0xFE, 0xFF, 0x00, b'<', 0x00, b'!'];
        assert_eq!(decode_source(&bytes).unwrap(), "<!");
    }

    #[test]
    fn test_odd_utf16_is_an_error() {
        let bytes = vec![0xFF, 0xFE, b'<', 0x00, b'!'];
        assert!(matches!(decode_source(&bytes), Err(DtdError::Encoding(_))));
    }
}
