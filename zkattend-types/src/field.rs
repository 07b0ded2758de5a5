//! Fixed-width text fields

use crate::error::{Error, Result};

/// Decode a NUL-padded text field, stopping at the first NUL
pub(crate) fn read_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Like [`read_text`], mapping an empty field to `None`
pub(crate) fn read_optional_text(raw: &[u8]) -> Option<String> {
    Some(read_text(raw)).filter(|s| !s.is_empty())
}

/// Write `value` into `out`, NUL-padding the rest
///
/// Fails when the UTF-8 encoding does not fit the field.
pub(crate) fn write_text(out: &mut [u8], value: &str, field: &'static str) -> Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > out.len() {
        return Err(Error::FieldTooLong {
            field,
            len: bytes.len(),
            max: out.len(),
        });
    }

    out.fill(0);
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text_stops_at_nul() {
        assert_eq!(read_text(b"Alice\0\0junk"), "Alice");
        assert_eq!(read_text(b"full"), "full");
        assert_eq!(read_optional_text(b"\0\0\0"), None);
    }

    #[test]
    fn test_write_text_pads_and_rejects_overflow() {
        let mut field = [0xFFu8; 6];
        write_text(&mut field, "abc", "name").unwrap();
        assert_eq!(&field, b"abc\0\0\0");

        assert!(write_text(&mut field, "toolong", "name").is_err());
    }
}
