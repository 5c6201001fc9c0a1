use log::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    Utf16Le,
    Utf16Be,
    Utf8Bom,
    Utf8,
    /// ISO-8859-1: every byte maps to one character, so decoding cannot fail.
    Latin1,
}

/// Sniffs the byte-order mark; without one, strict UTF-8 is tried before Latin-1.
pub fn detect_encoding(bytes: &[u8]) -> DetectedEncoding {
    if bytes.starts_with(UTF16LE_BOM) {
        DetectedEncoding::Utf16Le
    } else if bytes.starts_with(UTF16BE_BOM) {
        DetectedEncoding::Utf16Be
    } else if bytes.starts_with(UTF8_BOM) {
        DetectedEncoding::Utf8Bom
    } else if std::str::from_utf8(bytes).is_ok() {
        DetectedEncoding::Utf8
    } else {
        DetectedEncoding::Latin1
    }
}

/// Converts raw response bytes to text. Never fails: undecodable input degrades
/// to replacement characters or a single-byte decode.
pub fn decode(bytes: &[u8]) -> String {
    let encoding = detect_encoding(bytes);
    debug!("Decoding {} response bytes as {:?}", bytes.len(), encoding);

    match encoding {
        DetectedEncoding::Utf16Le => decode_utf16(&bytes[UTF16LE_BOM.len()..], u16::from_le_bytes),
        DetectedEncoding::Utf16Be => decode_utf16(&bytes[UTF16BE_BOM.len()..], u16::from_be_bytes),
        DetectedEncoding::Utf8Bom => {
            let body = &bytes[UTF8_BOM.len()..];
            match std::str::from_utf8(body) {
                Ok(text) => text.to_string(),
                Err(_) => decode_latin1(body),
            }
        }
        DetectedEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        DetectedEncoding::Latin1 => decode_latin1(bytes),
    }
}

fn decode_utf16(body: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    // A trailing odd byte cannot form a code unit and is dropped.
    let units = body.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = UTF16LE_BOM.to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_utf16le_bom() {
        let bytes = utf16le_with_bom("<A>₹ 500</A>");
        assert_eq!(detect_encoding(&bytes), DetectedEncoding::Utf16Le);
        assert_eq!(decode(&bytes), "<A>₹ 500</A>");
    }

    #[test]
    fn test_utf16le_odd_trailing_byte_is_tolerated() {
        let mut bytes = utf16le_with_bom("<A/>");
        bytes.push(0x41);
        assert_eq!(decode(&bytes), "<A/>");
    }

    #[test]
    fn test_utf16be_bom() {
        let mut bytes = UTF16BE_BOM.to_vec();
        for unit in "<B/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode(&bytes), "<B/>");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("<C>café</C>".as_bytes());
        assert_eq!(detect_encoding(&bytes), DetectedEncoding::Utf8Bom);
        assert_eq!(decode(&bytes), "<C>café</C>");
    }

    #[test]
    fn test_plain_utf8() {
        assert_eq!(decode("<D>ok</D>".as_bytes()), "<D>ok</D>");
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_latin1() {
        let bytes = b"<E>caf\xE9</E>";
        assert_eq!(detect_encoding(bytes), DetectedEncoding::Latin1);
        assert_eq!(decode(bytes), "<E>café</E>");
    }

    #[test]
    fn test_garbage_never_fails() {
        let inputs: Vec<Vec<u8>> = vec![
            vec![],
            vec![0xFF],
            vec![0xFF, 0xFE, 0x00, 0xD8],
            vec![0xEF, 0xBB, 0xBF, 0xC3],
            (0u8..=255).collect(),
        ];
        for input in inputs {
            let _ = decode(&input);
        }
    }
}
