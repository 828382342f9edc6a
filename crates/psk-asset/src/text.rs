//! Fixed-width name fields.
//!
//! Names are stored as null padded byte arrays in the Windows-1252 code page.

/// Windows-1252 code points for bytes `0x80..=0x9F`, `None` where the code page
/// leaves the byte undefined.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

fn decode_cp1252_byte(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[(byte - 0x80) as usize].unwrap_or(char::REPLACEMENT_CHARACTER),
        // The rest of the code page matches Latin-1
        other => other as char,
    }
}

/// Decode a fixed-width name, stopping at the first null byte.
///
/// Bytes the code page leaves undefined become U+FFFD.
pub fn decode_name(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|byte| **byte != 0)
        .map(|byte| decode_cp1252_byte(*byte))
        .collect()
}

#[cfg(test)]
mod test {
    use super::decode_name;

    #[test]
    fn test_trim_at_first_null() {
        let mut raw = [0u8; 64];
        raw[..4].copy_from_slice(b"Bip0");
        raw[5] = b'x';
        assert_eq!(decode_name(&raw), "Bip0");
    }

    #[test]
    fn test_code_page_high_bytes() {
        assert_eq!(decode_name(&[b'A', 0x80, 0xE9, 0x9C]), "A\u{20AC}\u{e9}\u{153}");
    }

    #[test]
    fn test_undefined_bytes_are_replaced() {
        assert_eq!(decode_name(&[0x81, b'b']), "\u{FFFD}b");
    }
}
