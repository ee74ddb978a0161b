//! WinAnsi (CP1252) encoding and literal-string escaping.

/// Encodes text to Windows-1252 bytes. Characters outside the code page
/// become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(ch: char) -> u8 {
    match ch as u32 {
        0x00..=0x7F | 0xA0..=0xFF => ch as u8,
        0x20AC => 0x80, // €
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85, // …
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => b'?',
    }
}

/// Renders text as a PDF literal string, parentheses included.
pub fn literal_string(text: &str) -> String {
    let bytes = encode_win_ansi(text);
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('(');
    for byte in bytes {
        match byte {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03o}")),
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(encode_win_ansi("Mulch 5m3"), b"Mulch 5m3".to_vec());
    }

    #[test]
    fn test_special_mappings() {
        assert_eq!(encode_win_ansi("€"), vec![0x80]);
        assert_eq!(encode_win_ansi("é"), vec![0xE9]);
        assert_eq!(encode_win_ansi("–"), vec![0x96]);
        assert_eq!(encode_win_ansi("漢"), vec![b'?']);
    }

    #[test]
    fn test_literal_string_escaping() {
        assert_eq!(literal_string("a(b)c"), "(a\\(b\\)c)");
        assert_eq!(literal_string("back\\slash"), "(back\\\\slash)");
        assert_eq!(literal_string("12 €"), "(12 \\200)");
        assert_eq!(literal_string("Page 1 / 3"), "(Page 1 / 3)");
    }
}
