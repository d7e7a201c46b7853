//! Text code unit rendering and parsing for the character data types

use unicode_general_category::{get_general_category, GeneralCategory};

/// Rendering used for the space character, which would otherwise be invisible
pub const SPACE_NAME: &str = "(space)";

// Visible on its own: not a control, format, separator, combining mark,
// private-use or unassigned code point.
fn is_graphic(c: char) -> bool {
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Unassigned
            | GeneralCategory::PrivateUse
            | GeneralCategory::Surrogate
            | GeneralCategory::NonspacingMark
            | GeneralCategory::EnclosingMark
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

/// Renders a code value the way the memory view shows it.
///
/// Graphic characters print as themselves; space and the common control
/// characters get readable names; everything else becomes a `\x` escape,
/// two digits below 256 and at least five above.
pub fn code_to_string(code: u32, max_graphic: u32) -> String {
    if code <= max_graphic {
        if let Some(c) = char::from_u32(code) {
            if is_graphic(c) {
                return c.to_string();
            }
        }
    }

    match code {
        0x20 => SPACE_NAME.to_string(),
        0x0A => "\\n".to_string(),
        0x09 => "\\t".to_string(),
        0x0D => "\\r".to_string(),
        0x0B => "\\v".to_string(),
        0x00 => "\\0".to_string(),
        c if c < 256 => format!("\\x{:02x}", c),
        c => format!("\\x{:05x}", c),
    }
}

/// Parses a single character, a named escape or a `\x` hex escape.
///
/// Returns `None` when the text is none of those. Range checks against the
/// target type are left to the caller.
pub fn code_from_str(text: &str) -> Option<u32> {
    if text == SPACE_NAME {
        return Some(0x20);
    }

    if let Some(rest) = text.strip_prefix('\\') {
        let named = match rest {
            "n" => Some(0x0A),
            "t" => Some(0x09),
            "r" => Some(0x0D),
            "v" => Some(0x0B),
            "0" => Some(0x00),
            _ => None,
        };
        if named.is_some() {
            return named;
        }
        if let Some(hex) = rest.strip_prefix('x') {
            if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            return u32::from_str_radix(hex, 16).ok();
        }
    }

    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_graphic_and_named() {
        assert_eq!(code_to_string('a' as u32, u32::MAX), "a");
        assert_eq!(code_to_string('é' as u32, u32::MAX), "é");
        assert_eq!(code_to_string(0x20, u32::MAX), "(space)");
        assert_eq!(code_to_string(0x0A, u32::MAX), "\\n");
        assert_eq!(code_to_string(0, u32::MAX), "\\0");
    }

    #[test]
    fn test_render_hex_escapes() {
        assert_eq!(code_to_string(0x01, u32::MAX), "\\x01");
        assert_eq!(code_to_string(0x7F, u32::MAX), "\\x7f");
        assert_eq!(code_to_string(0xE9, 0x7F), "\\xe9");
        assert_eq!(code_to_string(0xD800, u32::MAX), "\\x0d800");
        assert_eq!(code_to_string(0x0011_0000, u32::MAX), "\\x110000");

        // invisible or non-standalone code points
        assert_eq!(code_to_string(0xFEFF, u32::MAX), "\\x0feff");
        assert_eq!(code_to_string(0x200B, u32::MAX), "\\x0200b");
        assert_eq!(code_to_string(0xAD, u32::MAX), "\\xad");
        assert_eq!(code_to_string(0x378, u32::MAX), "\\x00378");
        assert_eq!(code_to_string(0x301, u32::MAX), "\\x00301");
        assert_eq!(code_to_string(0xE000, u32::MAX), "\\x0e000");
        assert_eq!(code_to_string(0xA0, u32::MAX), "\\xa0");
        assert_eq!(code_to_string(0x2028, u32::MAX), "\\x02028");
    }

    #[test]
    fn test_parse() {
        assert_eq!(code_from_str("a"), Some('a' as u32));
        assert_eq!(code_from_str("\\"), Some('\\' as u32));
        assert_eq!(code_from_str("\\t"), Some(9));
        assert_eq!(code_from_str("(space)"), Some(0x20));
        assert_eq!(code_from_str("\\x0d800"), Some(0xD800));
        assert_eq!(code_from_str("\\xffffffff"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(code_from_str(""), None);
        assert_eq!(code_from_str("ab"), None);
        assert_eq!(code_from_str("\\x"), None);
        assert_eq!(code_from_str("\\x+1"), None);
        assert_eq!(code_from_str("\\x1g"), None);
        assert_eq!(code_from_str("\\x100000000"), None);
        assert_eq!(code_from_str("\\nn"), None);
    }
}
