//! Character-reference validation for Tally's near-XML output.
//!
//! Tally happily emits references such as `&#4;` and raw control bytes, both of
//! which make a conforming XML parser abort. This is a validator, not a blind
//! stripper: valid references like `&#10;` survive untouched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

const NAMED_ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "apos;"];
const MAX_PASSES: usize = 8;
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

fn declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<\?xml\s.*?\?>").expect("static regex"))
}

fn numeric_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#([xX]?)([0-9A-Za-z]*)(;?)").expect("static regex"))
}

/// The XML 1.0 `Char` production.
pub fn is_xml_char(code_point: u32) -> bool {
    matches!(
        code_point,
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Cleans decoded text until a standards-conforming parser accepts it.
pub fn sanitize(text: &str) -> String {
    let mut current = text.trim_start_matches('\u{FEFF}').to_string();
    for _ in 0..MAX_PASSES {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn sanitize_pass(text: &str) -> String {
    let without_decl = declaration_re().replace_all(text, "");
    let refs_checked = outside_cdata(&without_decl, validate_numeric_references);
    let amps_escaped = outside_cdata(&refs_checked, escape_bare_ampersands);
    strip_forbidden_chars(&amps_escaped)
}

/// Deletes numeric references that are malformed or point at a forbidden code point.
fn validate_numeric_references(text: &str) -> String {
    numeric_reference_re()
        .replace_all(text, |caps: &Captures| {
            let hex_marker = &caps[1];
            let digits = &caps[2];
            let terminated = !caps[3].is_empty();
            if !terminated || digits.is_empty() {
                return String::new();
            }

            let radix = if hex_marker.is_empty() { 10 } else { 16 };
            match u32::from_str_radix(digits, radix) {
                Ok(cp) if is_xml_char(cp) => {
                    if hex_marker == "X" {
                        format!("&#x{};", digits)
                    } else {
                        caps[0].to_string()
                    }
                }
                _ => String::new(),
            }
        })
        .into_owned()
}

fn starts_with_reference(rest: &str) -> bool {
    if NAMED_ENTITIES.iter().any(|entity| rest.starts_with(entity)) {
        return true;
    }
    let Some(body) = rest.strip_prefix('#') else {
        return false;
    };
    let Some(end) = body.find(';') else {
        return false;
    };
    let number = &body[..end];
    match number.strip_prefix('x') {
        Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()),
    }
}

/// Applies `clean` to the text outside `<![CDATA[ ... ]]>` sections. Section
/// contents are literal, so they are copied unchanged. An unterminated section
/// runs to the end of the text.
fn outside_cdata(text: &str, clean: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(CDATA_OPEN) {
        out.push_str(&clean(&rest[..start]));
        let section = &rest[start..];
        let end = section
            .find(CDATA_CLOSE)
            .map(|i| i + CDATA_CLOSE.len())
            .unwrap_or(section.len());
        out.push_str(&section[..end]);
        rest = &section[end..];
    }
    out.push_str(&clean(rest));
    out
}

/// Re-escapes every `&` that does not open one of the five named entities or a numeric reference.
fn escape_bare_ampersands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        if ch == '&' && !starts_with_reference(&text[idx + 1..]) {
            out.push_str("&amp;");
        } else {
            out.push(ch);
        }
    }
    out
}

fn strip_forbidden_chars(text: &str) -> String {
    text.chars().filter(|c| is_xml_char(*c as u32)).collect()
}
