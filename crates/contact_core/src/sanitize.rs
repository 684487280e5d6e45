//! Text normalization applied to submission fields before validation

/// Zero-width characters that render invisibly but survive trimming
const ZERO_WIDTH_CHARS: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

fn is_zero_width(c: char) -> bool {
    ZERO_WIDTH_CHARS.contains(&c)
}

/// Single-line field: strips zero-width and control characters, collapses
/// whitespace runs to one space and trims.
///
/// Whitespace control characters (tabs, newlines) count as whitespace.
pub fn single_line(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|&c| !is_zero_width(c) && (c.is_whitespace() || !c.is_control()))
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Multi-line field: normalizes line endings to `\n`, strips zero-width
/// characters and every control character except `\n` and `\t`, then trims.
pub fn multi_line(input: &str) -> String {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let cleaned: String = normalized
        .chars()
        .filter(|&c| !is_zero_width(c) && (c == '\n' || c == '\t' || !c.is_control()))
        .collect();

    cleaned.trim().to_string()
}

/// Email field: strips zero-width and control characters, trims and lower-cases
pub fn email(input: &str) -> String {
    input
        .chars()
        .filter(|&c| !is_zero_width(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_lowercase()
}
