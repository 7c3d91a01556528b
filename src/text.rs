//! String helpers for captured process output.

/// Characters removed by [`trim_right`].
const TRIMMABLE: [char; 4] = [' ', '\t', '\n', '\r'];

/// Strip trailing spaces, tabs, newlines and carriage returns.
///
/// Leading and interior characters are never touched, and other Unicode
/// whitespace is kept.
pub fn trim_right(s: &str) -> &str {
    s.trim_end_matches(&TRIMMABLE[..])
}

/// Decode bytes as UTF-8 and trim the right end.
///
/// Invalid UTF-8 yields an empty string rather than an error.
pub fn decode_utf8_trimmed(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => trim_right(s).to_string(),
        Err(_) => String::new(),
    }
}
