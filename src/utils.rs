//! Small helpers shared by the scraper and the binary.

use scraper::ElementRef;

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes and get `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Text content of an element: every text node trimmed, then concatenated.
///
/// Whitespace-only nodes (indentation between tags) disappear entirely.
///
/// # Arguments
///
/// * `element` - The element whose descendant text nodes are collected
///
/// # Returns
///
/// The concatenated text, empty if the element has no non-blank text.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Check a title against a list of phrases, ignoring case.
///
/// # Arguments
///
/// * `title` - The listing title to inspect
/// * `phrases` - Substrings that mark a title, in any case
///
/// # Returns
///
/// `true` if `title` contains at least one of `phrases`; `false` for an
/// empty list.
pub fn contains_any_phrase<S: AsRef<str>>(title: &str, phrases: &[S]) -> bool {
    let title = title.to_lowercase();
    phrases
        .iter()
        .any(|phrase| title.contains(&phrase.as_ref().to_lowercase()))
}
