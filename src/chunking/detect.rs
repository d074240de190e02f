//! Section title detection on single lines of extracted text.

use super::patterns::HeadingRules;

/// Longest title kept. Extraction sometimes glues a heading to the body
/// text that follows it.
pub const MAX_TITLE_CHARS: usize = 120;

/// Collapse whitespace runs to one space and trim.
pub fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Return the title carried by `line` if any rule matches it.
///
/// `line` is expected to be normalized with [`normalize_line`]. Headings can
/// appear anywhere on a page, so callers run this on every non-empty line.
pub fn detect_section_title(line: &str, rules: &HeadingRules) -> Option<String> {
    if line.is_empty() {
        return None;
    }
    rules
        .rules()
        .iter()
        .find(|rule| rule.matches(line))
        .map(|_| line.chars().take(MAX_TITLE_CHARS).collect())
}
