//! Reply normalization for assistant messages before they reach a chat front-end.

use std::sync::LazyLock;

use regex::Regex;

/// File-citation annotations such as `【4:0†source】`. `.` stops at `\n` only.
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"【.*?†.*?】").unwrap_or_else(|error| panic!("annotation pattern: {error}"))
});

/// Runs of whitespace other than line breaks.
static HORIZONTAL_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\S\r\n]+").unwrap_or_else(|error| panic!("whitespace pattern: {error}"))
});

/// Strips citation annotations, collapses horizontal whitespace runs into a
/// single space and trims the result. Line breaks are kept.
pub fn clean_reply(text: &str) -> String {
    let without_annotations = ANNOTATION.replace_all(text, "");
    HORIZONTAL_WHITESPACE.replace_all(&without_annotations, " ").trim().to_string()
}
