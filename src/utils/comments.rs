//! `//` comment stripping for hand-written JSON files.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Matches either a JSON string literal or a `//` comment up to end of line
static STRING_OR_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|//[^\n]*"#).expect("Invalid comment regex")
});

/// Remove `//` comments, leaving `//` inside string literals alone
///
/// # Examples
/// ```
/// use rtf::utils::strip_line_comments;
///
/// let text = "{\"url\": \"http://x\"} // trailing";
/// assert_eq!(strip_line_comments(text), "{\"url\": \"http://x\"} ");
/// ```
pub fn strip_line_comments(text: &str) -> String {
    STRING_OR_COMMENT
        .replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            if matched.starts_with("//") {
                String::new()
            } else {
                matched.to_string()
            }
        })
        .into_owned()
}
