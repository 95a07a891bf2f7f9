//! Positional keyword and slot matching.

use crate::template::{FixedTemplate, FixedToken};
use crate::tokenize::tokenize;

/// Matches `input` against a fixed template.
///
/// The line must have exactly as many tokens as the template. Keywords are
/// compared case-insensitively; each slot captures its token verbatim.
/// Returns the `(slot, value)` pairs in template order, or `None` if the line
/// does not match.
///
/// # Examples
///
/// ```
/// use command_shell_core::FixedTemplate;
/// use command_shell_core::parser::fixed::try_parse;
///
/// let template = FixedTemplate::parse("start [[Url]] [[ThreadsCount]]");
/// let bindings = try_parse("START http://site.com 4", &template).unwrap();
/// assert_eq!(
///     bindings,
///     [
///         ("Url".to_string(), "http://site.com".to_string()),
///         ("ThreadsCount".to_string(), "4".to_string()),
///     ]
/// );
/// assert!(try_parse("start http://site.com", &template).is_none());
/// ```
pub fn try_parse(input: &str, template: &FixedTemplate) -> Option<Vec<(String, String)>> {
    try_parse_tokens(&tokenize(input), template)
}

/// Same as [`try_parse`] on an already tokenized line.
pub fn try_parse_tokens(
    tokens: &[String],
    template: &FixedTemplate,
) -> Option<Vec<(String, String)>> {
    if tokens.len() != template.tokens().len() {
        return None;
    }

    let mut bindings = Vec::new();
    for (expected, actual) in template.tokens().iter().zip(tokens) {
        match expected {
            FixedToken::Literal(keyword) => {
                if keyword.to_lowercase() != actual.to_lowercase() {
                    return None;
                }
            }
            FixedToken::Slot(name) => bindings.push((name.clone(), actual.clone())),
        }
    }
    Some(bindings)
}
