//! Whitespace and quote aware splitting of an input line.

/// Splits a line into tokens.
///
/// Tokens are separated by runs of whitespace. A `"` or `'` at any point of a
/// token opens a quoted span that ends at the next occurrence of the same
/// character; its content, whitespace included, joins the current token and
/// the quotes themselves are dropped. An unterminated quote runs to the end
/// of the line.
///
/// # Examples
///
/// ```
/// use command_shell_core::tokenize;
///
/// assert_eq!(
///     tokenize(r#"add user "Alex Smith" 24"#),
///     ["add", "user", "Alex Smith", "24"]
/// );
/// assert_eq!(tokenize("-e 'User=Alex Smith'"), ["-e", "User=Alex Smith"]);
/// assert_eq!(tokenize(r#"say """#), ["say", ""]);
/// ```
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A token may be empty only when it came from an empty quoted span.
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' => {
                in_token = true;
                for quoted in chars.by_ref() {
                    if quoted == ch {
                        break;
                    }
                    current.push(quoted);
                }
            }
            ch if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            ch => {
                in_token = true;
                current.push(ch);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}
