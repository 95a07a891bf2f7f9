//! Matching input lines against templates.
//!
//! [`fixed`] handles positional templates and [`parameterized`] handles
//! keyword-prefixed templates with switches. Both work on the token list
//! produced by [`tokenize`](crate::tokenize).

pub mod fixed;
pub mod parameterized;
mod value;

use std::fmt;

/// Outcome of matching one line against a parameterized template.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsingResult<T> {
    /// The keyword prefix did not match; the next template may be tried.
    NoMatch,
    /// The line matched and was bound into a record.
    Parsed(T),
    /// The keyword prefix matched but the rest of the line is invalid.
    Failed(ParseFailure),
}

impl<T> ParsingResult<T> {
    /// Returns `true` when the keyword prefix matched, whether or not the
    /// rest of the line parsed.
    pub fn keyword_matched(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// The bound record, if parsing succeeded.
    pub fn parsed(self) -> Option<T> {
        match self {
            Self::Parsed(record) => Some(record),
            _ => None,
        }
    }
}

/// Why a matched parameterized line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// A token in switch position names no parameter or alias.
    UnknownParameter(String),
    /// A non-repeatable switch or a flag appeared twice.
    DuplicateParameter(String),
    /// Required parameters that never appeared, in declaration order.
    MissingRequired(Vec<String>),
    /// A switch value did not fit the parameter's value template.
    MalformedValue {
        parameter: String,
        value: String,
        template: String,
    },
}

impl ParseFailure {
    /// User-facing message for this failure on `command`.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_shell_core::ParseFailure;
    ///
    /// let failure = ParseFailure::MissingRequired(vec!["--name".into(), "-d".into()]);
    /// assert_eq!(
    ///     failure.message("docker run"),
    ///     "Missing required parameters --name, -d for command docker run."
    /// );
    /// ```
    pub fn message(&self, command: &str) -> String {
        match self {
            Self::UnknownParameter(name) => {
                format!("Parameter {name} is unknown for command {command}.")
            }
            Self::DuplicateParameter(name) => {
                format!("Found duplicated parameter {name} for command {command}.")
            }
            Self::MissingRequired(names) => format!(
                "Missing required parameters {} for command {command}.",
                names.join(", ")
            ),
            Self::MalformedValue {
                parameter,
                value,
                template,
            } => format!(
                "Value {value} does not match template {template} of parameter {parameter} for command {command}."
            ),
        }
    }

    /// Short label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownParameter(_) => "Unknown parameter",
            Self::DuplicateParameter(_) => "Duplicated parameter",
            Self::MissingRequired(_) => "Missing required parameters",
            Self::MalformedValue { .. } => "Malformed value",
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParameter(name) => write!(f, "unknown parameter {name}"),
            Self::DuplicateParameter(name) => write!(f, "duplicated parameter {name}"),
            Self::MissingRequired(names) => {
                write!(f, "missing required parameters {}", names.join(", "))
            }
            Self::MalformedValue {
                parameter,
                value,
                template,
            } => write!(f, "value {value} of {parameter} does not match {template}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_flags() {
        assert!(!ParsingResult::<()>::NoMatch.keyword_matched());
        assert!(!ParsingResult::<()>::NoMatch.is_parsed());

        let failed = ParsingResult::<()>::Failed(ParseFailure::UnknownParameter("-x".into()));
        assert!(failed.keyword_matched());
        assert!(!failed.is_parsed());

        let parsed = ParsingResult::Parsed(5);
        assert!(parsed.keyword_matched());
        assert_eq!(parsed.parsed(), Some(5));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ParseFailure::UnknownParameter("-x".into()).message("docker run"),
            "Parameter -x is unknown for command docker run."
        );
        assert_eq!(
            ParseFailure::DuplicateParameter("--rm".into()).message("docker run"),
            "Found duplicated parameter --rm for command docker run."
        );
        assert_eq!(
            ParseFailure::MalformedValue {
                parameter: "-p".into(),
                value: "25000".into(),
                template: "[[PortExternal]]:[[PortInternal]]".into(),
            }
            .message("docker run"),
            "Value 25000 does not match template [[PortExternal]]:[[PortInternal]] of parameter -p for command docker run."
        );
    }
}
