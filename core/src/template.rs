//! Template grammar model.
//!
//! A registered command is recognised by one of two template kinds:
//!
//! - [`FixedTemplate`]: a positional sequence of keywords and `[[Slot]]`
//!   placeholders, e.g. `start [[Url]] [[ThreadsCount]]`.
//! - [`ParameterizedTemplate`]: a keyword prefix (e.g. `docker run`)
//!   followed by named switches, each either a flag or a valued switch whose
//!   value is decomposed by a [`ValueTemplate`] such as `[[Name]]=[[Value]]`.
//!
//! # Examples
//!
//! ```
//! use command_shell_core::{FixedToken, Parameter, ParameterizedTemplate, Template};
//!
//! let fixed = Template::fixed("start [[Url]] [[ThreadsCount]]");
//! assert_eq!(fixed.keyword(), "start");
//!
//! let run = ParameterizedTemplate::new("docker run")
//!     .with_parameter(Parameter::valued("--name", "[[Name]]").with_alias("-n").required())
//!     .with_parameter(Parameter::flag("--rm", "Removed"));
//! assert_eq!(run.keywords(), ["docker", "run"]);
//! assert!(run.find_parameter("-n").is_some());
//! ```

use std::fmt;

const SLOT_OPEN: &str = "[[";
const SLOT_CLOSE: &str = "]]";

/// A registered command's grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// Positional keywords and slots.
    Fixed(FixedTemplate),
    /// Keyword prefix plus named switches.
    Parameterized(ParameterizedTemplate),
}

impl Template {
    /// Parses a fixed template from its `[[Slot]]` notation.
    pub fn fixed(source: &str) -> Self {
        Self::Fixed(FixedTemplate::parse(source))
    }

    /// Leading literal text: the keywords that identify this template.
    ///
    /// For fixed templates this is every literal token before the first
    /// slot; for parameterized templates it is the name. Tokens are joined
    /// with a single space.
    pub fn keyword(&self) -> String {
        match self {
            Self::Fixed(fixed) => fixed.keyword(),
            Self::Parameterized(parameterized) => parameterized.keywords().join(" "),
        }
    }

    /// Header line shown by the generated help.
    pub fn help_header(&self) -> &str {
        match self {
            Self::Fixed(fixed) => fixed.source(),
            Self::Parameterized(parameterized) => parameterized.name(),
        }
    }
}

impl From<FixedTemplate> for Template {
    fn from(template: FixedTemplate) -> Self {
        Self::Fixed(template)
    }
}

impl From<ParameterizedTemplate> for Template {
    fn from(template: ParameterizedTemplate) -> Self {
        Self::Parameterized(template)
    }
}

/// One whitespace-separated token of a fixed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixedToken {
    /// Keyword matched case-insensitively.
    Literal(String),
    /// Placeholder capturing one input token into the named field.
    Slot(String),
}

/// Positional template such as `add user [[Username]] [[Age]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTemplate {
    source: String,
    tokens: Vec<FixedToken>,
}

impl FixedTemplate {
    /// Splits `source` on whitespace; a token wrapped in `[[` / `]]` is a slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_shell_core::{FixedTemplate, FixedToken};
    ///
    /// let template = FixedTemplate::parse("stop [[Id]]");
    /// assert_eq!(
    ///     template.tokens(),
    ///     [FixedToken::Literal("stop".into()), FixedToken::Slot("Id".into())]
    /// );
    /// ```
    pub fn parse(source: &str) -> Self {
        let tokens = source
            .split_whitespace()
            .map(|token| match slot_name(token) {
                Some(name) => FixedToken::Slot(name.to_string()),
                None => FixedToken::Literal(token.to_string()),
            })
            .collect();

        Self {
            source: source.trim().to_string(),
            tokens,
        }
    }

    /// Template text as registered (trimmed).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[FixedToken] {
        &self.tokens
    }

    /// Slot names in template order.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            FixedToken::Slot(name) => Some(name.as_str()),
            FixedToken::Literal(_) => None,
        })
    }

    fn keyword(&self) -> String {
        self.tokens
            .iter()
            .map_while(|token| match token {
                FixedToken::Literal(text) => Some(text.as_str()),
                FixedToken::Slot(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn slot_name(token: &str) -> Option<&str> {
    if token.len() < SLOT_OPEN.len() + SLOT_CLOSE.len() {
        return None;
    }
    token.strip_prefix(SLOT_OPEN)?.strip_suffix(SLOT_CLOSE)
}

/// Keyword-prefixed template with named switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedTemplate {
    name: String,
    keywords: Vec<String>,
    parameters: Vec<Parameter>,
}

impl ParameterizedTemplate {
    /// Creates a template whose keyword prefix is `name` split on whitespace.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            keywords: name.split_whitespace().map(String::from).collect(),
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter (declaration order is preserved).
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Finds a parameter by name, falling back to aliases.
    pub fn find_parameter(&self, token: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == token)
            .or_else(|| {
                self.parameters
                    .iter()
                    .find(|parameter| parameter.alias.as_deref() == Some(token))
            })
    }
}

/// How a switch consumes input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// The next token is the value, decomposed by the template.
    Valued(ValueTemplate),
    /// No value; presence sets the named boolean field.
    Flag { field: String },
}

/// A named switch of a [`ParameterizedTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Switch name as typed, e.g. `--name`.
    pub name: String,
    /// Alternative spelling, e.g. `-n`.
    pub alias: Option<String>,
    /// Must appear at least once.
    pub required: bool,
    /// May appear more than once; each occurrence appends a list element.
    pub repeatable: bool,
    /// Nested field receiving the value's slots instead of the record itself.
    pub composite: Option<String>,
    pub kind: ParameterKind,
    /// Shown by the generated help.
    pub description: Option<String>,
}

impl Parameter {
    /// Creates a valued switch; `value_template` uses `[[Slot]]` markers.
    pub fn valued(name: &str, value_template: &str) -> Self {
        Self::with_kind(name, ParameterKind::Valued(ValueTemplate::parse(value_template)))
    }

    /// Creates a flag switch mapped to a boolean field.
    pub fn flag(name: &str, field: &str) -> Self {
        Self::with_kind(
            name,
            ParameterKind::Flag {
                field: field.to_string(),
            },
        )
    }

    fn with_kind(name: &str, kind: ParameterKind) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
            required: false,
            repeatable: false,
            composite: None,
            kind,
            description: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Maps the value's slots onto the nested field `field`.
    pub fn composite(mut self, field: &str) -> Self {
        self.composite = Some(field.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, ParameterKind::Flag { .. })
    }
}

/// One piece of a [`ValueTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSegment {
    Literal(String),
    Slot(String),
}

/// Pattern for a switch value: literal separators interleaved with slots,
/// e.g. `[[PortExternal]]:[[PortInternal]]`.
///
/// Text that is not a well-formed `[[name]]` marker is literal.
///
/// # Examples
///
/// ```
/// use command_shell_core::ValueTemplate;
///
/// let template = ValueTemplate::parse("[[Name]]=[[Value]]");
/// assert_eq!(template.slots().collect::<Vec<_>>(), ["Name", "Value"]);
///
/// let captures = template.capture("User=Alex Smith").unwrap();
/// assert_eq!(captures[1], ("Value", "Alex Smith".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueTemplate {
    source: String,
    segments: Vec<ValueSegment>,
}

impl ValueTemplate {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find(SLOT_OPEN) {
            let after_open = &rest[open + SLOT_OPEN.len()..];
            let Some(close) = after_open.find(SLOT_CLOSE) else {
                break;
            };
            let name = &after_open[..close];
            if name.contains('[') {
                // Not a marker; the real one (if any) starts further right.
                literal.push_str(&rest[..=open]);
                rest = &rest[open + 1..];
                continue;
            }

            literal.push_str(&rest[..open]);
            if !literal.is_empty() {
                segments.push(ValueSegment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(ValueSegment::Slot(name.to_string()));
            rest = &after_open[close + SLOT_CLOSE.len()..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(ValueSegment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[ValueSegment] {
        &self.segments
    }

    /// Slot names in template order.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            ValueSegment::Slot(name) => Some(name.as_str()),
            ValueSegment::Literal(_) => None,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }
}

impl fmt::Display for ValueTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_keyword_stops_at_first_slot() {
        let template = Template::fixed("  add user [[Username]] [[Age]] now ");
        assert_eq!(template.keyword(), "add user");
        assert_eq!(template.help_header(), "add user [[Username]] [[Age]] now");

        let Template::Fixed(fixed) = &template else {
            panic!("expected fixed template");
        };
        assert_eq!(fixed.slots().collect::<Vec<_>>(), ["Username", "Age"]);
    }

    #[test]
    fn test_fixed_keyword_empty_when_template_starts_with_slot() {
        assert_eq!(Template::fixed("[[Url]] open").keyword(), "");
        assert_eq!(Template::fixed("   ").keyword(), "");
    }

    #[test]
    fn test_bare_brackets_are_literal() {
        let template = FixedTemplate::parse("[[]] [[x");
        assert_eq!(
            template.tokens(),
            [
                FixedToken::Slot(String::new()),
                FixedToken::Literal("[[x".to_string())
            ]
        );
    }

    #[test]
    fn test_parameterized_keywords_collapse_whitespace() {
        let template = ParameterizedTemplate::new(" docker   run ");
        assert_eq!(template.name(), "docker   run");
        assert_eq!(Template::from(template).keyword(), "docker run");
    }

    #[test]
    fn test_find_parameter_prefers_name_over_alias() {
        let template = ParameterizedTemplate::new("run")
            .with_parameter(Parameter::valued("-a", "[[A]]").with_alias("-b"))
            .with_parameter(Parameter::valued("-b", "[[B]]"));

        assert_eq!(template.find_parameter("-b").unwrap().name, "-b");
        assert_eq!(template.find_parameter("-a").unwrap().name, "-a");
        assert!(template.find_parameter("-c").is_none());
    }

    #[test]
    fn test_value_template_segments() {
        let template = ValueTemplate::parse("[[Var1]],[[Var2]]:[[Var3]]");
        assert_eq!(
            template.segments(),
            [
                ValueSegment::Slot("Var1".into()),
                ValueSegment::Literal(",".into()),
                ValueSegment::Slot("Var2".into()),
                ValueSegment::Literal(":".into()),
                ValueSegment::Slot("Var3".into()),
            ]
        );
    }

    #[test]
    fn test_value_template_skips_malformed_markers() {
        let template = ValueTemplate::parse("[[a[[b]]-[[c");
        assert_eq!(
            template.segments(),
            [
                ValueSegment::Literal("[[a".into()),
                ValueSegment::Slot("b".into()),
                ValueSegment::Literal("-[[c".into()),
            ]
        );
        assert_eq!(ValueTemplate::parse("plain").slot_count(), 0);
    }
}
