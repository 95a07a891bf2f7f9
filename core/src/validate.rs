//! Registration-time validation of a template set.
//!
//! Checks that the registered templates are consistent with each other and
//! with their record types before any input is processed. The first defect
//! found is returned; nothing is accumulated or modified, so validating the
//! same set twice gives the same result.
//!
//! # Examples
//!
//! ```
//! use command_shell_core::*;
//!
//! #[derive(Default)]
//! struct Stop;
//!
//! let descriptor = TargetDescriptor::<Stop>::new("Stop");
//! let stop = Template::fixed("stop");
//! assert!(validate([(&stop, &descriptor as &dyn FieldLookup)], true).is_ok());
//!
//! // `help` is reserved when the help command is generated.
//! let help = Template::fixed("help");
//! let err = validate([(&help, &descriptor as &dyn FieldLookup)], true).unwrap_err();
//! assert_eq!(err.code(), ValidationErrorCode::UsingReservedCommandName);
//! ```

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::target::{FieldLookup, FieldShape, ScalarType};
use crate::template::{
    FixedTemplate, Parameter, ParameterKind, ParameterizedTemplate, Template, ValueTemplate,
};

/// Name of the generated help command.
pub const HELP_COMMAND: &str = "help";

/// Machine-readable category of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    NoRegisteredCommands,
    UsingReservedCommandName,
    InputTemplateIsNullOrEmpty,
    DuplicateInputTemplate,
    MissingPropertyInCommandClass,
    DuplicateParameterName,
    RepeatableOnlyNameParameter,
    RequiredOnlyNameParameter,
    OnlyNameParameterTypeNotBool,
    InvalidValueTemplate,
    UnsupportedPropertyType,
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A registration defect that prevents the shell from being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no commands were registered")]
    NoRegisteredCommands,
    /// A template claims the command name reserved for the generated help.
    #[error("command {0} uses the reserved command name 'help'")]
    UsingReservedCommandName(String),
    /// A template has no leading keyword.
    #[error("input template {0:?} has no leading keyword")]
    InputTemplateIsNullOrEmpty(String),
    /// Two templates share the same leading keywords.
    #[error("duplicate input template: {0}")]
    DuplicateInputTemplate(String),
    /// A slot, flag or composite target names a field the record lacks.
    #[error("{type_name} has no field {field} used by command {command}")]
    MissingPropertyInCommandClass {
        command: String,
        type_name: String,
        field: String,
    },
    /// Two parameters of one template share a name or alias.
    #[error("duplicate parameter name {name} for command {command}")]
    DuplicateParameterName { command: String, name: String },
    #[error("flag parameter {parameter} of command {command} cannot be repeatable")]
    RepeatableOnlyNameParameter { command: String, parameter: String },
    #[error("flag parameter {parameter} of command {command} cannot be required")]
    RequiredOnlyNameParameter { command: String, parameter: String },
    /// A flag is bound to a field that is not a plain `bool`.
    #[error("field {field} bound to flag {parameter} of command {command} must be bool, found {found}")]
    OnlyNameParameterTypeNotBool {
        command: String,
        parameter: String,
        field: String,
        found: FieldShape,
    },
    /// A value template has no `[[Slot]]` marker.
    #[error("value template {template:?} of parameter {parameter} for command {command} has no slots")]
    InvalidValueTemplate {
        command: String,
        parameter: String,
        template: String,
    },
    /// A field exists but has the wrong shape for how it is bound.
    #[error("field {field} of {type_name} used by command {command} is {found}, expected {expected}")]
    UnsupportedPropertyType {
        command: String,
        type_name: String,
        field: String,
        found: FieldShape,
        expected: &'static str,
    },
}

impl ValidationError {
    /// Category of this error.
    pub fn code(&self) -> ValidationErrorCode {
        match self {
            Self::NoRegisteredCommands => ValidationErrorCode::NoRegisteredCommands,
            Self::UsingReservedCommandName(_) => ValidationErrorCode::UsingReservedCommandName,
            Self::InputTemplateIsNullOrEmpty(_) => ValidationErrorCode::InputTemplateIsNullOrEmpty,
            Self::DuplicateInputTemplate(_) => ValidationErrorCode::DuplicateInputTemplate,
            Self::MissingPropertyInCommandClass { .. } => {
                ValidationErrorCode::MissingPropertyInCommandClass
            }
            Self::DuplicateParameterName { .. } => ValidationErrorCode::DuplicateParameterName,
            Self::RepeatableOnlyNameParameter { .. } => {
                ValidationErrorCode::RepeatableOnlyNameParameter
            }
            Self::RequiredOnlyNameParameter { .. } => ValidationErrorCode::RequiredOnlyNameParameter,
            Self::OnlyNameParameterTypeNotBool { .. } => {
                ValidationErrorCode::OnlyNameParameterTypeNotBool
            }
            Self::InvalidValueTemplate { .. } => ValidationErrorCode::InvalidValueTemplate,
            Self::UnsupportedPropertyType { .. } => ValidationErrorCode::UnsupportedPropertyType,
        }
    }
}

/// Validates a registered template set.
///
/// Each item pairs a template with the field lookup of its record type.
/// The set must not be empty. Templates are then checked one at a time in
/// registration order, stopping at the first failure. For each template the
/// checks run in this order: reserved `help` (when `help_enabled`), leading
/// keyword present, leading keyword unique, consistency with the record type.
pub fn validate<'a, I>(commands: I, help_enabled: bool) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = (&'a Template, &'a dyn FieldLookup)>,
{
    let mut commands = commands.into_iter().peekable();
    if commands.peek().is_none() {
        return Err(ValidationError::NoRegisteredCommands);
    }

    let mut keywords: HashSet<String> = HashSet::new();
    for (template, lookup) in commands {
        // Any casing of `help` counts for fixed templates.
        if help_enabled && claims_help(template) {
            return Err(ValidationError::UsingReservedCommandName(
                template.help_header().to_string(),
            ));
        }

        let keyword = template.keyword();
        if keyword.trim().is_empty() {
            return Err(ValidationError::InputTemplateIsNullOrEmpty(
                template.help_header().to_string(),
            ));
        }
        if !keywords.insert(keyword.clone()) {
            return Err(ValidationError::DuplicateInputTemplate(keyword));
        }

        match template {
            Template::Fixed(fixed) => validate_fixed(fixed, lookup)?,
            Template::Parameterized(parameterized) => validate_parameterized(parameterized, lookup)?,
        }
    }

    Ok(())
}

/// Fixed keywords match case-insensitively, so any casing of `help` would
/// shadow the generated command.
fn claims_help(template: &Template) -> bool {
    let keyword = template.keyword();
    match template {
        Template::Fixed(_) => keyword.to_lowercase() == HELP_COMMAND,
        Template::Parameterized(_) => keyword == HELP_COMMAND,
    }
}

fn validate_fixed(template: &FixedTemplate, lookup: &dyn FieldLookup) -> Result<(), ValidationError> {
    let command = template.source();
    for slot in template.slots() {
        require_shape(command, lookup, slot, Expected::Scalar)?;
    }
    Ok(())
}

fn validate_parameterized(
    template: &ParameterizedTemplate,
    lookup: &dyn FieldLookup,
) -> Result<(), ValidationError> {
    let command = template.name();
    let mut names: HashSet<&str> = HashSet::new();

    for parameter in template.parameters() {
        for name in std::iter::once(parameter.name.as_str()).chain(parameter.alias.as_deref()) {
            if !names.insert(name) {
                return Err(ValidationError::DuplicateParameterName {
                    command: command.to_string(),
                    name: name.to_string(),
                });
            }
        }

        match &parameter.kind {
            ParameterKind::Flag { field } => validate_flag(command, parameter, field, lookup)?,
            ParameterKind::Valued(value_template) => {
                validate_valued(command, parameter, value_template, lookup)?
            }
        }
    }
    Ok(())
}

fn validate_flag(
    command: &str,
    parameter: &Parameter,
    field: &str,
    lookup: &dyn FieldLookup,
) -> Result<(), ValidationError> {
    if parameter.repeatable {
        return Err(ValidationError::RepeatableOnlyNameParameter {
            command: command.to_string(),
            parameter: parameter.name.clone(),
        });
    }
    if parameter.required {
        return Err(ValidationError::RequiredOnlyNameParameter {
            command: command.to_string(),
            parameter: parameter.name.clone(),
        });
    }

    match lookup.shape(field) {
        None => Err(missing_field(command, lookup, field)),
        Some(FieldShape::Scalar(ScalarType::Bool)) => Ok(()),
        Some(found) => Err(ValidationError::OnlyNameParameterTypeNotBool {
            command: command.to_string(),
            parameter: parameter.name.clone(),
            field: field.to_string(),
            found,
        }),
    }
}

fn validate_valued(
    command: &str,
    parameter: &Parameter,
    value_template: &ValueTemplate,
    lookup: &dyn FieldLookup,
) -> Result<(), ValidationError> {
    if value_template.slot_count() == 0 {
        return Err(ValidationError::InvalidValueTemplate {
            command: command.to_string(),
            parameter: parameter.name.clone(),
            template: value_template.source().to_string(),
        });
    }

    let (receiver, slot_shape) = match &parameter.composite {
        Some(composite) => {
            let expected = if parameter.repeatable {
                Expected::CompositeList
            } else {
                Expected::Composite
            };
            require_shape(command, lookup, composite, expected)?;
            let nested = lookup
                .nested(composite)
                .ok_or_else(|| missing_field(command, lookup, composite))?;
            (nested, Expected::Scalar)
        }
        None if parameter.repeatable => (lookup, Expected::ScalarList),
        None => (lookup, Expected::Scalar),
    };

    for slot in value_template.slots() {
        require_shape(command, receiver, slot, slot_shape)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Expected {
    Scalar,
    ScalarList,
    Composite,
    CompositeList,
}

impl Expected {
    fn accepts(self, shape: FieldShape) -> bool {
        matches!(
            (self, shape),
            (Self::Scalar, FieldShape::Scalar(_))
                | (Self::ScalarList, FieldShape::ScalarList(_))
                | (Self::Composite, FieldShape::Composite)
                | (Self::CompositeList, FieldShape::CompositeList)
        )
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Scalar => "a scalar",
            Self::ScalarList => "a list of scalars",
            Self::Composite => "a composite",
            Self::CompositeList => "a list of composites",
        }
    }
}

fn require_shape(
    command: &str,
    lookup: &dyn FieldLookup,
    field: &str,
    expected: Expected,
) -> Result<(), ValidationError> {
    match lookup.shape(field) {
        None => Err(missing_field(command, lookup, field)),
        Some(found) if expected.accepts(found) => Ok(()),
        Some(found) => Err(ValidationError::UnsupportedPropertyType {
            command: command.to_string(),
            type_name: lookup.type_name().to_string(),
            field: field.to_string(),
            found,
            expected: expected.describe(),
        }),
    }
}

fn missing_field(command: &str, lookup: &dyn FieldLookup, field: &str) -> ValidationError {
    ValidationError::MissingPropertyInCommandClass {
        command: command.to_string(),
        type_name: lookup.type_name().to_string(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetDescriptor;

    #[derive(Default)]
    struct Entry {
        key: String,
        value: String,
    }

    #[derive(Default)]
    struct Record {
        name: String,
        count: i32,
        forced: bool,
        tags: Vec<String>,
        entry: Entry,
        entries: Vec<Entry>,
    }

    fn entry() -> TargetDescriptor<Entry> {
        TargetDescriptor::new("Entry")
            .field("Key", |e: &mut Entry, v: String| e.key = v)
            .field("Value", |e: &mut Entry, v: String| e.value = v)
    }

    fn record() -> TargetDescriptor<Record> {
        TargetDescriptor::new("Record")
            .field("Name", |r: &mut Record, v: String| r.name = v)
            .field("Count", |r: &mut Record, v: i32| r.count = v)
            .field("Forced", |r: &mut Record, v: bool| r.forced = v)
            .list("Tags", |r: &mut Record, v: String| r.tags.push(v))
            .composite("Entry", entry(), |r: &mut Record| &mut r.entry)
            .composite_list("Entries", entry(), |r: &mut Record, e| r.entries.push(e))
    }

    fn check(templates: &[Template], help: bool) -> Result<(), ValidationError> {
        let descriptor = record();
        validate(
            templates
                .iter()
                .map(|t| (t, &descriptor as &dyn FieldLookup)),
            help,
        )
    }

    fn code(templates: &[Template], help: bool) -> ValidationErrorCode {
        check(templates, help).unwrap_err().code()
    }

    fn run(parameter: Parameter) -> Template {
        ParameterizedTemplate::new("run").with_parameter(parameter).into()
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert_eq!(code(&[], false), ValidationErrorCode::NoRegisteredCommands);
    }

    #[test]
    fn test_help_is_reserved_only_when_enabled() {
        let templates = [Template::fixed("HELP [[Name]]")];
        assert_eq!(code(&templates, true), ValidationErrorCode::UsingReservedCommandName);
        assert!(check(&templates, false).is_ok());
    }

    #[test]
    fn test_template_needs_leading_keyword() {
        assert_eq!(
            code(&[Template::fixed("[[Name]]")], false),
            ValidationErrorCode::InputTemplateIsNullOrEmpty
        );
        assert_eq!(
            code(&[ParameterizedTemplate::new("  ").into()], false),
            ValidationErrorCode::InputTemplateIsNullOrEmpty
        );
    }

    #[test]
    fn test_leading_keywords_unique_across_kinds() {
        let templates = [
            Template::fixed("docker run"),
            ParameterizedTemplate::new("docker run").into(),
        ];
        assert_eq!(
            check(&templates, false),
            Err(ValidationError::DuplicateInputTemplate("docker run".to_string()))
        );
    }

    #[test]
    fn test_fixed_slots_must_be_scalar_fields() {
        assert_eq!(
            code(&[Template::fixed("set [[Missing]]")], false),
            ValidationErrorCode::MissingPropertyInCommandClass
        );
        assert_eq!(
            code(&[Template::fixed("set [[Tags]]")], false),
            ValidationErrorCode::UnsupportedPropertyType
        );
        assert!(check(&[Template::fixed("set [[Name]] [[Count]]")], false).is_ok());
    }

    #[test]
    fn test_parameter_names_and_aliases_are_distinct() {
        let template: Template = ParameterizedTemplate::new("run")
            .with_parameter(Parameter::valued("--name", "[[Name]]").with_alias("-n"))
            .with_parameter(Parameter::valued("-n", "[[Count]]"))
            .into();
        assert_eq!(
            check(&[template], false),
            Err(ValidationError::DuplicateParameterName {
                command: "run".to_string(),
                name: "-n".to_string(),
            })
        );
    }

    #[test]
    fn test_flag_rules() {
        assert_eq!(
            code(&[run(Parameter::flag("-f", "Forced").repeatable())], false),
            ValidationErrorCode::RepeatableOnlyNameParameter
        );
        assert_eq!(
            code(&[run(Parameter::flag("-f", "Forced").required())], false),
            ValidationErrorCode::RequiredOnlyNameParameter
        );
        assert_eq!(
            code(&[run(Parameter::flag("-f", "Nope"))], false),
            ValidationErrorCode::MissingPropertyInCommandClass
        );
        assert_eq!(
            code(&[run(Parameter::flag("-f", "Count"))], false),
            ValidationErrorCode::OnlyNameParameterTypeNotBool
        );
        assert!(check(&[run(Parameter::flag("-f", "Forced"))], false).is_ok());
    }

    #[test]
    fn test_value_template_needs_a_slot() {
        assert_eq!(
            code(&[run(Parameter::valued("-n", "Name"))], false),
            ValidationErrorCode::InvalidValueTemplate
        );
    }

    #[test]
    fn test_composite_shape_follows_repeatable() {
        assert!(check(&[run(Parameter::valued("-e", "[[Key]]=[[Value]]").composite("Entry"))], false).is_ok());
        assert!(
            check(
                &[run(Parameter::valued("-e", "[[Key]]=[[Value]]").composite("Entries").repeatable())],
                false
            )
            .is_ok()
        );
        assert_eq!(
            code(&[run(Parameter::valued("-e", "[[Key]]=[[Value]]").composite("Entries"))], false),
            ValidationErrorCode::UnsupportedPropertyType
        );
        assert_eq!(
            code(&[run(Parameter::valued("-e", "[[Key]]=[[Value]]").composite("Gone"))], false),
            ValidationErrorCode::MissingPropertyInCommandClass
        );
        assert_eq!(
            code(&[run(Parameter::valued("-e", "[[Key]]=[[Name]]").composite("Entry"))], false),
            ValidationErrorCode::MissingPropertyInCommandClass
        );
    }

    #[test]
    fn test_repeatable_scalar_binds_to_list() {
        assert!(check(&[run(Parameter::valued("-t", "[[Tags]]").repeatable())], false).is_ok());
        assert_eq!(
            code(&[run(Parameter::valued("-t", "[[Name]]").repeatable())], false),
            ValidationErrorCode::UnsupportedPropertyType
        );
        assert_eq!(
            code(&[run(Parameter::valued("-t", "[[Tags]]"))], false),
            ValidationErrorCode::UnsupportedPropertyType
        );
    }

    #[test]
    fn test_templates_are_checked_in_registration_order() {
        let templates = [Template::fixed("go [[Missing]]"), Template::fixed("help")];
        assert_eq!(
            code(&templates, true),
            ValidationErrorCode::MissingPropertyInCommandClass
        );

        let templates = [Template::fixed("help"), Template::fixed("go [[Missing]]")];
        assert_eq!(code(&templates, true), ValidationErrorCode::UsingReservedCommandName);

        let templates = [
            run(Parameter::flag("-f", "Count")),
            Template::fixed("stop"),
            Template::fixed("stop"),
        ];
        assert_eq!(
            code(&templates, false),
            ValidationErrorCode::OnlyNameParameterTypeNotBool
        );
    }

    #[test]
    fn test_validation_is_repeatable() {
        let templates = [Template::fixed("stop"), Template::fixed("stop")];
        assert_eq!(check(&templates, false), check(&templates, false));
    }
}
