//! Keyword prefix plus named switch matching.

use std::collections::HashSet;

use crate::parser::{ParseFailure, ParsingResult};
use crate::target::{BindError, TargetDescriptor};
use crate::template::{Parameter, ParameterKind, ParameterizedTemplate};
use crate::tokenize::tokenize;

/// Matches `input` against a parameterized template and binds a fresh `T`.
///
/// The template's keywords must prefix the line exactly (case-sensitive),
/// otherwise the result is [`ParsingResult::NoMatch`]. The remaining tokens
/// are scanned once, left to right, alternating between a switch name (or
/// alias) and, for valued switches, its value. A valued switch that ends the
/// line without a value is ignored.
///
/// Captured values that cannot be converted to their field type produce
/// `Err(BindError::Conversion)`; every other problem is reported as
/// [`ParsingResult::Failed`].
///
/// # Examples
///
/// ```
/// use command_shell_core::parser::parameterized::try_parse;
/// use command_shell_core::{Parameter, ParameterizedTemplate, ParsingResult, TargetDescriptor};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Ports {
///     external: u16,
///     internal: u16,
///     detached: bool,
/// }
///
/// let template = ParameterizedTemplate::new("docker run")
///     .with_parameter(Parameter::valued("-p", "[[External]]:[[Internal]]"))
///     .with_parameter(Parameter::flag("-d", "Detached"));
/// let descriptor = TargetDescriptor::<Ports>::new("Ports")
///     .field("External", |p: &mut Ports, v: u16| p.external = v)
///     .field("Internal", |p: &mut Ports, v: u16| p.internal = v)
///     .field("Detached", |p: &mut Ports, v: bool| p.detached = v);
///
/// let result = try_parse("docker run -d -p 25000:40000", &template, &descriptor).unwrap();
/// assert_eq!(
///     result,
///     ParsingResult::Parsed(Ports { external: 25000, internal: 40000, detached: true })
/// );
/// assert_eq!(
///     try_parse("dock run -d", &template, &descriptor).unwrap(),
///     ParsingResult::NoMatch
/// );
/// ```
pub fn try_parse<T: Default>(
    input: &str,
    template: &ParameterizedTemplate,
    descriptor: &TargetDescriptor<T>,
) -> Result<ParsingResult<T>, BindError> {
    try_parse_tokens(&tokenize(input), template, descriptor)
}

/// Same as [`try_parse`] on an already tokenized line.
pub fn try_parse_tokens<T: Default>(
    tokens: &[String],
    template: &ParameterizedTemplate,
    descriptor: &TargetDescriptor<T>,
) -> Result<ParsingResult<T>, BindError> {
    let keywords = template.keywords();
    if tokens.len() < keywords.len()
        || keywords.iter().zip(tokens).any(|(keyword, token)| keyword != token)
    {
        return Ok(ParsingResult::NoMatch);
    }

    let mut record = T::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rest = tokens[keywords.len()..].iter();

    while let Some(token) = rest.next() {
        let Some(parameter) = template.find_parameter(token) else {
            return Ok(failed(ParseFailure::UnknownParameter(token.clone())));
        };

        match &parameter.kind {
            ParameterKind::Flag { field } => {
                if !seen.insert(parameter.name.as_str()) {
                    return Ok(failed(ParseFailure::DuplicateParameter(
                        parameter.name.clone(),
                    )));
                }
                descriptor.set_flag(&mut record, field)?;
            }
            ParameterKind::Valued(value_template) => {
                let Some(value) = rest.next() else {
                    break;
                };
                if !seen.insert(parameter.name.as_str()) && !parameter.repeatable {
                    return Ok(failed(ParseFailure::DuplicateParameter(
                        parameter.name.clone(),
                    )));
                }
                let Some(captures) = value_template.capture(value) else {
                    return Ok(failed(ParseFailure::MalformedValue {
                        parameter: parameter.name.clone(),
                        value: value.clone(),
                        template: value_template.to_string(),
                    }));
                };
                bind(descriptor, &mut record, parameter, &captures)?;
            }
        }
    }

    let mut missing: Vec<String> = Vec::new();
    for parameter in template.parameters() {
        if parameter.required
            && !seen.contains(parameter.name.as_str())
            && !missing.contains(&parameter.name)
        {
            missing.push(parameter.name.clone());
        }
    }
    if !missing.is_empty() {
        return Ok(failed(ParseFailure::MissingRequired(missing)));
    }

    Ok(ParsingResult::Parsed(record))
}

fn failed<T>(failure: ParseFailure) -> ParsingResult<T> {
    ParsingResult::Failed(failure)
}

fn bind<T>(
    descriptor: &TargetDescriptor<T>,
    record: &mut T,
    parameter: &Parameter,
    captures: &[(&str, String)],
) -> Result<(), BindError> {
    if let Some(composite) = &parameter.composite {
        return descriptor.assign_nested(record, composite, captures);
    }

    for (slot, value) in captures {
        if parameter.repeatable {
            descriptor.push_scalar(record, slot, value)?;
        } else {
            descriptor.set_scalar(record, slot, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        name: String,
        value: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Run {
        name: String,
        detached: bool,
        removed: bool,
        port: u16,
        env: Vec<Pair>,
        labels: Vec<String>,
        image: Option<Pair>,
    }

    fn pair_descriptor() -> TargetDescriptor<Pair> {
        TargetDescriptor::new("Pair")
            .field("Name", |p: &mut Pair, v: String| p.name = v)
            .field("Value", |p: &mut Pair, v: String| p.value = v)
    }

    fn descriptor() -> TargetDescriptor<Run> {
        TargetDescriptor::new("Run")
            .field("Name", |r: &mut Run, v: String| r.name = v)
            .field("Detached", |r: &mut Run, v: bool| r.detached = v)
            .field("Removed", |r: &mut Run, v: bool| r.removed = v)
            .field("Port", |r: &mut Run, v: u16| r.port = v)
            .list("Label", |r: &mut Run, v: String| r.labels.push(v))
            .composite_list("Env", pair_descriptor(), |r: &mut Run, p| r.env.push(p))
            .composite("Image", pair_descriptor(), |r: &mut Run| {
                r.image.get_or_insert_with(Default::default)
            })
    }

    fn template() -> ParameterizedTemplate {
        ParameterizedTemplate::new("docker run")
            .with_parameter(Parameter::valued("--name", "[[Name]]").with_alias("-n").required())
            .with_parameter(Parameter::valued("--image", "[[Name]]:[[Value]]").composite("Image").required())
            .with_parameter(Parameter::flag("-d", "Detached"))
            .with_parameter(Parameter::flag("--rm", "Removed"))
            .with_parameter(Parameter::valued("--port", "[[Port]]"))
            .with_parameter(Parameter::valued("-e", "[[Name]]=[[Value]]").repeatable().composite("Env"))
            .with_parameter(Parameter::valued("-l", "[[Label]]").repeatable())
    }

    fn parse(input: &str) -> Result<ParsingResult<Run>, BindError> {
        try_parse(input, &template(), &descriptor())
    }

    #[test]
    fn test_full_line_binds_every_shape() {
        let run = parse(
            r#"docker run -n app --image my-service:v1 -d -e "User=Alex Smith" -e Mode=prod -l a -l b --port 8080 --rm"#,
        )
        .unwrap()
        .parsed()
        .unwrap();

        assert_eq!(run.name, "app");
        assert!(run.detached && run.removed);
        assert_eq!(run.port, 8080);
        assert_eq!(run.labels, ["a", "b"]);
        assert_eq!(
            run.env,
            [
                Pair { name: "User".into(), value: "Alex Smith".into() },
                Pair { name: "Mode".into(), value: "prod".into() },
            ]
        );
        assert_eq!(
            run.image,
            Some(Pair { name: "my-service".into(), value: "v1".into() })
        );
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert_eq!(parse("Docker run --name x").unwrap(), ParsingResult::NoMatch);
        assert_eq!(parse("docker").unwrap(), ParsingResult::NoMatch);
    }

    #[test]
    fn test_unknown_parameter_reports_token() {
        assert_eq!(
            parse("docker run --name x --image a:b -x 1").unwrap(),
            ParsingResult::Failed(ParseFailure::UnknownParameter("-x".into()))
        );
    }

    #[test]
    fn test_duplicates_report_parameter_name() {
        assert_eq!(
            parse("docker run --name x -n y --image a:b").unwrap(),
            ParsingResult::Failed(ParseFailure::DuplicateParameter("--name".into()))
        );
        assert_eq!(
            parse("docker run --name x --image a:b --rm --rm").unwrap(),
            ParsingResult::Failed(ParseFailure::DuplicateParameter("--rm".into()))
        );
    }

    #[test]
    fn test_missing_required_in_declaration_order() {
        assert_eq!(
            parse("docker run -d").unwrap(),
            ParsingResult::Failed(ParseFailure::MissingRequired(vec![
                "--name".into(),
                "--image".into()
            ]))
        );
    }

    #[test]
    fn test_trailing_switch_without_value_is_not_seen() {
        assert_eq!(
            parse("docker run --image a:b --name").unwrap(),
            ParsingResult::Failed(ParseFailure::MissingRequired(vec!["--name".into()]))
        );
    }

    #[test]
    fn test_malformed_value() {
        assert_eq!(
            parse("docker run --name x --image latest").unwrap(),
            ParsingResult::Failed(ParseFailure::MalformedValue {
                parameter: "--image".into(),
                value: "latest".into(),
                template: "[[Name]]:[[Value]]".into(),
            })
        );
    }

    #[test]
    fn test_conversion_failure_is_an_error() {
        let err = parse("docker run --name x --image a:b --port 99999").unwrap_err();
        assert!(err.is_conversion());
    }
}
