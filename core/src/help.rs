//! Text of the generated `help` command.

use crate::template::{Parameter, Template};

const COLUMN_GAP: usize = 4;

/// Builds the help text for `commands`, in the given order.
///
/// Each command contributes a block of the form
///
/// ```text
///
/// Command: <template or name>
/// Description: <description>
/// Parameters:
/// <name>    <alias>    <description>
/// ```
///
/// The description and parameter lines appear only when present. Parameter
/// columns are aligned across all commands: every column except the last is
/// padded to its widest value plus four spaces.
///
/// # Examples
///
/// ```
/// use command_shell_core::{Parameter, ParameterizedTemplate, Template, help_text};
///
/// let stop = Template::fixed("stop");
/// let run: Template = ParameterizedTemplate::new("docker run")
///     .with_parameter(Parameter::valued("--name", "[[Name]]").with_alias("-n").with_description("Container name"))
///     .with_parameter(Parameter::flag("--rm", "Removed"))
///     .into();
///
/// let text = help_text([(&stop, Some("Stops the service")), (&run, None)]);
/// assert_eq!(
///     text,
///     "\nCommand: stop\nDescription: Stops the service\n\
///      \nCommand: docker run\nParameters:\n--name    -n    Container name\n--rm\n"
/// );
/// ```
pub fn help_text<'a, I>(commands: I) -> String
where
    I: IntoIterator<Item = (&'a Template, Option<&'a str>)>,
{
    let commands: Vec<_> = commands.into_iter().collect();

    let mut name_width = 0;
    let mut alias_width = 0;
    for parameter in commands.iter().flat_map(|(template, _)| parameters(template)) {
        name_width = name_width.max(parameter.name.chars().count());
        alias_width = alias_width.max(parameter.alias.as_deref().map_or(0, |a| a.chars().count()));
    }
    name_width += COLUMN_GAP;
    alias_width += COLUMN_GAP;

    let mut text = String::new();
    for (template, description) in commands {
        text.push_str("\nCommand: ");
        text.push_str(template.help_header());
        text.push('\n');

        if let Some(description) = description.filter(|d| !d.is_empty()) {
            text.push_str("Description: ");
            text.push_str(description);
            text.push('\n');
        }

        let rows: Vec<String> = parameters(template)
            .iter()
            .map(|parameter| {
                let row = format!(
                    "{:<name_width$}{:<alias_width$}{}",
                    parameter.name,
                    parameter.alias.as_deref().unwrap_or(""),
                    parameter.description.as_deref().unwrap_or(""),
                );
                row.trim_end().to_string()
            })
            .collect();
        if !rows.is_empty() {
            text.push_str("Parameters:\n");
            text.push_str(&rows.join("\n"));
            text.push('\n');
        }
    }
    text
}

fn parameters(template: &Template) -> &[Parameter] {
    match template {
        Template::Fixed(_) => &[],
        Template::Parameterized(parameterized) => parameterized.parameters(),
    }
}
