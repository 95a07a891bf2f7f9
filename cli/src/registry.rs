//! YAML command registries.
//!
//! A registry describes a set of commands without any Rust code:
//!
//! ```yaml
//! help: true
//! exit_command: exit
//! commands:
//!   - template: start [[Url]] [[ThreadsCount]]
//!     description: Starts the crawler
//!     fields:
//!       Url: text
//!       ThreadsCount: uint
//!   - name: docker run
//!     fields:
//!       Name: text
//!       Detached: bool
//!       Volumes:
//!         list:
//!           Name: text
//!           MapTo: text
//!     parameters:
//!       - { name: --name, required: true, value: "[[Name]]" }
//!       - { name: -d, flag: Detached }
//!       - { name: --volume, alias: -v, repeatable: true, composite: Volumes, value: "[[Name]]:[[MapTo]]" }
//! ```
//!
//! Every matched command prints one JSON line with the command keyword and
//! the bound fields.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use command_shell_core::{
    CancellationToken, FieldValue, Handler, Parameter, ParameterizedTemplate, Shell, ShellBuilder,
    TargetDescriptor, ValidationError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::record::{Record, Scalar};

/// Registry loading and building errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A parameter defines neither or both of `value` and `flag`.
    #[error("parameter {parameter} of command {command} must define exactly one of `value` or `flag`")]
    ParameterKind { command: String, parameter: String },

    /// The commands do not form a valid template set.
    #[error("invalid registry: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Root of a registry file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registry {
    /// Generate a `help` command.
    #[serde(default)]
    pub help: bool,
    /// Keyword of a command that ends the session.
    #[serde(default)]
    pub exit_command: Option<String>,
    pub commands: Vec<CommandSpec>,
}

/// A registered command: fixed when it has a `template`, parameterized when
/// it has a `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Fixed(FixedSpec),
    Parameterized(ParameterizedSpec),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixedSpec {
    pub template: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterizedSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

/// Scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarSpec {
    Bool,
    Int,
    Uint,
    Float,
    Text,
}

/// Shape of a record field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Scalar(ScalarSpec),
    Composite {
        composite: BTreeMap<String, FieldSpec>,
    },
    List {
        list: ListSpec,
    },
}

/// Element type of a list field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListSpec {
    Scalar(ScalarSpec),
    Composite(BTreeMap<String, FieldSpec>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub composite: Option<String>,
    /// Value template, e.g. `[[Name]]=[[Value]]`.
    #[serde(default)]
    pub value: Option<String>,
    /// Boolean field set by a flag switch.
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParameterSpec {
    fn to_parameter(&self, command: &str) -> Result<Parameter> {
        let mut parameter = match (&self.value, &self.flag) {
            (Some(value), None) => Parameter::valued(&self.name, value),
            (None, Some(field)) => Parameter::flag(&self.name, field),
            _ => {
                return Err(RegistryError::ParameterKind {
                    command: command.to_string(),
                    parameter: self.name.clone(),
                });
            }
        };
        if let Some(alias) = &self.alias {
            parameter = parameter.with_alias(alias);
        }
        if self.required {
            parameter = parameter.required();
        }
        if self.repeatable {
            parameter = parameter.repeatable();
        }
        if let Some(composite) = &self.composite {
            parameter = parameter.composite(composite);
        }
        if let Some(description) = &self.description {
            parameter = parameter.with_description(description);
        }
        Ok(parameter)
    }
}

impl Registry {
    /// Loads a registry from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let registry = serde_yaml::from_reader(reader)?;
        Ok(registry)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Registers every command of the registry on `builder`.
    ///
    /// The exit command, if any, is registered after the listed commands.
    pub fn register_into<R: BufRead, W: Write>(
        &self,
        mut builder: ShellBuilder<R, W>,
    ) -> Result<ShellBuilder<R, W>> {
        if self.help {
            builder = builder.support_help_command(true);
        }

        for command in &self.commands {
            builder = match command {
                CommandSpec::Fixed(spec) => builder.register_fixed(
                    &spec.template,
                    descriptor(&spec.template, &spec.fields),
                    json_handler(spec.template.clone()),
                    spec.description.as_deref(),
                ),
                CommandSpec::Parameterized(spec) => {
                    let mut template = ParameterizedTemplate::new(&spec.name);
                    for parameter in &spec.parameters {
                        template = template.with_parameter(parameter.to_parameter(&spec.name)?);
                    }
                    builder.register_parameterized(
                        template,
                        descriptor(&spec.name, &spec.fields),
                        json_handler(spec.name.clone()),
                        spec.description.as_deref(),
                    )
                }
            };
        }

        if let Some(exit) = &self.exit_command {
            builder = builder.register_fixed(
                exit,
                TargetDescriptor::<()>::new("Exit"),
                Handler::direct(|(), _, cancel: &CancellationToken| {
                    debug!("exit requested");
                    cancel.cancel();
                    Ok(())
                }),
                Some("Ends the session"),
            );
        }

        Ok(builder)
    }

    /// Registers every command on `builder` and builds the shell.
    pub fn build<R: BufRead, W: Write>(&self, builder: ShellBuilder<R, W>) -> Result<Shell<R, W>> {
        Ok(self.register_into(builder)?.build()?)
    }

    /// Number of commands the built shell will know, excluding `help`.
    pub fn command_count(&self) -> usize {
        self.commands.len() + usize::from(self.exit_command.is_some())
    }
}

/// One output line of a dispatched command.
#[derive(Serialize)]
struct Dispatched<'a> {
    command: &'a str,
    fields: &'a Record,
}

fn json_handler(command: String) -> Handler<Record> {
    Handler::direct(move |record: Record, out, _| {
        let line = serde_json::to_string(&Dispatched {
            command: &command,
            fields: &record,
        })?;
        writeln!(out, "{line}")?;
        Ok(())
    })
}

fn descriptor(type_name: &str, fields: &BTreeMap<String, FieldSpec>) -> TargetDescriptor<Record> {
    fields
        .iter()
        .fold(TargetDescriptor::new(type_name), |descriptor, (name, spec)| {
            add_field(descriptor, name, spec)
        })
}

fn add_field(
    descriptor: TargetDescriptor<Record>,
    name: &str,
    spec: &FieldSpec,
) -> TargetDescriptor<Record> {
    let key = name.to_string();
    match spec {
        FieldSpec::Scalar(scalar) => add_scalar(descriptor, name, *scalar, false),
        FieldSpec::List {
            list: ListSpec::Scalar(scalar),
        } => add_scalar(descriptor, name, *scalar, true),
        FieldSpec::Composite { composite } => descriptor.composite(
            name,
            self::descriptor(name, composite),
            move |record: &mut Record| record.nested_mut(&key),
        ),
        FieldSpec::List {
            list: ListSpec::Composite(fields),
        } => descriptor.composite_list(
            name,
            self::descriptor(name, fields),
            move |record: &mut Record, element: Record| record.push_nested(&key, element),
        ),
    }
}

fn add_scalar(
    descriptor: TargetDescriptor<Record>,
    name: &str,
    scalar: ScalarSpec,
    list: bool,
) -> TargetDescriptor<Record> {
    match scalar {
        ScalarSpec::Bool => typed::<bool>(descriptor, name, list),
        ScalarSpec::Int => typed::<i64>(descriptor, name, list),
        ScalarSpec::Uint => typed::<u64>(descriptor, name, list),
        ScalarSpec::Float => typed::<f64>(descriptor, name, list),
        ScalarSpec::Text => typed::<String>(descriptor, name, list),
    }
}

fn typed<V>(descriptor: TargetDescriptor<Record>, name: &str, list: bool) -> TargetDescriptor<Record>
where
    V: FieldValue + Into<Scalar> + 'static,
{
    let key = name.to_string();
    if list {
        descriptor.list(name, move |record: &mut Record, value: V| {
            record.push(&key, value.into())
        })
    } else {
        descriptor.field(name, move |record: &mut Record, value: V| {
            record.set(&key, value.into())
        })
    }
}
