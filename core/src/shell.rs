//! The read, match, bind and invoke loop.
//!
//! A [`ShellBuilder`] collects commands and I/O endpoints, validates the
//! registration and produces a [`Shell`]. The shell reads one line at a time,
//! tries the registered templates in registration order and runs the
//! handler of the first one that matches.
//!
//! # Examples
//!
//! ```
//! use std::io::Cursor;
//!
//! use command_shell_core::*;
//!
//! #[derive(Default)]
//! struct Start {
//!     url: String,
//!     threads: u32,
//! }
//!
//! let mut shell = ShellBuilder::new()
//!     .read_from(Cursor::new("start http://site.com 4\nstart\n"))
//!     .write_to(Vec::new())
//!     .register_fixed(
//!         "start [[Url]] [[ThreadsCount]]",
//!         TargetDescriptor::<Start>::new("Start")
//!             .field("Url", |s: &mut Start, v: String| s.url = v)
//!             .field("ThreadsCount", |s: &mut Start, v: u32| s.threads = v),
//!         Handler::direct(|start: Start, out, _| {
//!             writeln!(out, "starting {} with {} threads", start.url, start.threads)?;
//!             Ok(())
//!         }),
//!         None,
//!     )
//!     .build()
//!     .unwrap();
//!
//! shell.run(&CancellationToken::new()).unwrap();
//! assert_eq!(
//!     String::from_utf8(shell.into_writer()).unwrap(),
//!     "starting http://site.com with 4 threads\nCommand not found.\n"
//! );
//! ```

use std::fmt;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::command::{Attempt, Command, Dispatch, Handler};
use crate::error::ShellError;
use crate::help::help_text;
use crate::parser::ParseFailure;
use crate::target::{BindError, TargetDescriptor};
use crate::template::{ParameterizedTemplate, Template};
use crate::tokenize::tokenize;
use crate::validate::{HELP_COMMAND, ValidationError, validate};

const NOT_FOUND: &str = "Command not found.";
const HELP_HINT: &str = " Type 'help' for getting available commands.";
const FORMAT_ERROR: &str = "Incorrect command format.";
const PROCESSING_ERROR: &str = "Error during command processing.";

/// Collects registrations and endpoints for a [`Shell`].
///
/// Defaults to reading standard input and writing standard output, without
/// a diagnostic sink or help support.
pub struct ShellBuilder<R = StdinLock<'static>, W = Stdout> {
    input: R,
    output: W,
    diagnostics: Option<Box<dyn Write>>,
    help: HelpSupport,
    commands: Vec<Box<dyn Dispatch>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HelpSupport {
    Off,
    /// Not-found messages point to `help`; the command itself is user-provided.
    Hint,
    /// Not-found hint plus a generated `help` command.
    Generated,
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            input: io::stdin().lock(),
            output: io::stdout(),
            diagnostics: None,
            help: HelpSupport::Off,
            commands: Vec::new(),
        }
    }
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BufRead, W: Write> ShellBuilder<R, W> {
    /// Reads commands from `input` instead of standard input.
    pub fn read_from<I: BufRead>(self, input: I) -> ShellBuilder<I, W> {
        ShellBuilder {
            input,
            output: self.output,
            diagnostics: self.diagnostics,
            help: self.help,
            commands: self.commands,
        }
    }

    /// Writes handler output and user-facing messages to `output`.
    pub fn write_to<O: Write>(self, output: O) -> ShellBuilder<R, O> {
        ShellBuilder {
            input: self.input,
            output,
            diagnostics: self.diagnostics,
            help: self.help,
            commands: self.commands,
        }
    }

    /// Writes one line per internal failure (raw input plus detail) to `sink`.
    pub fn log_errors_to(mut self, sink: impl Write + 'static) -> Self {
        self.diagnostics = Some(Box::new(sink));
        self
    }

    /// Enables the `help` hint in not-found messages. With `generate`, a
    /// `help` command listing every registered command is added and the
    /// name `help` becomes reserved.
    pub fn support_help_command(mut self, generate: bool) -> Self {
        self.help = if generate {
            HelpSupport::Generated
        } else {
            HelpSupport::Hint
        };
        self
    }

    /// Registers a command. Commands are tried in registration order.
    pub fn register<T: Default + 'static>(mut self, command: Command<T>) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    /// Registers a fixed template such as `add user [[Username]] [[Age]]`.
    pub fn register_fixed<T: Default + 'static>(
        self,
        template: &str,
        descriptor: TargetDescriptor<T>,
        handler: Handler<T>,
        description: Option<&str>,
    ) -> Self {
        self.register(described(
            Command::new(Template::fixed(template), descriptor, handler),
            description,
        ))
    }

    /// Registers a parameterized template.
    pub fn register_parameterized<T: Default + 'static>(
        self,
        template: ParameterizedTemplate,
        descriptor: TargetDescriptor<T>,
        handler: Handler<T>,
        description: Option<&str>,
    ) -> Self {
        self.register(described(
            Command::new(template, descriptor, handler),
            description,
        ))
    }

    /// Help text for the commands registered so far.
    ///
    /// Works whether or not help generation is enabled, and does not validate.
    pub fn help_text(&self) -> String {
        help_text(
            self.commands
                .iter()
                .map(|command| (command.template(), command.description())),
        )
    }

    /// Validates the registration and builds the shell.
    pub fn build(mut self) -> Result<Shell<R, W>, ValidationError> {
        validate(
            self.commands
                .iter()
                .map(|command| (command.template(), command.lookup())),
            self.help == HelpSupport::Generated,
        )?;

        let mut generated_help = None;
        if self.help == HelpSupport::Generated {
            let text = self.help_text();
            generated_help = Some(text.clone());
            self.commands.push(Box::new(Command::new(
                Template::fixed(HELP_COMMAND),
                TargetDescriptor::<()>::new("Help"),
                Handler::direct(move |(), out, _| {
                    writeln!(out, "{text}")?;
                    Ok(())
                }),
            )));
        }

        info!(commands = self.commands.len(), "shell built");
        Ok(Shell {
            input: self.input,
            output: self.output,
            diagnostics: self.diagnostics,
            help_hint: self.help != HelpSupport::Off,
            help_text: generated_help,
            commands: self.commands,
        })
    }
}

fn described<T>(command: Command<T>, description: Option<&str>) -> Command<T> {
    match description {
        Some(description) => command.with_description(description),
        None => command,
    }
}

impl<R, W> fmt::Debug for ShellBuilder<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellBuilder")
            .field("commands", &self.commands.len())
            .field("help", &self.help)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

/// What happened to one input line.
#[derive(Debug, PartialEq)]
pub enum LineOutcome {
    /// The line was blank.
    Skipped,
    /// No template matched.
    NotFound,
    /// A parameterized template matched but the line was invalid.
    Rejected(ParseFailure),
    /// A template matched but a captured value could not be bound.
    Malformed(BindError),
    /// The handler ran and succeeded.
    Handled,
    /// The handler returned an error or panicked.
    HandlerFailed(String),
}

/// A validated, ready-to-run command shell.
pub struct Shell<R, W> {
    input: R,
    output: W,
    diagnostics: Option<Box<dyn Write>>,
    help_hint: bool,
    help_text: Option<String>,
    commands: Vec<Box<dyn Dispatch>>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Processes lines until `cancel` is set or input ends.
    ///
    /// Per-line problems are reported on the output and never stop the loop;
    /// only I/O errors on the input, output or diagnostic sink do.
    pub fn run(&mut self, cancel: &CancellationToken) -> Result<(), ShellError> {
        let mut buf = Vec::new();
        while !cancel.is_cancelled() {
            buf.clear();
            if self.input.read_until(b'\n', &mut buf)? == 0 {
                debug!("end of input");
                break;
            }
            // Invalid UTF-8 is replaced, not fatal.
            let line = String::from_utf8_lossy(&buf);
            self.process_line(line.trim_end_matches(['\r', '\n']), cancel)?;
        }
        Ok(())
    }
}

impl<R, W: Write> Shell<R, W> {
    /// Matches and dispatches a single line.
    pub fn process_line(
        &mut self,
        line: &str,
        cancel: &CancellationToken,
    ) -> Result<LineOutcome, ShellError> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Ok(LineOutcome::Skipped);
        }

        let mut matched = None;
        for command in &mut self.commands {
            match command.attempt(&tokens, &mut self.output, cancel) {
                Ok(Attempt::NoMatch) => continue,
                attempt => {
                    matched = Some((command.template().help_header().to_string(), attempt));
                    break;
                }
            }
        }

        let Some((command, attempt)) = matched else {
            debug!(input = line, "command not found");
            let hint = if self.help_hint { HELP_HINT } else { "" };
            self.reply(&format!("{NOT_FOUND}{hint}"))?;
            return Ok(LineOutcome::NotFound);
        };

        match attempt {
            Ok(Attempt::NoMatch) => unreachable!("non-matching commands are skipped"),
            Ok(Attempt::Invoked(Ok(()))) => {
                debug!(command = %command, "command handled");
                Ok(LineOutcome::Handled)
            }
            Ok(Attempt::Rejected(failure)) => {
                warn!(command = %command, input = line, %failure, "command rejected");
                self.diagnose(&format!(
                    "{} during command parsing: {line}. Error: {failure}",
                    failure.kind()
                ))?;
                self.reply(&failure.message(&command))?;
                Ok(LineOutcome::Rejected(failure))
            }
            Err(err) if err.is_conversion() => {
                warn!(command = %command, input = line, error = %err, "invalid value format");
                self.diagnose(&format!(
                    "Format error during command parsing: {line}. Error: {err}"
                ))?;
                self.reply(FORMAT_ERROR)?;
                Ok(LineOutcome::Malformed(err))
            }
            Err(err) => {
                error!(command = %command, input = line, error = %err, "binding failed");
                self.diagnose(&format!(
                    "Unexpected error during command processing: {line}. Error: {err}"
                ))?;
                self.reply(PROCESSING_ERROR)?;
                Ok(LineOutcome::Malformed(err))
            }
            Ok(Attempt::Invoked(Err(err))) => self.handler_failed(&command, line, err.to_string()),
            Ok(Attempt::Panicked(message)) => {
                self.handler_failed(&command, line, format!("handler panicked: {message}"))
            }
        }
    }

    /// The generated help text, when help generation is enabled.
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    pub fn writer(&self) -> &W {
        &self.output
    }

    pub fn into_writer(self) -> W {
        self.output
    }

    fn handler_failed(
        &mut self,
        command: &str,
        line: &str,
        detail: String,
    ) -> Result<LineOutcome, ShellError> {
        error!(command = %command, input = line, error = %detail, "command handler failed");
        self.diagnose(&format!(
            "Unexpected error during command processing: {line}. Error: {detail}"
        ))?;
        Ok(LineOutcome::HandlerFailed(detail))
    }

    fn reply(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()
    }

    fn diagnose(&mut self, message: &str) -> io::Result<()> {
        if let Some(sink) = self.diagnostics.as_mut() {
            writeln!(sink, "{message}")?;
            sink.flush()?;
        }
        Ok(())
    }
}

impl<R, W> fmt::Debug for Shell<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("commands", &self.commands.len())
            .field("help_hint", &self.help_hint)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}
