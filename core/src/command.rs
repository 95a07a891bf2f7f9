//! Registered commands: template, record descriptor and handler.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use crate::cancel::CancellationToken;
use crate::parser::{ParseFailure, ParsingResult, fixed, parameterized};
use crate::target::{BindError, FieldLookup, TargetDescriptor};
use crate::template::Template;

/// Error type returned by handlers.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

/// Executes a bound command record.
///
/// Closures with the matching signature implement this trait, so most
/// commands never name it. Implement it directly for handlers that carry
/// state or are produced by a factory.
pub trait CommandHandler<T> {
    fn handle(&mut self, command: T, out: &mut dyn Write, cancel: &CancellationToken)
    -> HandlerResult;
}

impl<T, F> CommandHandler<T> for F
where
    F: FnMut(T, &mut dyn Write, &CancellationToken) -> HandlerResult,
{
    fn handle(
        &mut self,
        command: T,
        out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> HandlerResult {
        self(command, out, cancel)
    }
}

/// How a command's handler is obtained for each dispatch.
pub enum Handler<T> {
    /// One handler instance reused for every dispatch.
    Direct(Box<dyn CommandHandler<T>>),
    /// A fresh handler created for every dispatch.
    Factory(Box<dyn Fn() -> Box<dyn CommandHandler<T>>>),
}

impl<T: 'static> Handler<T> {
    /// Wraps a closure invoked for every matching line.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_shell_core::Handler;
    ///
    /// let handler = Handler::direct(|count: u32, out, _cancel| {
    ///     writeln!(out, "count = {count}")?;
    ///     Ok(())
    /// });
    /// # let _ = handler;
    /// ```
    pub fn direct<F>(handler: F) -> Self
    where
        F: FnMut(T, &mut dyn Write, &CancellationToken) -> HandlerResult + 'static,
    {
        Self::Direct(Box::new(handler))
    }

    /// Wraps an existing handler value.
    pub fn instance<H>(handler: H) -> Self
    where
        H: CommandHandler<T> + 'static,
    {
        Self::Direct(Box::new(handler))
    }

    /// Creates a new handler with `make` for every matching line.
    pub fn factory<H, F>(make: F) -> Self
    where
        H: CommandHandler<T> + 'static,
        F: Fn() -> H + 'static,
    {
        Self::Factory(Box::new(move || Box::new(make()) as Box<dyn CommandHandler<T>>))
    }

    fn invoke(&mut self, command: T, out: &mut dyn Write, cancel: &CancellationToken) -> HandlerResult {
        match self {
            Self::Direct(handler) => handler.handle(command, out, cancel),
            Self::Factory(make) => make().handle(command, out, cancel),
        }
    }
}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Handler::Direct"),
            Self::Factory(_) => f.write_str("Handler::Factory"),
        }
    }
}

/// A template bound to a record type and a handler.
///
/// # Examples
///
/// ```
/// use command_shell_core::{Command, Handler, TargetDescriptor, Template};
///
/// #[derive(Default)]
/// struct Block {
///     username: String,
/// }
///
/// let command = Command::new(
///     Template::fixed("block user [[Username]]"),
///     TargetDescriptor::<Block>::new("Block")
///         .field("Username", |b: &mut Block, v: String| b.username = v),
///     Handler::direct(|block: Block, out, _| {
///         writeln!(out, "blocked {}", block.username)?;
///         Ok(())
///     }),
/// )
/// .with_description("Blocks a user");
/// assert_eq!(command.template().keyword(), "block user");
/// ```
#[derive(Debug)]
pub struct Command<T> {
    template: Template,
    descriptor: TargetDescriptor<T>,
    handler: Handler<T>,
    description: Option<String>,
}

impl<T> Command<T> {
    pub fn new(
        template: impl Into<Template>,
        descriptor: TargetDescriptor<T>,
        handler: Handler<T>,
    ) -> Self {
        Self {
            template: template.into(),
            descriptor,
            handler,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Result of trying one registered command against a line.
#[derive(Debug)]
pub(crate) enum Attempt {
    NoMatch,
    Rejected(ParseFailure),
    Invoked(HandlerResult),
    Panicked(String),
}

/// Type-erased view of a [`Command`] used by the shell.
pub(crate) trait Dispatch {
    fn template(&self) -> &Template;

    fn lookup(&self) -> &dyn FieldLookup;

    fn description(&self) -> Option<&str>;

    /// Matches `tokens`, binds a record and runs the handler on success.
    fn attempt(
        &mut self,
        tokens: &[String],
        out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<Attempt, BindError>;
}

impl<T: Default + 'static> Dispatch for Command<T> {
    fn template(&self) -> &Template {
        &self.template
    }

    fn lookup(&self) -> &dyn FieldLookup {
        &self.descriptor
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn attempt(
        &mut self,
        tokens: &[String],
        out: &mut dyn Write,
        cancel: &CancellationToken,
    ) -> Result<Attempt, BindError> {
        let record = match &self.template {
            Template::Fixed(template) => {
                let Some(bindings) = fixed::try_parse_tokens(tokens, template) else {
                    return Ok(Attempt::NoMatch);
                };
                let mut record = T::default();
                for (slot, value) in &bindings {
                    self.descriptor.set_scalar(&mut record, slot, value)?;
                }
                record
            }
            Template::Parameterized(template) => {
                match parameterized::try_parse_tokens(tokens, template, &self.descriptor)? {
                    ParsingResult::NoMatch => return Ok(Attempt::NoMatch),
                    ParsingResult::Failed(failure) => return Ok(Attempt::Rejected(failure)),
                    ParsingResult::Parsed(record) => record,
                }
            }
        };

        let handler = &mut self.handler;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(record, out, cancel)));
        Ok(match outcome {
            Ok(result) => Attempt::Invoked(result),
            Err(payload) => Attempt::Panicked(panic_message(payload.as_ref())),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
