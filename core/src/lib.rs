//! Template-driven line command shells.
//!
//! This crate turns lines of text into typed command records and dispatches
//! them to handlers:
//!
//! - [`Template`]: the grammar of one command, either a [`FixedTemplate`]
//!   (`add user [[Username]] [[Age]]`) or a [`ParameterizedTemplate`]
//!   (`docker run` plus named switches such as `-v [[Name]]:[[MapTo]]`).
//! - [`TargetDescriptor`]: the field map of a record type, used to convert
//!   captured text and write it into a fresh `Default` record.
//! - [`validate`]: registration-time consistency checks over a whole
//!   template set.
//! - [`parser`]: the fixed and parameterized matchers.
//! - [`ShellBuilder`] / [`Shell`]: registration and the read, match and
//!   dispatch loop.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use command_shell_core::*;
//!
//! #[derive(Debug, Default)]
//! struct AddUser {
//!     username: String,
//!     age: u8,
//! }
//!
//! let mut shell = ShellBuilder::new()
//!     .read_from(Cursor::new("add user \"Alex Smith\" 24\nadd user Bob many\n"))
//!     .write_to(Vec::new())
//!     .support_help_command(true)
//!     .register(
//!         Command::new(
//!             Template::fixed("add user [[Username]] [[Age]]"),
//!             TargetDescriptor::<AddUser>::new("AddUser")
//!                 .field("Username", |u: &mut AddUser, v: String| u.username = v)
//!                 .field("Age", |u: &mut AddUser, v: u8| u.age = v),
//!             Handler::direct(|user: AddUser, out, _| {
//!                 writeln!(out, "added {} ({})", user.username, user.age)?;
//!                 Ok(())
//!             }),
//!         )
//!         .with_description("Adds a user"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! shell.run(&CancellationToken::new()).unwrap();
//! assert_eq!(
//!     String::from_utf8(shell.into_writer()).unwrap(),
//!     "added Alex Smith (24)\nIncorrect command format.\n"
//! );
//! ```

mod cancel;
mod command;
mod error;
mod help;
pub mod parser;
mod shell;
mod target;
mod template;
mod tokenize;
mod validate;

pub use cancel::CancellationToken;
pub use command::{Command, CommandHandler, Handler, HandlerError, HandlerResult};
pub use error::ShellError;
pub use help::help_text;
pub use parser::{ParseFailure, ParsingResult};
pub use shell::{LineOutcome, Shell, ShellBuilder};
pub use target::{BindError, FieldLookup, FieldShape, FieldValue, ScalarType, TargetDescriptor};
pub use template::{
    FixedTemplate, FixedToken, Parameter, ParameterKind, ParameterizedTemplate, Template,
    ValueSegment, ValueTemplate,
};
pub use tokenize::tokenize;
pub use validate::{HELP_COMMAND, ValidationError, ValidationErrorCode, validate};
