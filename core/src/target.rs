//! Binding targets: typed field descriptors for command records.
//!
//! A command record is any `Default` type. Instead of looking fields up by
//! name at dispatch time, each registered command carries a
//! [`TargetDescriptor`] that maps field names to typed setters. The
//! validator only asks the descriptor which fields exist and what shape they
//! have; the parsers use it to convert captured text and write it into a
//! fresh record.
//!
//! # Examples
//!
//! ```
//! use command_shell_core::{FieldLookup, FieldShape, ScalarType, TargetDescriptor};
//!
//! #[derive(Default)]
//! struct Start {
//!     url: String,
//!     threads: u32,
//! }
//!
//! let descriptor = TargetDescriptor::<Start>::new("Start")
//!     .field("Url", |cmd: &mut Start, value: String| cmd.url = value)
//!     .field("ThreadsCount", |cmd: &mut Start, value: u32| cmd.threads = value);
//!
//! assert_eq!(
//!     descriptor.shape("ThreadsCount"),
//!     Some(FieldShape::Scalar(ScalarType::Unsigned))
//! );
//! assert!(descriptor.shape("Threads").is_none());
//! ```

use std::fmt;

use thiserror::Error;

/// Scalar value types a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// `true` / `false`, compared case-insensitively.
    Bool,
    /// Signed integer.
    Integer,
    /// Unsigned integer.
    Unsigned,
    /// Floating point number in invariant (`.` decimal) format.
    Float,
    /// A single character.
    Char,
    /// Text, taken verbatim.
    Text,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Unsigned => "unsigned integer",
            Self::Float => "float",
            Self::Char => "char",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// Shape of a field as seen by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single scalar value.
    Scalar(ScalarType),
    /// A nested record filled from one parameter occurrence.
    Composite,
    /// A list of scalars, one element appended per occurrence.
    ScalarList(ScalarType),
    /// A list of nested records, one element appended per occurrence.
    CompositeList,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{ty}"),
            Self::Composite => f.write_str("composite"),
            Self::ScalarList(ty) => write!(f, "list of {ty}"),
            Self::CompositeList => f.write_str("list of composite"),
        }
    }
}

/// Errors raised while writing captured text into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The captured text could not be converted to the field's type.
    #[error("cannot convert '{value}' to {expected} for field {field}")]
    Conversion {
        field: String,
        value: String,
        expected: ScalarType,
    },
    /// The record type has no field of the required shape under this name.
    #[error("{type_name} has no bindable field {field}")]
    UnknownField { type_name: String, field: String },
}

impl BindError {
    /// Returns `true` for value format problems (as opposed to registration
    /// defects that slipped past validation).
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }
}

/// A Rust type that can be parsed from one captured token.
pub trait FieldValue: Sized {
    /// Scalar type reported to the validator.
    const SCALAR_TYPE: ScalarType;

    /// Parses the captured text, returning `None` when it is malformed.
    fn parse_value(raw: &str) -> Option<Self>;
}

macro_rules! parsed_field_value {
    ($scalar:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl FieldValue for $ty {
                const SCALAR_TYPE: ScalarType = $scalar;

                fn parse_value(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )+
    };
}

parsed_field_value!(ScalarType::Integer => i8, i16, i32, i64, i128, isize);
parsed_field_value!(ScalarType::Unsigned => u8, u16, u32, u64, u128, usize);
parsed_field_value!(ScalarType::Float => f32, f64);

impl FieldValue for bool {
    const SCALAR_TYPE: ScalarType = ScalarType::Bool;

    fn parse_value(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl FieldValue for char {
    const SCALAR_TYPE: ScalarType = ScalarType::Char;

    fn parse_value(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let ch = chars.next()?;
        chars.next().is_none().then_some(ch)
    }
}

impl FieldValue for String {
    const SCALAR_TYPE: ScalarType = ScalarType::Text;

    fn parse_value(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

/// Read-only view of a descriptor, independent of the record type.
///
/// The validator walks registered commands through this trait so it never
/// needs to know the concrete record types.
pub trait FieldLookup {
    /// Name used in error messages.
    fn type_name(&self) -> &str;

    /// Shape of the named field, if it exists.
    fn shape(&self, field: &str) -> Option<FieldShape>;

    /// Descriptor of a composite (or composite list) field's element type.
    fn nested(&self, field: &str) -> Option<&dyn FieldLookup>;
}

type ScalarSetter<T> = Box<dyn Fn(&mut T, &str) -> bool>;

/// Type-erased access to a nested record field.
trait NestedAccess<T> {
    fn lookup(&self) -> &dyn FieldLookup;

    /// Writes all captures of one parameter occurrence onto the same nested
    /// record (the composite itself, or one fresh list element).
    fn assign(&self, target: &mut T, values: &[(&str, String)]) -> Result<(), BindError>;
}

struct CompositeField<T, C> {
    descriptor: TargetDescriptor<C>,
    access: Box<dyn Fn(&mut T) -> &mut C>,
}

impl<T, C> NestedAccess<T> for CompositeField<T, C> {
    fn lookup(&self) -> &dyn FieldLookup {
        &self.descriptor
    }

    fn assign(&self, target: &mut T, values: &[(&str, String)]) -> Result<(), BindError> {
        let inner = (self.access)(target);
        for (field, value) in values {
            self.descriptor.set_scalar(inner, field, value)?;
        }
        Ok(())
    }
}

struct CompositeListField<T, C> {
    descriptor: TargetDescriptor<C>,
    push: Box<dyn Fn(&mut T, C)>,
}

impl<T, C: Default> NestedAccess<T> for CompositeListField<T, C> {
    fn lookup(&self) -> &dyn FieldLookup {
        &self.descriptor
    }

    fn assign(&self, target: &mut T, values: &[(&str, String)]) -> Result<(), BindError> {
        let mut element = C::default();
        for (field, value) in values {
            self.descriptor.set_scalar(&mut element, field, value)?;
        }
        (self.push)(target, element);
        Ok(())
    }
}

enum FieldAccess<T> {
    Scalar(ScalarType, ScalarSetter<T>),
    ScalarList(ScalarType, ScalarSetter<T>),
    Composite(Box<dyn NestedAccess<T>>),
    CompositeList(Box<dyn NestedAccess<T>>),
}

struct Field<T> {
    name: String,
    access: FieldAccess<T>,
}

/// Field map of a record type `T`, built once at registration time.
///
/// Fields are added with the builder methods [`field`](Self::field),
/// [`list`](Self::list), [`composite`](Self::composite) and
/// [`composite_list`](Self::composite_list). Registering the same name twice
/// replaces the earlier entry.
pub struct TargetDescriptor<T> {
    type_name: String,
    fields: Vec<Field<T>>,
}

impl<T> fmt::Debug for TargetDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDescriptor")
            .field("type_name", &self.type_name)
            .field(
                "fields",
                &self.field_names().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: 'static> TargetDescriptor<T> {
    /// Creates an empty descriptor. Records without fields (e.g. `exit`)
    /// can use `TargetDescriptor::<()>::new("Empty")` directly.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a scalar field.
    pub fn field<V, F>(self, name: &str, set: F) -> Self
    where
        V: FieldValue + 'static,
        F: Fn(&mut T, V) + 'static,
    {
        let setter: ScalarSetter<T> = Box::new(move |target, raw| match V::parse_value(raw) {
            Some(value) => {
                set(target, value);
                true
            }
            None => false,
        });
        self.with_field(name, FieldAccess::Scalar(V::SCALAR_TYPE, setter))
    }

    /// Adds a list-of-scalar field; `push` receives one value per occurrence.
    pub fn list<V, F>(self, name: &str, push: F) -> Self
    where
        V: FieldValue + 'static,
        F: Fn(&mut T, V) + 'static,
    {
        let setter: ScalarSetter<T> = Box::new(move |target, raw| match V::parse_value(raw) {
            Some(value) => {
                push(target, value);
                true
            }
            None => false,
        });
        self.with_field(name, FieldAccess::ScalarList(V::SCALAR_TYPE, setter))
    }

    /// Adds a nested record field.
    ///
    /// `access` must return the nested record, creating it on first use
    /// (for an `Option<C>` field: `|t| t.inner.get_or_insert_with(Default::default)`).
    pub fn composite<C, F>(self, name: &str, descriptor: TargetDescriptor<C>, access: F) -> Self
    where
        C: 'static,
        F: Fn(&mut T) -> &mut C + 'static,
    {
        let nested = CompositeField {
            descriptor,
            access: Box::new(access),
        };
        self.with_field(name, FieldAccess::Composite(Box::new(nested)))
    }

    /// Adds a list-of-record field; `push` receives one fully populated
    /// element per parameter occurrence.
    pub fn composite_list<C, F>(self, name: &str, descriptor: TargetDescriptor<C>, push: F) -> Self
    where
        C: Default + 'static,
        F: Fn(&mut T, C) + 'static,
    {
        let nested = CompositeListField {
            descriptor,
            push: Box::new(push),
        };
        self.with_field(name, FieldAccess::CompositeList(Box::new(nested)))
    }

    fn with_field(mut self, name: &str, access: FieldAccess<T>) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(Field {
            name: name.to_string(),
            access,
        });
        self
    }
}

impl<T> TargetDescriptor<T> {
    /// Names of all registered fields, in registration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    fn find(&self, name: &str) -> Option<&FieldAccess<T>> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.access)
    }

    fn unknown_field(&self, field: &str) -> BindError {
        BindError::UnknownField {
            type_name: self.type_name.clone(),
            field: field.to_string(),
        }
    }

    /// Converts `raw` and writes it into the scalar field `field`.
    pub fn set_scalar(&self, target: &mut T, field: &str, raw: &str) -> Result<(), BindError> {
        match self.find(field) {
            Some(FieldAccess::Scalar(ty, set)) => convert(set, target, field, raw, *ty),
            _ => Err(self.unknown_field(field)),
        }
    }

    /// Converts `raw` and appends it to the scalar list field `field`.
    pub fn push_scalar(&self, target: &mut T, field: &str, raw: &str) -> Result<(), BindError> {
        match self.find(field) {
            Some(FieldAccess::ScalarList(ty, push)) => convert(push, target, field, raw, *ty),
            _ => Err(self.unknown_field(field)),
        }
    }

    /// Sets a boolean field to `true`.
    pub fn set_flag(&self, target: &mut T, field: &str) -> Result<(), BindError> {
        match self.find(field) {
            Some(FieldAccess::Scalar(ScalarType::Bool, set)) => {
                convert(set, target, field, "true", ScalarType::Bool)
            }
            _ => Err(self.unknown_field(field)),
        }
    }

    /// Writes one occurrence's captures onto the composite (or a new element
    /// of the composite list) named `field`.
    pub fn assign_nested(
        &self,
        target: &mut T,
        field: &str,
        values: &[(&str, String)],
    ) -> Result<(), BindError> {
        match self.find(field) {
            Some(FieldAccess::Composite(nested) | FieldAccess::CompositeList(nested)) => {
                nested.assign(target, values)
            }
            _ => Err(self.unknown_field(field)),
        }
    }
}

fn convert<T>(
    setter: &ScalarSetter<T>,
    target: &mut T,
    field: &str,
    raw: &str,
    expected: ScalarType,
) -> Result<(), BindError> {
    if setter(target, raw) {
        Ok(())
    } else {
        Err(BindError::Conversion {
            field: field.to_string(),
            value: raw.to_string(),
            expected,
        })
    }
}

impl<T> FieldLookup for TargetDescriptor<T> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn shape(&self, field: &str) -> Option<FieldShape> {
        self.find(field).map(|access| match access {
            FieldAccess::Scalar(ty, _) => FieldShape::Scalar(*ty),
            FieldAccess::ScalarList(ty, _) => FieldShape::ScalarList(*ty),
            FieldAccess::Composite(_) => FieldShape::Composite,
            FieldAccess::CompositeList(_) => FieldShape::CompositeList,
        })
    }

    fn nested(&self, field: &str) -> Option<&dyn FieldLookup> {
        match self.find(field)? {
            FieldAccess::Composite(nested) | FieldAccess::CompositeList(nested) => {
                Some(nested.lookup())
            }
            _ => None,
        }
    }
}
