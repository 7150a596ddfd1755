//! Declarative description of binary payloads.
//!
//! A [`Shape`] is plain data: it can be built once, cloned, printed and
//! inspected. The [`Decoder`](super::Decoder) and [`Seq`](super::Seq) walk it
//! generically, so adding a message type never means writing a parser.
//!
//! # Example
//!
//! ```
//! use jdwp_client::codec::{field, Shape};
//!
//! // {count: i32, items: count x {tag: u8, id: u64, status: i32}}
//! let classes = Shape::record([
//!     field("count", Shape::I32),
//!     field(
//!         "items",
//!         Shape::sequence(
//!             "count",
//!             Shape::record([
//!                 field("tag", Shape::U8),
//!                 field("id", Shape::U64),
//!                 field("status", Shape::I32),
//!             ]),
//!         ),
//!     ),
//! ]);
//! assert_eq!(classes.name(), "record");
//! ```

use std::fmt;

/// Wire shape of a value.
///
/// Scalars are fixed-width big-endian. Strings are a u32 length prefix
/// followed by that many bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Unsigned byte.
    U8,
    /// One byte, non-zero is true.
    Bool,
    /// Unsigned 16-bit.
    U16,
    /// Signed 16-bit.
    I16,
    /// Unsigned 32-bit.
    U32,
    /// Signed 32-bit.
    I32,
    /// Unsigned 64-bit.
    U64,
    /// Signed 64-bit.
    I64,
    /// IEEE 754 single.
    F32,
    /// IEEE 754 double.
    F64,
    /// u32 byte length followed by UTF-8 bytes.
    String,
    /// Fields in declared order.
    Record(Vec<Field>),
    /// Repeated element whose count is an earlier sibling field.
    Sequence {
        /// Name of the sibling field holding the count.
        counter: String,
        /// Shape of each element.
        element: Box<Shape>,
    },
    /// Discriminant byte followed by a variant looked up in the registry.
    Tagged(String),
}

impl Shape {
    /// Build a record shape.
    pub fn record(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Record(fields.into_iter().collect())
    }

    /// Build a counted sequence shape.
    pub fn sequence(counter: impl Into<String>, element: Shape) -> Self {
        Shape::Sequence {
            counter: counter.into(),
            element: Box::new(element),
        }
    }

    /// Build a tagged shape resolved through `family`.
    pub fn tagged(family: impl Into<String>) -> Self {
        Shape::Tagged(family.into())
    }

    /// Record with no fields, for variants that carry no payload.
    pub fn unit() -> Self {
        Shape::Record(Vec::new())
    }

    /// Encoded size for fixed-width scalars.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Shape::U8 | Shape::Bool => Some(1),
            Shape::U16 | Shape::I16 => Some(2),
            Shape::U32 | Shape::I32 | Shape::F32 => Some(4),
            Shape::U64 | Shape::I64 | Shape::F64 => Some(8),
            Shape::Record(fields) => fields
                .iter()
                .map(|f| f.shape.fixed_width())
                .sum::<Option<usize>>(),
            Shape::String | Shape::Sequence { .. } | Shape::Tagged(_) => None,
        }
    }

    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::U8 => "u8",
            Shape::Bool => "bool",
            Shape::U16 => "u16",
            Shape::I16 => "i16",
            Shape::U32 => "u32",
            Shape::I32 => "i32",
            Shape::U64 => "u64",
            Shape::I64 => "i64",
            Shape::F32 => "f32",
            Shape::F64 => "f64",
            Shape::String => "string",
            Shape::Record(_) => "record",
            Shape::Sequence { .. } => "sequence",
            Shape::Tagged(_) => "tagged",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Record(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.shape)?;
                }
                f.write_str("}")
            }
            Shape::Sequence { counter, element } => write!(f, "{} x {}", counter, element),
            Shape::Tagged(family) => write!(f, "<{}>", family),
            other => f.write_str(other.name()),
        }
    }
}

/// Named member of a record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name, also the key in the decoded record.
    pub name: String,
    /// Wire shape.
    pub shape: Shape,
}

/// Shorthand for [`Field`] construction.
pub fn field(name: impl Into<String>, shape: Shape) -> Field {
    Field {
        name: name.into(),
        shape,
    }
}
