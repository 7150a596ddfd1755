//! Codec module - schema-driven payload encoding and decoding.
//!
//! Payloads are described declaratively with [`Shape`] and walked by one
//! generic implementation in each direction:
//!
//! - [`Decoder`] / [`decode`] - bytes to [`Value`], consuming every byte
//! - [`Seq`] / [`encode`] - fluent builder and schema-driven encoder
//! - [`TagRegistry`] - discriminant table for [`Shape::Tagged`] families
//!
//! # Example
//!
//! ```
//! use jdwp_client::codec::{decode, encode, field, Record, Shape, TagRegistry, Value};
//!
//! let shape = Shape::record([field("id", Shape::U64), field("name", Shape::String)]);
//! let registry = TagRegistry::new();
//!
//! let value = Value::Record(Record::new().with("id", 7u64).with("name", "main"));
//! let bytes = encode(&value, &shape, &registry).unwrap();
//! assert_eq!(decode(&bytes, &shape, &registry).unwrap(), value);
//! ```

mod decoder;
mod encoder;
mod error;
mod registry;
mod schema;
mod value;

pub use decoder::{decode, Decoder};
pub use encoder::{encode, Seq, Writable};
pub use error::CodecError;
pub use registry::{TagRegistry, Variant};
pub use schema::{field, Field, Shape};
pub use value::{Record, Tagged, Value};
