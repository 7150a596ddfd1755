//! Append-only payload builder.
//!
//! [`Seq`] collects big-endian fields in call order. The builder methods
//! never fail individually: the first error is remembered, later appends are
//! skipped, and [`Seq::marshal`] reports it once.
//!
//! # Example
//!
//! ```
//! use jdwp_client::codec::Seq;
//!
//! let mut seq = Seq::new();
//! seq.octet(2).octet(1).int(0);
//! let payload = seq.marshal().unwrap();
//! assert_eq!(&payload[..], &[2, 1, 0, 0, 0, 0]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::decoder::sequence_count;
use super::{CodecError, Field, Record, Shape, TagRegistry, Value};

/// A type that knows how to append itself to a [`Seq`].
pub trait Writable {
    fn write_to(&self, seq: &mut Seq);
}

/// Append-only builder for outbound payloads.
#[derive(Debug, Default)]
pub struct Seq {
    buf: BytesMut,
    error: Option<CodecError>,
}

impl Seq {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            error: None,
        }
    }

    /// Bytes appended so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Record a failure; only the first one is kept.
    pub fn fail(&mut self, error: CodecError) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    #[inline]
    fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// Single byte.
    pub fn octet(&mut self, v: u8) -> &mut Self {
        if self.ok() {
            self.buf.put_u8(v);
        }
        self
    }

    /// One byte, 1 for true.
    pub fn boolean(&mut self, v: bool) -> &mut Self {
        self.octet(v as u8)
    }

    /// Unsigned 16-bit integer.
    pub fn u16(&mut self, v: u16) -> &mut Self {
        if self.ok() {
            self.buf.put_u16(v);
        }
        self
    }

    /// Signed 16-bit integer.
    pub fn i16(&mut self, v: i16) -> &mut Self {
        if self.ok() {
            self.buf.put_i16(v);
        }
        self
    }

    /// Unsigned 32-bit integer.
    pub fn u32(&mut self, v: u32) -> &mut Self {
        if self.ok() {
            self.buf.put_u32(v);
        }
        self
    }

    /// Signed 32-bit integer.
    pub fn int(&mut self, v: i32) -> &mut Self {
        if self.ok() {
            self.buf.put_i32(v);
        }
        self
    }

    /// Unsigned 64-bit integer; also used for object and reference ids.
    pub fn u64(&mut self, v: u64) -> &mut Self {
        if self.ok() {
            self.buf.put_u64(v);
        }
        self
    }

    /// Element count as a signed 32-bit integer.
    ///
    /// Fails with [`CodecError::CountTooLarge`] if `n` exceeds `i32::MAX`.
    pub fn count(&mut self, n: usize) -> &mut Self {
        match i32::try_from(n) {
            Ok(n) => self.int(n),
            Err(_) => self.fail(CodecError::CountTooLarge(n)),
        }
    }

    /// Signed 64-bit integer.
    pub fn long(&mut self, v: i64) -> &mut Self {
        if self.ok() {
            self.buf.put_i64(v);
        }
        self
    }

    /// IEEE 754 single precision.
    pub fn f32(&mut self, v: f32) -> &mut Self {
        if self.ok() {
            self.buf.put_f32(v);
        }
        self
    }

    /// IEEE 754 double precision.
    pub fn f64(&mut self, v: f64) -> &mut Self {
        if self.ok() {
            self.buf.put_f64(v);
        }
        self
    }

    /// u32 byte length followed by the UTF-8 bytes.
    pub fn string(&mut self, s: &str) -> &mut Self {
        let len = match u32::try_from(s.len()) {
            Ok(len) => len,
            Err(_) => return self.fail(CodecError::StringTooLong(s.len())),
        };
        if self.ok() {
            self.buf.put_u32(len);
            self.buf.put_slice(s.as_bytes());
        }
        self
    }

    /// Raw bytes with no prefix.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        if self.ok() {
            self.buf.put_slice(bytes);
        }
        self
    }

    /// Append anything implementing [`Writable`].
    pub fn write<W: Writable + ?Sized>(&mut self, item: &W) -> &mut Self {
        if self.ok() {
            item.write_to(self);
        }
        self
    }

    /// Append a [`Value`] laid out by `shape`.
    pub fn value(&mut self, value: &Value, shape: &Shape, registry: &TagRegistry) -> &mut Self {
        if self.ok() {
            if let Err(e) = self.put_value(value, shape, registry) {
                self.fail(e);
            }
        }
        self
    }

    fn put_value(
        &mut self,
        value: &Value,
        shape: &Shape,
        registry: &TagRegistry,
    ) -> Result<(), CodecError> {
        match (shape, value) {
            (Shape::U8, Value::U8(v)) => self.buf.put_u8(*v),
            (Shape::Bool, Value::Bool(v)) => self.buf.put_u8(*v as u8),
            (Shape::U16, Value::U16(v)) => self.buf.put_u16(*v),
            (Shape::I16, Value::I16(v)) => self.buf.put_i16(*v),
            (Shape::U32, Value::U32(v)) => self.buf.put_u32(*v),
            (Shape::I32, Value::I32(v)) => self.buf.put_i32(*v),
            (Shape::U64, Value::U64(v)) => self.buf.put_u64(*v),
            (Shape::I64, Value::I64(v)) => self.buf.put_i64(*v),
            (Shape::F32, Value::F32(v)) => self.buf.put_f32(*v),
            (Shape::F64, Value::F64(v)) => self.buf.put_f64(*v),
            (Shape::String, Value::String(s)) => {
                let len = u32::try_from(s.len()).map_err(|_| CodecError::StringTooLong(s.len()))?;
                self.buf.put_u32(len);
                self.buf.put_slice(s.as_bytes());
            }
            (Shape::Record(fields), Value::Record(record)) => {
                self.put_record(fields, record, registry)?
            }
            (Shape::Tagged(family), Value::Tagged(tagged)) => {
                let variant = registry.resolve(family, tagged.tag)?;
                self.buf.put_u8(tagged.tag);
                self.put_value(&tagged.value, &variant.shape, registry)?;
            }
            (Shape::Sequence { counter, .. }, _) => {
                return Err(CodecError::UnsupportedShape(format!(
                    "sequence counted by '{}' outside a record",
                    counter
                )))
            }
            (shape, value) => {
                return Err(CodecError::ShapeMismatch {
                    expected: shape.to_string(),
                    found: value.kind_name().to_string(),
                })
            }
        }
        Ok(())
    }

    fn put_record(
        &mut self,
        fields: &[Field],
        record: &Record,
        registry: &TagRegistry,
    ) -> Result<(), CodecError> {
        for field in fields {
            let value = record
                .get(&field.name)
                .ok_or_else(|| CodecError::MissingField(field.name.clone()))?;

            match &field.shape {
                Shape::Sequence { counter, element } => {
                    let items = value.as_sequence().ok_or_else(|| CodecError::ShapeMismatch {
                        expected: field.shape.to_string(),
                        found: value.kind_name().to_string(),
                    })?;
                    let declared = sequence_count(record, counter)?;
                    if declared != items.len() {
                        return Err(CodecError::CountMismatch {
                            counter: counter.clone(),
                            declared,
                            actual: items.len(),
                        });
                    }
                    for item in items {
                        self.put_value(item, element, registry)?;
                    }
                }
                shape => self.put_value(value, shape, registry)?,
            }
        }
        Ok(())
    }

    /// Finish the payload, or report the first failure.
    pub fn marshal(&mut self) -> Result<Bytes, CodecError> {
        match self.error.take() {
            Some(e) => {
                self.buf.clear();
                Err(e)
            }
            None => Ok(self.buf.split().freeze()),
        }
    }
}

/// Encode a value laid out by `shape`; the inverse of [`decode`](super::decode).
pub fn encode(value: &Value, shape: &Shape, registry: &TagRegistry) -> Result<Bytes, CodecError> {
    let mut seq = Seq::new();
    seq.value(value, shape, registry);
    seq.marshal()
}
