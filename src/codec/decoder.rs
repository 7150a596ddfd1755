//! Generic structural decoder.
//!
//! [`Decoder`] walks a [`Shape`] over a byte slice. Every read is bounds
//! checked; running out of input yields [`CodecError::Truncated`] rather than
//! a panic. Sequence counts come from fields already decoded in the same
//! record, so the only state the walker carries is the record under
//! construction.

use super::{CodecError, Field, Record, Shape, TagRegistry, Tagged, Value};

/// Cursor over a payload, resolving tagged values through a registry.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    registry: &'a TagRegistry,
}

impl<'a> Decoder<'a> {
    /// Decoder positioned at the start of `buf`.
    pub fn new(buf: &'a [u8], registry: &'a TagRegistry) -> Self {
        Self {
            buf,
            pos: 0,
            registry,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let have = self.remaining();
        if n > have {
            return Err(CodecError::Truncated { needed: n, have });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        self.take_array().map(u16::from_be_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        self.take_array().map(i16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.take_array().map(u32::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.take_array().map(i32::from_be_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        self.take_array().map(u64::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        self.take_array().map(i64::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        self.take_array().map(f32::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        self.take_array().map(f64::from_be_bytes)
    }

    /// u32 length prefix, then that many bytes decoded as lossy UTF-8.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Decode one value of the given shape.
    ///
    /// A bare [`Shape::Sequence`] has no sibling to take its count from and is
    /// rejected with [`CodecError::UnsupportedShape`].
    pub fn read(&mut self, shape: &Shape) -> Result<Value, CodecError> {
        let value = match shape {
            Shape::U8 => Value::U8(self.read_u8()?),
            Shape::Bool => Value::Bool(self.read_u8()? != 0),
            Shape::U16 => Value::U16(self.read_u16()?),
            Shape::I16 => Value::I16(self.read_i16()?),
            Shape::U32 => Value::U32(self.read_u32()?),
            Shape::I32 => Value::I32(self.read_i32()?),
            Shape::U64 => Value::U64(self.read_u64()?),
            Shape::I64 => Value::I64(self.read_i64()?),
            Shape::F32 => Value::F32(self.read_f32()?),
            Shape::F64 => Value::F64(self.read_f64()?),
            Shape::String => Value::String(self.read_string()?),
            Shape::Record(fields) => Value::Record(self.read_record(fields)?),
            Shape::Tagged(family) => self.read_tagged(family)?,
            Shape::Sequence { counter, .. } => {
                return Err(CodecError::UnsupportedShape(format!(
                    "sequence counted by '{}' outside a record",
                    counter
                )))
            }
        };
        Ok(value)
    }

    fn read_record(&mut self, fields: &[Field]) -> Result<Record, CodecError> {
        let mut record = Record::with_capacity(fields.len());
        for field in fields {
            let value = match &field.shape {
                Shape::Sequence { counter, element } => {
                    let count = sequence_count(&record, counter)?;
                    self.read_sequence(count, element)?
                }
                shape => self.read(shape)?,
            };
            record.push(field.name.clone(), value);
        }
        Ok(record)
    }

    fn read_sequence(&mut self, count: usize, element: &Shape) -> Result<Value, CodecError> {
        // Capacity never exceeds what the remaining input can hold.
        let min_width = element.fixed_width().unwrap_or(1).max(1);
        let mut items = Vec::with_capacity(count.min(self.remaining() / min_width));
        for _ in 0..count {
            items.push(self.read(element)?);
        }
        Ok(Value::Sequence(items))
    }

    fn read_tagged(&mut self, family: &str) -> Result<Value, CodecError> {
        let tag = self.read_u8()?;
        let variant = self.registry.resolve(family, tag)?;
        let value = self.read(&variant.shape)?;
        Ok(Value::from(Tagged {
            tag,
            variant: variant.name.clone(),
            value,
        }))
    }

    /// Fail with [`CodecError::TrailingBytes`] if any input is left.
    pub fn finish(self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

/// Count for a sequence, read from an earlier sibling of the record being built.
pub(super) fn sequence_count(record: &Record, counter: &str) -> Result<usize, CodecError> {
    record
        .get(counter)
        .ok_or_else(|| CodecError::CounterNotFound(counter.to_string()))?
        .as_count()
        .ok_or_else(|| CodecError::InvalidCount(counter.to_string()))
}

/// Decode a complete payload. Every byte must be consumed.
pub fn decode(bytes: &[u8], shape: &Shape, registry: &TagRegistry) -> Result<Value, CodecError> {
    let mut decoder = Decoder::new(bytes, registry);
    let value = decoder.read(shape)?;
    decoder.finish()?;
    Ok(value)
}
