//! Discriminant registry for tagged values.
//!
//! A [`Shape::Tagged`] names a *family*; the registry maps each
//! `(family, discriminant)` pair to a [`Variant`] carrying the shape of the
//! body that follows the discriminant byte. The registry is an ordinary value:
//! build it once at startup and pass it to the session or to
//! [`decode`](super::decode) directly.
//!
//! # Example
//!
//! ```
//! use jdwp_client::codec::{decode, Shape, TagRegistry, Value};
//!
//! let mut registry = TagRegistry::new();
//! registry.register("value", b'I', "int", Shape::I32);
//! registry.register("value", b'Z', "boolean", Shape::Bool);
//!
//! let value = decode(&[b'I', 0, 0, 0, 9], &Shape::tagged("value"), &registry).unwrap();
//! let tagged = value.as_tagged().unwrap();
//! assert_eq!(tagged.variant, "int");
//! assert_eq!(tagged.value, Value::I32(9));
//! ```

use std::collections::HashMap;

use super::{CodecError, Shape};

/// Registered body for one discriminant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Human-readable name, copied into decoded [`Tagged`](super::Tagged) values.
    pub name: String,
    /// Shape of the body following the discriminant.
    pub shape: Shape,
}

/// Registry of tagged-value families.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    families: HashMap<String, HashMap<u8, Variant>>,
}

impl TagRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant, returning the one it replaced.
    pub fn register(
        &mut self,
        family: &str,
        tag: u8,
        name: impl Into<String>,
        shape: Shape,
    ) -> Option<Variant> {
        let previous = self.families.entry(family.to_string()).or_default().insert(
            tag,
            Variant {
                name: name.into(),
                shape,
            },
        );
        if previous.is_some() {
            tracing::debug!("Replaced variant {:#04x} in family '{}'", tag, family);
        }
        previous
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, family: &str, tag: u8, name: impl Into<String>, shape: Shape) -> Self {
        self.register(family, tag, name, shape);
        self
    }

    /// Variant registered for a discriminant.
    #[inline]
    pub fn variant(&self, family: &str, tag: u8) -> Option<&Variant> {
        self.families.get(family).and_then(|f| f.get(&tag))
    }

    /// Like [`variant`](Self::variant) but reports unknown discriminants as errors.
    pub fn resolve(&self, family: &str, tag: u8) -> Result<&Variant, CodecError> {
        self.variant(family, tag)
            .ok_or_else(|| CodecError::UnknownDiscriminant {
                family: family.to_string(),
                tag,
            })
    }

    /// Discriminant registered under `name` in `family`.
    pub fn tag_of(&self, family: &str, name: &str) -> Option<u8> {
        self.families
            .get(family)?
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(tag, _)| *tag)
    }

    /// Whether any variant is registered for `family`.
    #[inline]
    pub fn has_family(&self, family: &str) -> bool {
        self.families.contains_key(family)
    }

    /// Copy every variant of `other` into this registry.
    pub fn extend(&mut self, other: TagRegistry) {
        for (family, variants) in other.families {
            let target = self.families.entry(family).or_default();
            target.extend(variants);
        }
    }

    /// Total number of registered variants across all families.
    pub fn len(&self) -> usize {
        self.families.values().map(HashMap::len).sum()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
