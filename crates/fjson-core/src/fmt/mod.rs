//! Per-type codec contract and dual dispatch
//!
//! `JsonFormat` is the monomorphic fast path: generic call sites bind it
//! statically and the compiler erases all indirection. `Formatter` is the
//! type-erased path for call sites where the concrete type is only known at
//! runtime; `TypedFormatter` bridges any `JsonFormat` implementation into
//! it. Using the erased path everywhere would still be correct, just
//! slower.

pub mod containers;
pub mod enums;
pub mod object;
pub mod primitives;

use std::any::Any;
use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::reader::JsonReader;
use crate::writer::JsonWriter;

/// Type-specific codec: the statically dispatched serialize/deserialize
/// pair every supported type implements
pub trait JsonFormat: Sized {
    /// Encode `self` onto the writer
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()>;

    /// Decode one value from the reader
    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self>;
}

/// Type-erased codec for runtime-typed call sites
pub trait Formatter: Send + Sync + 'static {
    /// Diagnostic name of the handled type
    fn type_name(&self) -> &'static str;

    /// Encode a value whose concrete type is only known at runtime
    fn serialize_typeless(&self, writer: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()>;

    /// Decode into a boxed value of the handled type
    fn deserialize_typeless(&self, reader: &mut JsonReader<'_>) -> Result<Box<dyn Any>>;
}

impl std::fmt::Debug for dyn Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Bridge from a statically known [`JsonFormat`] type into the erased
/// [`Formatter`] contract
pub struct TypedFormatter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedFormatter<T> {
    /// Create the bridge; it carries no state
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedFormatter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: JsonFormat + 'static> Formatter for TypedFormatter<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize_typeless(&self, writer: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            Error::mismatch(0, self.type_name(), "runtime value of a different type")
        })?;
        value.serialize(writer)
    }

    fn deserialize_typeless(&self, reader: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        Ok(Box::new(T::deserialize(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::JsonOptions;
    use crate::writer::ByteWriter;

    #[test]
    fn test_typed_formatter_bridges_both_directions() {
        let formatter = TypedFormatter::<i64>::new();
        assert!(formatter.type_name().contains("i64"));

        let mut out = ByteWriter::new();
        let mut writer = JsonWriter::new(&mut out, JsonOptions::default());
        let value: &dyn Any = &42i64;
        formatter.serialize_typeless(&mut writer, value).unwrap();
        assert_eq!(out.as_slice(), b"42");

        let mut reader = JsonReader::new(b"-7");
        let decoded = formatter.deserialize_typeless(&mut reader).unwrap();
        assert_eq!(decoded.downcast_ref::<i64>(), Some(&-7));
    }

    #[test]
    fn test_typed_formatter_rejects_foreign_value() {
        let formatter = TypedFormatter::<i64>::new();
        let mut out = ByteWriter::new();
        let mut writer = JsonWriter::new(&mut out, JsonOptions::default());
        let wrong: &dyn Any = &"text";
        let err = formatter.serialize_typeless(&mut writer, wrong).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(out.is_empty());
    }
}
