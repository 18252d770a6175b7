//! # fjson
//!
//! A high-throughput JSON serialization engine: in-memory values to and
//! from UTF-8 JSON byte streams without per-call heap churn. The engine is
//! built from a span-based byte writer, a cursor pull parser, manual
//! numeric and ISO-8601 codecs, perfect-hash tables for enum and
//! property-name matching, a composable type→codec resolver with
//! process-wide caching, and a pooled growth discipline shared by every
//! variable-length deserializer.
//!
//! Statically typed call sites go through [`JsonFormat`] and
//! monomorphize away all dispatch; runtime-typed call sites go through the
//! [`resolve::Resolver`] and the type-erased [`Formatter`] contract.
//!
//! ```
//! use fjson_rs::{from_slice, to_vec};
//!
//! let bytes = to_vec(&vec![1i32, 2, 3])?;
//! assert_eq!(bytes, b"[1,2,3]");
//! let back: Vec<i32> = from_slice(&bytes)?;
//! assert_eq!(back, [1, 2, 3]);
//! # Ok::<(), fjson_rs::Error>(())
//! ```
//!
//! There is no timeout primitive; the nesting depth guard is the only
//! mechanism that bounds work on adversarial input.

#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod datetime;
pub mod error;
pub mod fmt;
pub mod number;
pub mod options;
pub mod pool;
pub mod reader;
pub mod resolve;
pub mod table;
pub mod writer;

use std::any::{Any, TypeId};

// re-exported so downstream flags types can pair with `json_bitflags!`
// without declaring the dependency themselves
pub use bitflags;

pub use error::{Error, Result};
pub use fmt::{Formatter, JsonFormat, TypedFormatter};
pub use options::{DEFAULT_MAX_DEPTH, EnumRepr, JsonOptions};
pub use reader::{JsonReader, Token};
pub use resolve::{FormatterResolver, Resolver, ResolverBuilder, global_resolver};
pub use writer::{ByteWriter, JsonWriter};

/// Serialize a value to a fresh byte vector with default options
pub fn to_vec<T: JsonFormat>(value: &T) -> Result<Vec<u8>> {
    to_vec_with(value, JsonOptions::default())
}

/// Serialize a value to a fresh byte vector
pub fn to_vec_with<T: JsonFormat>(value: &T, options: JsonOptions) -> Result<Vec<u8>> {
    let mut out = ByteWriter::new();
    to_writer_buf(value, &mut out, options)?;
    Ok(out.into_vec())
}

/// Serialize a value into frozen bytes for zero-copy handoff
pub fn to_bytes<T: JsonFormat>(value: &T) -> Result<bytes::Bytes> {
    let mut out = ByteWriter::new();
    to_writer_buf(value, &mut out, JsonOptions::default())?;
    Ok(out.into_bytes())
}

/// Serialize a value into a caller-supplied output buffer
pub fn to_writer_buf<T: JsonFormat>(
    value: &T,
    out: &mut ByteWriter,
    options: JsonOptions,
) -> Result<()> {
    let mut writer = JsonWriter::new(out, options);
    value.serialize(&mut writer)
}

/// Deserialize a value from a byte buffer with default options
pub fn from_slice<T: JsonFormat>(input: &[u8]) -> Result<T> {
    from_slice_with(input, JsonOptions::default())
}

/// Deserialize a value from a byte buffer, rejecting trailing characters
pub fn from_slice_with<T: JsonFormat>(input: &[u8], options: JsonOptions) -> Result<T> {
    let mut reader = JsonReader::with_options(input, options);
    let value = T::deserialize(&mut reader)?;
    reader.expect_end()?;
    Ok(value)
}

/// Serialize a runtime-typed value through the global resolver with
/// default options
pub fn to_vec_typeless(value: &dyn Any) -> Result<Vec<u8>> {
    to_vec_typeless_with(value, JsonOptions::default())
}

/// Serialize a runtime-typed value through the global resolver.
///
/// Resolution happens before any output is produced, so an unsupported
/// type never leaves a partially written buffer behind.
pub fn to_vec_typeless_with(value: &dyn Any, options: JsonOptions) -> Result<Vec<u8>> {
    let formatter = global_resolver().formatter(value.type_id(), "runtime value")?;
    let mut out = ByteWriter::new();
    let mut writer = JsonWriter::new(&mut out, options);
    formatter.serialize_typeless(&mut writer, value)?;
    Ok(out.into_vec())
}

/// Deserialize a runtime-typed value through the global resolver with
/// default options
pub fn from_slice_typeless(input: &[u8], type_id: TypeId) -> Result<Box<dyn Any>> {
    from_slice_typeless_with(input, type_id, JsonOptions::default())
}

/// Deserialize a runtime-typed value through the global resolver
pub fn from_slice_typeless_with(
    input: &[u8],
    type_id: TypeId,
    options: JsonOptions,
) -> Result<Box<dyn Any>> {
    let formatter = global_resolver().formatter(type_id, "runtime value")?;
    let mut reader = JsonReader::with_options(input, options);
    let value = formatter.deserialize_typeless(&mut reader)?;
    reader.expect_end()?;
    Ok(value)
}

/// Re-export of commonly used types
pub mod prelude {
    pub use super::{
        ByteWriter, EnumRepr, Error, Formatter, JsonFormat, JsonOptions, JsonReader, JsonWriter,
        Resolver, ResolverBuilder, Result, from_slice, from_slice_with, global_resolver, to_bytes,
        to_vec, to_vec_with,
    };
}
