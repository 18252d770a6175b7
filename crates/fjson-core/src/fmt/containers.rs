//! Container codecs sharing one algorithm shape
//!
//! Serialize: open delimiter; if empty, close; else element 0, then
//! separator+element for the rest; close. Deserialize: expect the open
//! delimiter, then loop the separator-enforcing terminator check, appending
//! one decoded element per iteration into a pooled working buffer.
//! Both directions run under the depth guard and degrade to an empty
//! container at the limit.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::fmt::JsonFormat;
use crate::pool::{self, INITIAL_ELEMENTS};
use crate::reader::JsonReader;
use crate::writer::JsonWriter;

/// Serialize any slice with the shared container shape
pub fn serialize_slice<T: JsonFormat>(writer: &mut JsonWriter<'_>, items: &[T]) -> Result<()> {
    if !writer.enter() {
        writer.write_raw(b"[]");
        return Ok(());
    }
    writer.begin_array();
    let result = (|| {
        if let Some((first, rest)) = items.split_first() {
            first.serialize(writer)?;
            for item in rest {
                writer.value_separator();
                item.serialize(writer)?;
            }
        }
        Ok(())
    })();
    writer.end_array();
    writer.exit();
    result
}

/// Deserialize an array into a pooled working buffer, then copy exactly the
/// decoded elements out
pub fn deserialize_vec<T>(reader: &mut JsonReader<'_>) -> Result<Vec<T>>
where
    T: JsonFormat + Send + 'static,
{
    if !reader.enter() {
        reader.read_next_block()?;
        return Ok(Vec::new());
    }
    let result = (|| {
        reader.expect_begin_array()?;
        let mut working = pool::element_pool::<T>().rent(INITIAL_ELEMENTS);
        let mut count = 0usize;
        while !reader.read_is_end_array(&mut count)? {
            working.push(T::deserialize(reader)?);
        }
        Ok(working.into_exact())
    })();
    reader.exit();
    result
}

impl<T: JsonFormat + Send + 'static> JsonFormat for Vec<T> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        serialize_slice(writer, self)
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        deserialize_vec(reader)
    }
}

impl<T: JsonFormat + Send + 'static, const N: usize> JsonFormat for [T; N] {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        serialize_slice(writer, self)
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let position = reader.position();
        let items = deserialize_vec(reader)?;
        let found = items.len();
        Self::try_from(items).map_err(|_| {
            Error::structural(position, format!("expected {N} elements, found {found}"))
        })
    }
}

impl<T: JsonFormat> JsonFormat for Option<T> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        match self {
            Some(value) => value.serialize(writer),
            None => {
                writer.write_null();
                Ok(())
            }
        }
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        if reader.read_is_null()? {
            return Ok(None);
        }
        Ok(Some(T::deserialize(reader)?))
    }
}

impl<T: JsonFormat> JsonFormat for Box<T> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        self.as_ref().serialize(writer)
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        Ok(Box::new(T::deserialize(reader)?))
    }
}

fn serialize_entries<'e, V: JsonFormat + 'e>(
    writer: &mut JsonWriter<'_>,
    entries: impl Iterator<Item = (&'e String, &'e V)>,
) -> Result<()> {
    if !writer.enter() {
        writer.write_raw(b"{}");
        return Ok(());
    }
    writer.begin_object();
    let result = (|| {
        let mut first = true;
        for (key, value) in entries {
            if first {
                first = false;
            } else {
                writer.value_separator();
            }
            writer.write_property_name(key);
            value.serialize(writer)?;
        }
        Ok(())
    })();
    writer.end_object();
    writer.exit();
    result
}

impl<V: JsonFormat> JsonFormat for HashMap<String, V> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        serialize_entries(writer, self.iter())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        if !reader.enter() {
            reader.read_next_block()?;
            return Ok(Self::new());
        }
        let result = (|| {
            reader.expect_begin_object()?;
            let mut map = Self::new();
            let mut count = 0usize;
            while !reader.read_is_end_object(&mut count)? {
                let key = reader.read_property_name()?.into_owned();
                map.insert(key, V::deserialize(reader)?);
            }
            Ok(map)
        })();
        reader.exit();
        result
    }
}

impl<V: JsonFormat> JsonFormat for BTreeMap<String, V> {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        serialize_entries(writer, self.iter())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        if !reader.enter() {
            reader.read_next_block()?;
            return Ok(Self::new());
        }
        let result = (|| {
            reader.expect_begin_object()?;
            let mut map = Self::new();
            let mut count = 0usize;
            while !reader.read_is_end_object(&mut count)? {
                let key = reader.read_property_name()?.into_owned();
                map.insert(key, V::deserialize(reader)?);
            }
            Ok(map)
        })();
        reader.exit();
        result
    }
}

impl<A: JsonFormat, B: JsonFormat> JsonFormat for (A, B) {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        if !writer.enter() {
            writer.write_raw(b"[]");
            return Ok(());
        }
        writer.begin_array();
        let result = (|| {
            self.0.serialize(writer)?;
            writer.value_separator();
            self.1.serialize(writer)
        })();
        writer.end_array();
        writer.exit();
        result
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        if !reader.enter() {
            let position = reader.position();
            reader.read_next_block()?;
            return Err(Error::structural(position, "tuple nested beyond depth limit"));
        }
        let result = (|| {
            let position = reader.position();
            reader.expect_begin_array()?;
            let mut count = 0usize;
            if reader.read_is_end_array(&mut count)? {
                return Err(Error::structural(position, "expected 2 elements, found 0"));
            }
            let a = A::deserialize(reader)?;
            if reader.read_is_end_array(&mut count)? {
                return Err(Error::structural(position, "expected 2 elements, found 1"));
            }
            let b = B::deserialize(reader)?;
            if !reader.read_is_end_array(&mut count)? {
                return Err(Error::structural(position, "expected exactly 2 elements"));
            }
            Ok((a, b))
        })();
        reader.exit();
        result
    }
}

impl<A: JsonFormat, B: JsonFormat, C: JsonFormat> JsonFormat for (A, B, C) {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        if !writer.enter() {
            writer.write_raw(b"[]");
            return Ok(());
        }
        writer.begin_array();
        let result = (|| {
            self.0.serialize(writer)?;
            writer.value_separator();
            self.1.serialize(writer)?;
            writer.value_separator();
            self.2.serialize(writer)
        })();
        writer.end_array();
        writer.exit();
        result
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        if !reader.enter() {
            let position = reader.position();
            reader.read_next_block()?;
            return Err(Error::structural(position, "tuple nested beyond depth limit"));
        }
        let result = (|| {
            let position = reader.position();
            reader.expect_begin_array()?;
            let mut count = 0usize;
            let mut next = |reader: &mut JsonReader<'_>, count: &mut usize| -> Result<()> {
                if reader.read_is_end_array(count)? {
                    return Err(Error::structural(position, "expected 3 elements"));
                }
                Ok(())
            };
            next(reader, &mut count)?;
            let a = A::deserialize(reader)?;
            next(reader, &mut count)?;
            let b = B::deserialize(reader)?;
            next(reader, &mut count)?;
            let c = C::deserialize(reader)?;
            if !reader.read_is_end_array(&mut count)? {
                return Err(Error::structural(position, "expected exactly 3 elements"));
            }
            Ok((a, b, c))
        })();
        reader.exit();
        result
    }
}
