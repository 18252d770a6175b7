//! Codecs for scalars and strings

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::fmt::JsonFormat;
use crate::reader::JsonReader;
use crate::writer::JsonWriter;

macro_rules! scalar_format {
    ($($ty:ty => $write:ident, $read:ident);* $(;)?) => {
        $(
            impl JsonFormat for $ty {
                fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
                    writer.$write(*self);
                    Ok(())
                }

                fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

scalar_format! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    u128 => write_u128, read_u128;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    i128 => write_i128, read_i128;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
    bool => write_bool, read_bool;
}

impl JsonFormat for usize {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        writer.write_u64(*self as u64);
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        let position = reader.position();
        usize::try_from(reader.read_u64()?)
            .map_err(|_| Error::structural(position, "number does not fit in usize"))
    }
}

impl JsonFormat for String {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        writer.write_string(self);
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        reader.read_string()
    }
}

impl JsonFormat for char {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        let mut utf8 = [0u8; 4];
        writer.write_string(self.encode_utf8(&mut utf8));
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        reader.read_char()
    }
}

impl JsonFormat for () {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        writer.write_null();
        Ok(())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        if reader.read_is_null()? {
            return Ok(());
        }
        let position = reader.position();
        Err(Error::mismatch(position, "null", "value"))
    }
}

// span-like byte buffers render as number arrays, same as Vec<u8>
impl JsonFormat for Bytes {
    fn serialize(&self, writer: &mut JsonWriter<'_>) -> Result<()> {
        super::containers::serialize_slice(writer, self.as_ref())
    }

    fn deserialize(reader: &mut JsonReader<'_>) -> Result<Self> {
        Ok(Bytes::from(Vec::<u8>::deserialize(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::JsonOptions;
    use crate::writer::ByteWriter;

    fn render<T: JsonFormat>(value: &T) -> String {
        let mut out = ByteWriter::new();
        let mut writer = JsonWriter::new(&mut out, JsonOptions::default());
        value.serialize(&mut writer).unwrap();
        String::from_utf8(out.into_vec()).unwrap()
    }

    fn parse<T: JsonFormat>(text: &str) -> T {
        let mut reader = JsonReader::new(text.as_bytes());
        let value = T::deserialize(&mut reader).unwrap();
        reader.expect_end().unwrap();
        value
    }

    #[test]
    fn test_integer_round_trips() {
        assert_eq!(render(&0u8), "0");
        assert_eq!(parse::<u8>("255"), 255);
        assert_eq!(render(&i64::MIN), i64::MIN.to_string());
        assert_eq!(parse::<i64>(&i64::MIN.to_string()), i64::MIN);
        assert_eq!(parse::<u128>(&u128::MAX.to_string()), u128::MAX);
    }

    #[test]
    fn test_string_round_trip() {
        let original = "line\none\t\"quoted\" é😀".to_string();
        let text = render(&original);
        assert_eq!(parse::<String>(&text), original);
    }

    #[test]
    fn test_char_round_trip() {
        assert_eq!(render(&'é'), "\"é\"");
        assert_eq!(parse::<char>("\"x\""), 'x');
    }

    #[test]
    fn test_unit_is_null() {
        assert_eq!(render(&()), "null");
        parse::<()>("null");
    }

    #[test]
    fn test_bytes_round_trip() {
        let payload = Bytes::from_static(b"\x00\x01\xFF");
        let text = render(&payload);
        assert_eq!(text, "[0,1,255]");
        assert_eq!(parse::<Bytes>(&text), payload);
    }
}
