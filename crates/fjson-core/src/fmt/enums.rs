//! Enum codecs over perfect-hash name tables
//!
//! Each enum builds two fixed tables at first use: underlying value →
//! name bytes, and name bytes → underlying value. In name mode, named
//! values render as quoted strings and unnamed values fall back to the bare
//! number; parsing accepts both forms. In number mode the tables are
//! bypassed entirely and the underlying integer storage passes through the
//! integer codec unreinterpreted, which keeps flag-style values whose bit
//! patterns are not named constants intact.
//!
//! The codec machinery is instantiated once per underlying integer
//! width/signedness through [`IntRepr`].

use crate::error::{Error, Result};
use crate::options::EnumRepr;
use crate::reader::{JsonReader, Token};
use crate::table::{ByteKeyTable, ScalarKey, ScalarKeyTable};
use crate::writer::JsonWriter;

/// Underlying integer representation of an enum
pub trait IntRepr: Copy + Eq + ScalarKey + 'static {
    /// Emit through the matching integer writer
    fn write(self, writer: &mut JsonWriter<'_>);

    /// Decode through the matching integer reader
    fn read(reader: &mut JsonReader<'_>) -> Result<Self>;

    /// Width-preserving table key (sign-extended for signed reprs, both at
    /// build and lookup)
    fn table_key(self) -> u64;
}

macro_rules! int_reprs {
    ($($ty:ty => $write:ident, $read:ident);* $(;)?) => {
        $(
            impl IntRepr for $ty {
                fn write(self, writer: &mut JsonWriter<'_>) {
                    writer.$write(self);
                }

                fn read(reader: &mut JsonReader<'_>) -> Result<Self> {
                    reader.$read()
                }

                fn table_key(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

int_reprs! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
}

/// Closed enum (or flags type) with named constants
pub trait JsonEnum: Copy + 'static {
    /// Underlying integer storage
    type Repr: IntRepr;

    /// Named constants, with any per-constant renames already applied
    const NAMED: &'static [(Self::Repr, &'static str)];

    /// Underlying storage of this value
    fn to_repr(self) -> Self::Repr;

    /// Value for an underlying storage pattern. Closed enums return `None`
    /// for unnamed patterns; flags types are total.
    fn from_repr(repr: Self::Repr) -> Option<Self>;
}

/// The two lookup tables backing one enum's name mode
pub struct EnumTables<R: IntRepr> {
    value_to_name: ScalarKeyTable<u64, &'static str>,
    name_to_value: ByteKeyTable<R>,
}

impl<R: IntRepr> EnumTables<R> {
    /// Build both tables from the named-constant list. Constructed fully
    /// off to the side; callers publish the result through a `OnceLock`.
    /// Aliased values (flags with shared bits) resolve to their first name.
    pub fn build(named: &'static [(R, &'static str)]) -> Self {
        let value_to_name = ScalarKeyTable::build_first_wins(
            named.iter().map(|(repr, name)| (repr.table_key(), *name)),
        );
        let name_to_value =
            ByteKeyTable::build_first_wins(named.iter().map(|(repr, name)| (*name, *repr)));
        Self {
            value_to_name,
            name_to_value,
        }
    }

    /// Name for an underlying value, when one of the named constants
    /// matches exactly
    pub fn name_of(&self, repr: R) -> Option<&'static str> {
        self.value_to_name.get(repr.table_key()).copied()
    }

    /// Underlying value for a name
    pub fn value_of(&self, name: &[u8]) -> Option<R> {
        self.name_to_value.get(name).copied()
    }
}

/// Serialize an enum value under the options' representation mode
pub fn serialize_enum<E: JsonEnum>(
    tables: &EnumTables<E::Repr>,
    writer: &mut JsonWriter<'_>,
    value: E,
) -> Result<()> {
    let repr = value.to_repr();
    match writer.options().enum_repr {
        EnumRepr::Number => repr.write(writer),
        EnumRepr::Name => match tables.name_of(repr) {
            Some(name) => writer.write_string(name),
            // unnamed values have no textual form; fall back to the number
            None => repr.write(writer),
        },
    }
    Ok(())
}

/// Deserialize an enum value, accepting both textual and numeric forms
pub fn deserialize_enum<E: JsonEnum>(
    tables: &EnumTables<E::Repr>,
    reader: &mut JsonReader<'_>,
    type_name: &'static str,
) -> Result<E> {
    match reader.peek_token()? {
        Token::String => {
            let position = reader.position();
            let text = reader.read_string_ref()?;
            let repr = tables.value_of(text.as_bytes()).ok_or_else(|| {
                Error::structural(position, format!("unknown {type_name} value `{text}`"))
            })?;
            E::from_repr(repr).ok_or_else(|| {
                Error::invariant(format!("named {type_name} constant has no value"))
            })
        }
        Token::Number => {
            let position = reader.position();
            let repr = E::Repr::read(reader)?;
            E::from_repr(repr).ok_or_else(|| {
                Error::structural(position, format!("unnamed value for closed enum {type_name}"))
            })
        }
        _ => Err(Error::mismatch(
            reader.position(),
            type_name,
            reader.peek_token()?.name(),
        )),
    }
}

/// Define a closed C-like enum together with its JSON codec.
///
/// ```
/// fjson_rs::json_enum! {
///     /// Traffic light phase
///     pub enum Phase: u8 {
///         Red = 1,
///         Amber = 2,
///         #[rename = "go"]
///         Green = 4,
///     }
/// }
/// ```
#[macro_export]
macro_rules! json_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $(
                $(#[rename = $rename:literal])?
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $($variant = $value),+
        }

        impl $crate::fmt::enums::JsonEnum for $name {
            type Repr = $repr;

            const NAMED: &'static [($repr, &'static str)] = &[
                $(($value, $crate::json_enum!(@name $variant $(, $rename)?))),+
            ];

            fn to_repr(self) -> $repr {
                self as $repr
            }

            fn from_repr(repr: $repr) -> Option<Self> {
                $(
                    if repr == $value {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }

        $crate::json_enum!(@format $name : $repr);
    };

    (@name $variant:ident) => {
        stringify!($variant)
    };
    (@name $variant:ident, $rename:literal) => {
        $rename
    };

    (@format $name:ty : $repr:ty) => {
        impl $name {
            /// Lookup tables for the textual representation, built at first
            /// use
            fn enum_name_tables() -> &'static $crate::fmt::enums::EnumTables<$repr> {
                static TABLES: std::sync::OnceLock<$crate::fmt::enums::EnumTables<$repr>> =
                    std::sync::OnceLock::new();
                TABLES.get_or_init(|| {
                    $crate::fmt::enums::EnumTables::build(
                        <$name as $crate::fmt::enums::JsonEnum>::NAMED,
                    )
                })
            }
        }

        impl $crate::fmt::JsonFormat for $name {
            fn serialize(
                &self,
                writer: &mut $crate::writer::JsonWriter<'_>,
            ) -> $crate::error::Result<()> {
                $crate::fmt::enums::serialize_enum(Self::enum_name_tables(), writer, *self)
            }

            fn deserialize(
                reader: &mut $crate::reader::JsonReader<'_>,
            ) -> $crate::error::Result<Self> {
                $crate::fmt::enums::deserialize_enum(
                    Self::enum_name_tables(),
                    reader,
                    stringify!($name),
                )
            }
        }
    };
}

/// Attach a JSON codec to an existing `bitflags` type. Flags are total over
/// their underlying storage, so unnamed bit patterns survive both modes.
///
/// ```
/// bitflags::bitflags! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub struct Access: u32 {
///         const READ = 1;
///         const WRITE = 2;
///     }
/// }
/// fjson_rs::json_bitflags!(Access: u32 { READ, WRITE });
/// ```
#[macro_export]
macro_rules! json_bitflags {
    ($name:ty : $repr:ty { $($flag:ident),+ $(,)? }) => {
        impl $crate::fmt::enums::JsonEnum for $name {
            type Repr = $repr;

            const NAMED: &'static [($repr, &'static str)] = &[
                $((<$name>::$flag.bits(), stringify!($flag))),+
            ];

            fn to_repr(self) -> $repr {
                self.bits()
            }

            fn from_repr(repr: $repr) -> Option<Self> {
                Some(<$name>::from_bits_retain(repr))
            }
        }

        $crate::json_enum!(@format $name : $repr);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt::JsonFormat;
    use crate::options::JsonOptions;
    use crate::writer::ByteWriter;

    crate::json_enum! {
        /// Palette used across the table tests
        pub enum Color: u8 {
            Red = 1,
            Green = 2,
            #[rename = "deep-blue"]
            Blue = 4,
        }
    }

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct Access: u32 {
            const READ = 1;
            const WRITE = 2;
            const EXEC = 4;
        }
    }

    crate::json_bitflags!(Access: u32 { READ, WRITE, EXEC });

    fn render_with<T: JsonFormat>(value: &T, options: JsonOptions) -> String {
        let mut out = ByteWriter::new();
        let mut writer = JsonWriter::new(&mut out, options);
        value.serialize(&mut writer).unwrap();
        String::from_utf8(out.into_vec()).unwrap()
    }

    fn parse<T: JsonFormat>(text: &str) -> T {
        let mut reader = JsonReader::new(text.as_bytes());
        T::deserialize(&mut reader).unwrap()
    }

    #[test]
    fn test_name_mode_round_trip() {
        let options = JsonOptions::default();
        assert_eq!(render_with(&Color::Red, options), "\"Red\"");
        assert_eq!(render_with(&Color::Blue, options), "\"deep-blue\"");
        assert_eq!(parse::<Color>("\"Red\""), Color::Red);
        assert_eq!(parse::<Color>("\"deep-blue\""), Color::Blue);
    }

    #[test]
    fn test_number_mode_bypasses_tables() {
        let options = JsonOptions::new().with_enum_repr(EnumRepr::Number);
        assert_eq!(render_with(&Color::Green, options), "2");
        assert_eq!(parse::<Color>("2"), Color::Green);
    }

    #[test]
    fn test_unknown_name_rejected() {
        let mut reader = JsonReader::new(b"\"Cyan\"");
        let err = Color::deserialize(&mut reader).unwrap_err();
        assert!(err.to_string().contains("Cyan"));
    }

    #[test]
    fn test_unnamed_number_rejected_for_closed_enum() {
        let mut reader = JsonReader::new(b"99");
        let err = Color::deserialize(&mut reader).unwrap_err();
        assert!(err.to_string().contains("unnamed value"));
    }

    #[test]
    fn test_flags_named_value_renders_name() {
        let options = JsonOptions::default();
        assert_eq!(render_with(&Access::READ, options), "\"READ\"");
        assert_eq!(parse::<Access>("\"WRITE\""), Access::WRITE);
    }

    #[test]
    fn test_flags_unnamed_value_falls_back_to_number() {
        let combined = Access::from_bits_retain(99);
        let options = JsonOptions::default();
        assert_eq!(render_with(&combined, options), "99");
        assert_eq!(parse::<Access>("99"), combined);
    }

    #[test]
    fn test_flags_survive_number_mode() {
        let options = JsonOptions::new().with_enum_repr(EnumRepr::Number);
        let combined = Access::READ | Access::EXEC;
        assert_eq!(render_with(&combined, options), "5");
        assert_eq!(parse::<Access>("5"), combined);
    }

    #[test]
    fn test_wrong_token_is_mismatch() {
        let mut reader = JsonReader::new(b"[1]");
        assert!(matches!(
            Color::deserialize(&mut reader),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_tables_reject_length_mismatch_cheaply() {
        let tables = EnumTables::<u8>::build(<Color as JsonEnum>::NAMED);
        assert_eq!(tables.value_of(b"Red"), Some(1));
        assert_eq!(tables.value_of(b"Re"), None);
        assert_eq!(tables.name_of(4), Some("deep-blue"));
        assert_eq!(tables.name_of(9), None);
    }
}
