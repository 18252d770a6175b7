//! Object-shaped formatters and the `json_object!` macro
//!
//! Property-name dispatch is the compile-time realization of the byte-key
//! tables: the generated code rejects on length first, then compares bytes
//! positionally (accepting both cases per letter when the case-insensitive
//! option is set). Unknown properties are always tolerated and skipped with
//! a single non-recursive block skip.

/// Length-first property-name comparison against a raw name segment
pub fn name_matches(raw: &[u8], expected: &[u8], case_insensitive: bool) -> bool {
    if raw.len() != expected.len() {
        return false;
    }
    if case_insensitive {
        raw.eq_ignore_ascii_case(expected)
    } else {
        raw == expected
    }
}

/// Probe wrapper for absence detection (autoref specialization)
pub struct AbsentProbe<'a, T>(pub &'a T);

/// Specialized absence check: `None` fields count as absent
pub trait OptionAbsent {
    /// True when the wrapped field is `None`
    fn is_absent(&self) -> bool;
}

impl<T> OptionAbsent for AbsentProbe<'_, Option<T>> {
    fn is_absent(&self) -> bool {
        self.0.is_none()
    }
}

/// Fallback absence check: non-optional fields are never absent
pub trait ValueAbsent {
    /// Always false
    fn is_absent(&self) -> bool {
        false
    }
}

impl<T> ValueAbsent for &AbsentProbe<'_, T> {}

/// Define a struct together with its object-shaped JSON codec.
///
/// Every field maps to one wire property. `Option` fields honor the
/// `omit_null` option on serialize; properties missing from the input fall
/// back to the field's `Default`. Unknown input properties are skipped.
///
/// ```
/// fjson_rs::json_object! {
///     /// A user record
///     #[derive(Debug, Clone, PartialEq, Default)]
///     pub struct User {
///         pub id: u64 => "id",
///         pub name: String => "name",
///         pub email: Option<String> => "email",
///     }
/// }
/// ```
#[macro_export]
macro_rules! json_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty => $key:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )+
        }

        impl $crate::fmt::JsonFormat for $name {
            fn serialize(
                &self,
                writer: &mut $crate::writer::JsonWriter<'_>,
            ) -> $crate::error::Result<()> {
                if !writer.enter() {
                    writer.write_raw(b"{}");
                    return Ok(());
                }
                writer.begin_object();
                let result = (|| {
                    let mut wrote = 0usize;
                    $(
                        let absent = {
                            use $crate::fmt::object::{OptionAbsent as _, ValueAbsent as _};
                            (&$crate::fmt::object::AbsentProbe(&self.$field)).is_absent()
                        };
                        if !(writer.options().omit_null && absent) {
                            if wrote > 0 {
                                writer.value_separator();
                            }
                            wrote += 1;
                            // pre-encoded `"name":` literal
                            writer.write_raw(concat!("\"", $key, "\":").as_bytes());
                            $crate::fmt::JsonFormat::serialize(&self.$field, writer)?;
                        }
                    )+
                    let _ = wrote;
                    Ok(())
                })();
                writer.end_object();
                writer.exit();
                result
            }

            fn deserialize(
                reader: &mut $crate::reader::JsonReader<'_>,
            ) -> $crate::error::Result<Self> {
                if !reader.enter() {
                    reader.read_next_block()?;
                    return Ok(Self {
                        $($field: Default::default()),+
                    });
                }
                let result = (|| {
                    reader.expect_begin_object()?;
                    $(let mut $field: Option<$field_ty> = None;)+
                    let mut count = 0usize;
                    while !reader.read_is_end_object(&mut count)? {
                        let name = reader.read_property_name_raw()?;
                        let case_insensitive = reader.options().case_insensitive_properties;
                        'matched: {
                            $(
                                if $crate::fmt::object::name_matches(
                                    name,
                                    $key.as_bytes(),
                                    case_insensitive,
                                ) {
                                    $field = Some(
                                        <$field_ty as $crate::fmt::JsonFormat>::deserialize(
                                            reader,
                                        )?,
                                    );
                                    break 'matched;
                                }
                            )+
                            // unknown property: skip its value and move on
                            reader.read_next_block()?;
                        }
                    }
                    Ok(Self {
                        $($field: $field.unwrap_or_default()),+
                    })
                })();
                reader.exit();
                result
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fmt::JsonFormat;
    use crate::options::JsonOptions;
    use crate::reader::JsonReader;
    use crate::writer::{ByteWriter, JsonWriter};

    crate::json_object! {
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct Account {
            pub id: u64 => "id",
            pub name: String => "name",
            pub email: Option<String> => "email",
            pub scores: Vec<i32> => "scores",
        }
    }

    crate::json_object! {
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct Wrapper {
            pub inner: Option<Box<Account>> => "inner",
            pub label: String => "label",
        }
    }

    fn sample() -> Account {
        Account {
            id: 7,
            name: "ada".to_string(),
            email: Some("ada@example.com".to_string()),
            scores: vec![1, 2, 3],
        }
    }

    fn render_with<T: JsonFormat>(value: &T, options: JsonOptions) -> String {
        let mut out = ByteWriter::new();
        let mut writer = JsonWriter::new(&mut out, options);
        value.serialize(&mut writer).unwrap();
        String::from_utf8(out.into_vec()).unwrap()
    }

    fn parse_with<T: JsonFormat>(text: &str, options: JsonOptions) -> T {
        let mut reader = JsonReader::with_options(text.as_bytes(), options);
        let value = T::deserialize(&mut reader).unwrap();
        reader.expect_end().unwrap();
        value
    }

    #[test]
    fn test_name_matches_is_length_first() {
        assert!(name_matches(b"id", b"id", false));
        assert!(!name_matches(b"idx", b"id", false));
        assert!(!name_matches(b"ID", b"id", false));
        assert!(name_matches(b"ID", b"id", true));
        assert!(!name_matches(b"I", b"id", true));
    }

    #[test]
    fn test_object_round_trip() {
        let value = sample();
        let text = render_with(&value, JsonOptions::default());
        assert_eq!(
            text,
            r#"{"id":7,"name":"ada","email":"ada@example.com","scores":[1,2,3]}"#
        );
        assert_eq!(parse_with::<Account>(&text, JsonOptions::default()), value);
    }

    #[test]
    fn test_omit_null_drops_absent_properties() {
        let mut value = sample();
        value.email = None;
        let options = JsonOptions::new().with_omit_null(true);
        let text = render_with(&value, options);
        assert_eq!(text, r#"{"id":7,"name":"ada","scores":[1,2,3]}"#);
        assert_eq!(parse_with::<Account>(&text, JsonOptions::default()), value);
    }

    #[test]
    fn test_null_kept_without_omit_null() {
        let mut value = sample();
        value.email = None;
        let text = render_with(&value, JsonOptions::default());
        assert!(text.contains(r#""email":null"#));
    }

    #[test]
    fn test_unknown_properties_skipped() {
        let text = r#"{"id":1,"extra":{"deep":[1,2,{"x":"]"}]},"name":"n","scores":[]}"#;
        let value = parse_with::<Account>(text, JsonOptions::default());
        assert_eq!(value.id, 1);
        assert_eq!(value.name, "n");
        assert_eq!(value.email, None);
    }

    #[test]
    fn test_missing_properties_default() {
        let value = parse_with::<Account>(r#"{"id":3}"#, JsonOptions::default());
        assert_eq!(value.id, 3);
        assert_eq!(value.name, "");
        assert!(value.scores.is_empty());
    }

    #[test]
    fn test_case_insensitive_option_scope() {
        let text = r#"{"ID":9,"Name":"x"}"#;
        let strict = parse_with::<Account>(text, JsonOptions::default());
        // case-sensitive matching treats both as unknown
        assert_eq!(strict.id, 0);
        let lax = parse_with::<Account>(
            text,
            JsonOptions::new().with_case_insensitive_properties(true),
        );
        assert_eq!(lax.id, 9);
        assert_eq!(lax.name, "x");
    }

    #[test]
    fn test_nested_objects() {
        let value = Wrapper {
            inner: Some(Box::new(sample())),
            label: "outer".to_string(),
        };
        let text = render_with(&value, JsonOptions::default());
        assert_eq!(parse_with::<Wrapper>(&text, JsonOptions::default()), value);
    }

    #[test]
    fn test_depth_cutoff_emits_empty_object() {
        let value = Wrapper {
            inner: Some(Box::new(sample())),
            label: "outer".to_string(),
        };
        let options = JsonOptions::new().with_max_depth(1);
        let text = render_with(&value, options);
        assert_eq!(text, r#"{"inner":{},"label":"outer"}"#);
    }

    #[test]
    fn test_depth_cutoff_on_deserialize() {
        let options = JsonOptions::new().with_max_depth(1);
        let text = r#"{"inner":{"id":1,"label":"x"},"label":"outer"}"#;
        let value = parse_with::<Wrapper>(text, options);
        // nested object collapses to defaults at the cutoff
        assert_eq!(value.inner, Some(Box::new(Account::default())));
        assert_eq!(value.label, "outer");
    }

    #[test]
    fn test_grammar_violations_surface() {
        let mut reader = JsonReader::new(br#"{"id":1,}"#.as_slice());
        assert!(Account::deserialize(&mut reader).is_err());

        let mut reader = JsonReader::new(br#"{"id" 1}"#.as_slice());
        assert!(Account::deserialize(&mut reader).is_err());
    }
}
