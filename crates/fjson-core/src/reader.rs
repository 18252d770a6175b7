//! Cursor-based pull parser over a fully materialized input buffer
//!
//! The reader owns a position into a borrowed byte slice and exposes the
//! token-level operations formatters are built from: classification without
//! consumption, separator-enforcing container terminators, raw property-name
//! segments for allocation-free dispatch, scalar readers that decode in
//! place, and a non-recursive skip for unknown properties.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::number;
use crate::options::JsonOptions;
use crate::pool;

/// Classification of the next structural or scalar element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// `-`, `0`..`9`
    Number,
    /// `"`
    String,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `,`
    ValueSeparator,
    /// `:`
    NameSeparator,
    /// end of input
    End,
}

impl Token {
    /// Human-readable token name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Token::Null => "null",
            Token::True | Token::False => "boolean",
            Token::Number => "number",
            Token::String => "string",
            Token::BeginArray => "`[`",
            Token::EndArray => "`]`",
            Token::BeginObject => "`{`",
            Token::EndObject => "`}`",
            Token::ValueSeparator => "`,`",
            Token::NameSeparator => "`:`",
            Token::End => "end of input",
        }
    }
}

/// Pull parser over a borrowed input buffer
///
/// Invariant: `pos <= input.len()` at all times. Depth state is scoped to
/// one top-level call; create a fresh reader per operation.
pub struct JsonReader<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
    options: JsonOptions,
}

impl<'a> JsonReader<'a> {
    /// Create a reader with default options
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_options(input, JsonOptions::default())
    }

    /// Create a reader with explicit options
    pub fn with_options(input: &'a [u8], options: JsonOptions) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            options,
        }
    }

    /// Options for this operation
    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Enter one nesting level. Returns false at the configured limit; the
    /// caller must then skip the subtree and produce an empty container.
    #[must_use]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.options.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leave one nesting level
    pub fn exit(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth = self.depth.saturating_sub(1);
    }

    /// Advance past insignificant whitespace
    pub fn skip_whitespace(&mut self) {
        while let Some(&byte) = self.input.get(self.pos) {
            if !matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
                break;
            }
            self.pos += 1;
        }
    }

    /// Classify the next element without consuming it
    pub fn peek_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let Some(&byte) = self.input.get(self.pos) else {
            return Ok(Token::End);
        };
        match byte {
            b'n' => Ok(Token::Null),
            b't' => Ok(Token::True),
            b'f' => Ok(Token::False),
            b'"' => Ok(Token::String),
            b'[' => Ok(Token::BeginArray),
            b']' => Ok(Token::EndArray),
            b'{' => Ok(Token::BeginObject),
            b'}' => Ok(Token::EndObject),
            b',' => Ok(Token::ValueSeparator),
            b':' => Ok(Token::NameSeparator),
            b'-' | b'0'..=b'9' => Ok(Token::Number),
            other => Err(Error::structural(
                self.pos,
                format!("unexpected character `{}`", char::from(other)),
            )),
        }
    }

    fn mismatch(&mut self, expected: &'static str) -> Error {
        match self.peek_token() {
            Ok(Token::End) => Error::eof(self.pos),
            Ok(token) => Error::mismatch(self.pos, expected, token.name()),
            Err(err) => err,
        }
    }

    fn expect_literal(&mut self, literal: &'static [u8]) -> Result<()> {
        let end = self.pos + literal.len();
        if end > self.input.len() {
            return Err(Error::eof(self.input.len()));
        }
        if &self.input[self.pos..end] != literal {
            return Err(Error::structural(
                self.pos,
                format!(
                    "expected `{}`",
                    std::str::from_utf8(literal).unwrap_or("literal")
                ),
            ));
        }
        self.pos = end;
        Ok(())
    }

    /// Consume `null` if it is next; leaves the cursor untouched otherwise
    pub fn read_is_null(&mut self) -> Result<bool> {
        if self.peek_token()? == Token::Null {
            self.expect_literal(b"null")?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consume `[` if it is next
    pub fn read_is_begin_array(&mut self) -> Result<bool> {
        if self.peek_token()? == Token::BeginArray {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Consume `{` if it is next
    pub fn read_is_begin_object(&mut self) -> Result<bool> {
        if self.peek_token()? == Token::BeginObject {
            self.pos += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Require `[`
    pub fn expect_begin_array(&mut self) -> Result<()> {
        if self.read_is_begin_array()? {
            Ok(())
        } else {
            Err(self.mismatch("array"))
        }
    }

    /// Require `{`
    pub fn expect_begin_object(&mut self) -> Result<()> {
        if self.read_is_begin_object()? {
            Ok(())
        } else {
            Err(self.mismatch("object"))
        }
    }

    /// Separator-enforcing array terminator check.
    ///
    /// Returns true when `]` ends the array. Otherwise enforces exactly one
    /// `,` between elements (none before the first, none trailing),
    /// increments `count`, and returns false so the caller decodes the next
    /// element.
    pub fn read_is_end_array(&mut self, count: &mut usize) -> Result<bool> {
        self.read_is_end(count, Token::EndArray, "`]`")
    }

    /// Object counterpart of [`JsonReader::read_is_end_array`]
    pub fn read_is_end_object(&mut self, count: &mut usize) -> Result<bool> {
        self.read_is_end(count, Token::EndObject, "`}`")
    }

    fn read_is_end(&mut self, count: &mut usize, end: Token, end_name: &str) -> Result<bool> {
        let token = self.peek_token()?;
        if token == end {
            self.pos += 1;
            return Ok(true);
        }
        match token {
            Token::End => Err(Error::eof(self.pos)),
            Token::ValueSeparator => {
                if *count == 0 {
                    return Err(Error::structural(self.pos, "separator before first element"));
                }
                self.pos += 1;
                let next = self.peek_token()?;
                if next == end {
                    return Err(Error::structural(
                        self.pos,
                        format!("trailing separator before {end_name}"),
                    ));
                }
                if next == Token::End {
                    return Err(Error::eof(self.pos));
                }
                if next == Token::ValueSeparator {
                    return Err(Error::structural(self.pos, "unexpected separator"));
                }
                *count += 1;
                Ok(false)
            }
            _ => {
                if *count > 0 {
                    return Err(Error::structural(
                        self.pos,
                        "missing separator between elements",
                    ));
                }
                *count += 1;
                Ok(false)
            }
        }
    }

    /// Consume `true`/`false`
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.peek_token()? {
            Token::True => {
                self.expect_literal(b"true")?;
                Ok(true)
            }
            Token::False => {
                self.expect_literal(b"false")?;
                Ok(false)
            }
            _ => Err(self.mismatch("boolean")),
        }
    }

    /// Scan a string token, returning the content span between the quotes
    /// and whether it contains escape sequences
    fn read_string_span(&mut self) -> Result<(usize, usize, bool)> {
        if self.peek_token()? != Token::String {
            return Err(self.mismatch("string"));
        }
        self.pos += 1;
        let start = self.pos;
        let mut has_escapes = false;
        loop {
            match self.input.get(self.pos) {
                None => return Err(Error::eof(self.input.len())),
                Some(b'"') => {
                    let end = self.pos;
                    self.pos += 1;
                    return Ok((start, end, has_escapes));
                }
                Some(b'\\') => {
                    has_escapes = true;
                    if self.pos + 1 >= self.input.len() {
                        return Err(Error::eof(self.input.len()));
                    }
                    self.pos += 2;
                }
                Some(byte) if *byte < 0x20 => {
                    return Err(Error::structural(self.pos, "control character in string"));
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn decode_span(&self, start: usize, end: usize, has_escapes: bool) -> Result<Cow<'a, str>> {
        let raw = &self.input[start..end];
        if !has_escapes {
            let text = std::str::from_utf8(raw)
                .map_err(|_| Error::structural(start, "invalid UTF-8 in string"))?;
            return Ok(Cow::Borrowed(text));
        }
        Ok(Cow::Owned(unescape(raw, start)?))
    }

    /// Decode a string token, borrowing from the input when it is escape-free
    pub fn read_string_ref(&mut self) -> Result<Cow<'a, str>> {
        let (start, end, has_escapes) = self.read_string_span()?;
        self.decode_span(start, end, has_escapes)
    }

    /// Decode a string token into an owned value
    pub fn read_string(&mut self) -> Result<String> {
        Ok(self.read_string_ref()?.into_owned())
    }

    /// Decode a single-scalar string token
    pub fn read_char(&mut self) -> Result<char> {
        let start = self.pos;
        let text = self.read_string_ref()?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::structural(start, "expected a single-character string")),
        }
    }

    /// Decoded property name plus its `:` separator
    pub fn read_property_name(&mut self) -> Result<Cow<'a, str>> {
        let (start, end, has_escapes) = self.read_string_span()?;
        self.expect_name_separator()?;
        self.decode_span(start, end, has_escapes)
    }

    /// Raw property-name segment (escape sequences unexpanded) plus its `:`
    /// separator, for allocation-free length/byte dispatch. Names containing
    /// escapes simply fail to match any known property.
    pub fn read_property_name_raw(&mut self) -> Result<&'a [u8]> {
        let (start, end, _) = self.read_string_span()?;
        self.expect_name_separator()?;
        Ok(&self.input[start..end])
    }

    fn expect_name_separator(&mut self) -> Result<()> {
        if self.peek_token()? != Token::NameSeparator {
            return Err(Error::structural(
                self.pos,
                "expected `:` after property name",
            ));
        }
        self.pos += 1;
        Ok(())
    }

    /// Validate and consume one number token, returning its span
    fn scan_number(&mut self) -> Result<(usize, usize)> {
        if self.peek_token()? != Token::Number {
            return Err(self.mismatch("number"));
        }
        let start = self.pos;
        if self.input.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        let int_start = self.pos;
        while self.input.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        let int_len = self.pos - int_start;
        if int_len == 0 {
            return Err(Error::structural(self.pos, "expected digit"));
        }
        if int_len > 1 && self.input[int_start] == b'0' {
            return Err(Error::structural(int_start, "leading zeros are not allowed"));
        }
        if self.input.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            let frac_start = self.pos;
            while self.input.get(self.pos).is_some_and(u8::is_ascii_digit) {
                self.pos += 1;
            }
            if self.pos == frac_start {
                return Err(Error::structural(self.pos, "expected digit after `.`"));
            }
        }
        if matches!(self.input.get(self.pos), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.input.get(self.pos), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            while self.input.get(self.pos).is_some_and(u8::is_ascii_digit) {
                self.pos += 1;
            }
            if self.pos == exp_start {
                return Err(Error::structural(self.pos, "expected digit in exponent"));
            }
        }
        Ok((start, self.pos))
    }

    /// Shared digit scan for the integer readers. Fails with a type
    /// mismatch when the token carries a fraction or exponent.
    fn scan_integer(&mut self) -> Result<(usize, bool, usize, usize)> {
        if self.peek_token()? != Token::Number {
            return Err(self.mismatch("number"));
        }
        let token_start = self.pos;
        let negative = self.input.get(self.pos) == Some(&b'-');
        if negative {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while self.input.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        let digits_end = self.pos;
        if digits_end == digits_start {
            return Err(Error::structural(self.pos, "expected digit"));
        }
        if digits_end - digits_start > 1 && self.input[digits_start] == b'0' {
            return Err(Error::structural(
                digits_start,
                "leading zeros are not allowed",
            ));
        }
        if matches!(self.input.get(self.pos), Some(b'.') | Some(b'e') | Some(b'E')) {
            self.pos = token_start;
            return Err(Error::mismatch(token_start, "integer", "number"));
        }
        Ok((token_start, negative, digits_start, digits_end))
    }

    fn read_unsigned_raw(&mut self, max: u128, target: &'static str) -> Result<u128> {
        let (token_start, negative, digits_start, digits_end) = self.scan_integer()?;
        if negative {
            self.pos = token_start;
            return Err(Error::mismatch(token_start, target, "number"));
        }
        let mut value: u128 = 0;
        for &byte in &self.input[digits_start..digits_end] {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u128::from(byte - b'0')))
                .filter(|v| *v <= max)
                .ok_or_else(|| {
                    Error::structural(token_start, format!("number does not fit in {target}"))
                })?;
        }
        Ok(value)
    }

    fn read_signed_raw(&mut self, min: i128, max: i128, target: &'static str) -> Result<i128> {
        let (token_start, negative, digits_start, digits_end) = self.scan_integer()?;
        // accumulate negatively so the minimum value parses without overflow
        let mut value: i128 = 0;
        for &byte in &self.input[digits_start..digits_end] {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_sub(i128::from(byte - b'0')))
                .filter(|v| *v >= min)
                .ok_or_else(|| {
                    Error::structural(token_start, format!("number does not fit in {target}"))
                })?;
        }
        if !negative {
            value = value.checked_neg().filter(|v| *v <= max).ok_or_else(|| {
                Error::structural(token_start, format!("number does not fit in {target}"))
            })?;
        }
        Ok(value)
    }

    /// Decode a float token
    pub fn read_f64(&mut self) -> Result<f64> {
        let (start, end) = self.scan_number()?;
        number::parse_float(&self.input[start..end])
            .ok_or_else(|| Error::structural(start, "invalid number"))
    }

    /// Single-precision variant of [`JsonReader::read_f64`]
    pub fn read_f32(&mut self) -> Result<f32> {
        let (start, end) = self.scan_number()?;
        std::str::from_utf8(&self.input[start..end])
            .ok()
            .and_then(|text| text.parse::<f32>().ok())
            .ok_or_else(|| Error::structural(start, "invalid number"))
    }

    /// Skip one well-formed value of arbitrary nesting without recursing,
    /// balancing brackets/braces and honoring string escapes
    pub fn read_next_block(&mut self) -> Result<()> {
        match self.peek_token()? {
            Token::Null => self.expect_literal(b"null"),
            Token::True => self.expect_literal(b"true"),
            Token::False => self.expect_literal(b"false"),
            Token::Number => self.scan_number().map(|_| ()),
            Token::String => self.read_string_span().map(|_| ()),
            Token::BeginArray | Token::BeginObject => {
                let mut open: SmallVec<[u8; 16]> = SmallVec::new();
                loop {
                    self.skip_whitespace();
                    let Some(&byte) = self.input.get(self.pos) else {
                        return Err(Error::eof(self.input.len()));
                    };
                    match byte {
                        b'[' | b'{' => {
                            open.push(byte);
                            self.pos += 1;
                        }
                        b']' | b'}' => {
                            let expected = if byte == b']' { b'[' } else { b'{' };
                            if open.pop() != Some(expected) {
                                return Err(Error::structural(
                                    self.pos,
                                    "mismatched closing delimiter",
                                ));
                            }
                            self.pos += 1;
                            if open.is_empty() {
                                return Ok(());
                            }
                        }
                        b'"' => {
                            self.read_string_span()?;
                        }
                        _ => self.pos += 1,
                    }
                }
            }
            Token::End => Err(Error::eof(self.pos)),
            other => Err(Error::structural(
                self.pos,
                format!("unexpected {}", other.name()),
            )),
        }
    }

    /// Require that only whitespace remains
    pub fn expect_end(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.pos != self.input.len() {
            return Err(Error::structural(self.pos, "trailing characters"));
        }
        Ok(())
    }
}

macro_rules! unsigned_reads {
    ($($method:ident => $ty:ty),* $(,)?) => {
        impl JsonReader<'_> {
            $(
                /// Decode an integer token, rejecting fractions and overflow
                pub fn $method(&mut self) -> Result<$ty> {
                    Ok(self.read_unsigned_raw(<$ty>::MAX as u128, stringify!($ty))? as $ty)
                }
            )*
        }
    };
}

macro_rules! signed_reads {
    ($($method:ident => $ty:ty),* $(,)?) => {
        impl JsonReader<'_> {
            $(
                /// Decode an integer token, rejecting fractions and overflow
                pub fn $method(&mut self) -> Result<$ty> {
                    Ok(self.read_signed_raw(<$ty>::MIN as i128, <$ty>::MAX as i128, stringify!($ty))? as $ty)
                }
            )*
        }
    };
}

unsigned_reads! {
    read_u8 => u8,
    read_u16 => u16,
    read_u32 => u32,
    read_u64 => u64,
    read_u128 => u128,
}

signed_reads! {
    read_i8 => i8,
    read_i16 => i16,
    read_i32 => i32,
    read_i64 => i64,
    read_i128 => i128,
}

/// Expand escape sequences, staging bytes in pooled scratch and copying
/// exactly the decoded length out
fn unescape(raw: &[u8], base: usize) -> Result<String> {
    let mut scratch = pool::global_scratch().rent(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let byte = raw[i];
        if byte != b'\\' {
            scratch.push(byte);
            i += 1;
            continue;
        }
        let code = *raw
            .get(i + 1)
            .ok_or_else(|| Error::eof(base + raw.len()))?;
        i += 2;
        match code {
            b'"' => scratch.push(b'"'),
            b'\\' => scratch.push(b'\\'),
            b'/' => scratch.push(b'/'),
            b'b' => scratch.push(0x08),
            b'f' => scratch.push(0x0C),
            b'n' => scratch.push(b'\n'),
            b'r' => scratch.push(b'\r'),
            b't' => scratch.push(b'\t'),
            b'u' => {
                let high = parse_hex4(raw, i, base)?;
                i += 4;
                let scalar = if (0xD800..0xDC00).contains(&high) {
                    // surrogate pair
                    if raw.get(i) != Some(&b'\\') || raw.get(i + 1) != Some(&b'u') {
                        return Err(Error::structural(base + i, "unpaired surrogate"));
                    }
                    let low = parse_hex4(raw, i + 2, base)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(Error::structural(base + i, "invalid low surrogate"));
                    }
                    i += 6;
                    0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
                } else if (0xDC00..0xE000).contains(&high) {
                    return Err(Error::structural(base + i, "unpaired surrogate"));
                } else {
                    u32::from(high)
                };
                let ch = char::from_u32(scalar)
                    .ok_or_else(|| Error::structural(base + i, "invalid unicode escape"))?;
                let mut utf8 = [0u8; 4];
                scratch.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
            _ => return Err(Error::structural(base + i, "invalid escape sequence")),
        }
    }
    let decoded = std::str::from_utf8(&scratch)
        .map_err(|_| Error::structural(base, "invalid UTF-8 in string"))?;
    Ok(decoded.to_owned())
}

fn parse_hex4(raw: &[u8], at: usize, base: usize) -> Result<u16> {
    let digits = raw
        .get(at..at + 4)
        .ok_or_else(|| Error::eof(base + raw.len()))?;
    let mut value: u16 = 0;
    for &byte in digits {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                return Err(Error::structural(
                    base + at,
                    "invalid hex digit in unicode escape",
                ));
            }
        };
        value = (value << 4) | u16::from(nibble);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_classifies_without_consuming_tokens() {
        let mut reader = JsonReader::new(b"  [1, true]");
        assert_eq!(reader.peek_token().unwrap(), Token::BeginArray);
        assert_eq!(reader.peek_token().unwrap(), Token::BeginArray);
        assert!(reader.read_is_begin_array().unwrap());
        assert_eq!(reader.peek_token().unwrap(), Token::Number);
    }

    #[test]
    fn test_peek_rejects_garbage() {
        let mut reader = JsonReader::new(b"  @");
        assert!(matches!(
            reader.peek_token(),
            Err(Error::StructuralParse { position: 2, .. })
        ));
    }

    #[test]
    fn test_read_is_null_leaves_cursor_on_miss() {
        let mut reader = JsonReader::new(b"42");
        assert!(!reader.read_is_null().unwrap());
        assert_eq!(reader.read_i32().unwrap(), 42);
    }

    #[test]
    fn test_array_separator_grammar() {
        let mut reader = JsonReader::new(b"[1,2,3]");
        assert!(reader.read_is_begin_array().unwrap());
        let mut count = 0;
        let mut values = Vec::new();
        while !reader.read_is_end_array(&mut count).unwrap() {
            values.push(reader.read_i64().unwrap());
        }
        assert_eq!(values, [1, 2, 3]);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_trailing_separator_rejected() {
        let mut reader = JsonReader::new(b"[1,2,]");
        assert!(reader.read_is_begin_array().unwrap());
        let mut count = 0;
        assert!(!reader.read_is_end_array(&mut count).unwrap());
        reader.read_i64().unwrap();
        assert!(!reader.read_is_end_array(&mut count).unwrap());
        reader.read_i64().unwrap();
        let err = reader.read_is_end_array(&mut count).unwrap_err();
        assert!(matches!(err, Error::StructuralParse { .. }));
        assert!(err.to_string().contains("trailing separator"));
    }

    #[test]
    fn test_missing_separator_rejected() {
        let mut reader = JsonReader::new(b"[1 2]");
        assert!(reader.read_is_begin_array().unwrap());
        let mut count = 0;
        assert!(!reader.read_is_end_array(&mut count).unwrap());
        reader.read_i64().unwrap();
        let err = reader.read_is_end_array(&mut count).unwrap_err();
        assert!(err.to_string().contains("missing separator"));
    }

    #[test]
    fn test_separator_before_first_element_rejected() {
        let mut reader = JsonReader::new(b"[,1]");
        assert!(reader.read_is_begin_array().unwrap());
        let mut count = 0;
        let err = reader.read_is_end_array(&mut count).unwrap_err();
        assert!(err.to_string().contains("before first element"));
    }

    #[test]
    fn test_integer_extremes() {
        let mut reader = JsonReader::new(b"-9223372036854775808");
        assert_eq!(reader.read_i64().unwrap(), i64::MIN);
        let mut reader = JsonReader::new(b"18446744073709551615");
        assert_eq!(reader.read_u64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let mut reader = JsonReader::new(b"300");
        let err = reader.read_u8().unwrap_err();
        assert!(err.to_string().contains("does not fit in u8"));
    }

    #[test]
    fn test_integer_reader_rejects_fraction() {
        let mut reader = JsonReader::new(b"1.5");
        assert!(matches!(
            reader.read_i32(),
            Err(Error::TypeMismatch { expected: "integer", .. })
        ));
    }

    #[test]
    fn test_unsigned_reader_rejects_negative() {
        let mut reader = JsonReader::new(b"-1");
        assert!(matches!(reader.read_u32(), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_leading_zero_rejected() {
        let mut reader = JsonReader::new(b"01");
        assert!(reader.read_i32().is_err());
        let mut reader = JsonReader::new(b"0");
        assert_eq!(reader.read_i32().unwrap(), 0);
    }

    #[test]
    fn test_scalar_reader_against_wrong_token() {
        let mut reader = JsonReader::new(b"\"text\"");
        assert!(matches!(
            reader.read_i32(),
            Err(Error::TypeMismatch { expected: "number", found: "string", .. })
        ));
    }

    #[test]
    fn test_string_decoding() {
        let mut reader = JsonReader::new(br#""plain""#);
        assert!(matches!(reader.read_string_ref().unwrap(), Cow::Borrowed("plain")));

        let mut reader = JsonReader::new("\"a\\nbAé\"".as_bytes());
        assert_eq!(reader.read_string().unwrap(), "a\nbAé");
    }

    #[test]
    fn test_surrogate_pair_decoding() {
        let mut reader = JsonReader::new("\"😀\"".as_bytes());
        assert_eq!(reader.read_string().unwrap(), "😀");

        let mut reader = JsonReader::new(br#""\ud83d""#);
        assert!(reader.read_string().is_err());
    }

    #[test]
    fn test_unterminated_string_is_eof() {
        let mut reader = JsonReader::new(b"\"abc");
        let err = reader.read_string().unwrap_err();
        assert!(err.to_string().contains("unexpected end"));
    }

    #[test]
    fn test_property_name_raw_and_decoded() {
        let mut reader = JsonReader::new(br#""id": 7"#);
        assert_eq!(reader.read_property_name_raw().unwrap(), b"id");
        assert_eq!(reader.read_i32().unwrap(), 7);

        let mut reader = JsonReader::new("\"nomé\": 1".as_bytes());
        assert_eq!(reader.read_property_name().unwrap(), "nomé");
    }

    #[test]
    fn test_property_name_requires_colon() {
        let mut reader = JsonReader::new(br#""id" 7"#);
        let err = reader.read_property_name_raw().unwrap_err();
        assert!(err.to_string().contains("expected `:`"));
    }

    #[test]
    fn test_read_next_block_skips_nested_values() {
        let input = br#"{"skip": {"a": [1, {"b": "]}"}], "c": null}, "keep": 1}"#;
        let mut reader = JsonReader::new(input);
        assert!(reader.read_is_begin_object().unwrap());
        let mut count = 0;
        assert!(!reader.read_is_end_object(&mut count).unwrap());
        assert_eq!(reader.read_property_name_raw().unwrap(), b"skip");
        reader.read_next_block().unwrap();
        assert!(!reader.read_is_end_object(&mut count).unwrap());
        assert_eq!(reader.read_property_name_raw().unwrap(), b"keep");
        assert_eq!(reader.read_i32().unwrap(), 1);
        assert!(reader.read_is_end_object(&mut count).unwrap());
    }

    #[test]
    fn test_read_next_block_rejects_mismatched_delimiters() {
        let mut reader = JsonReader::new(b"[1, 2}");
        let err = reader.read_next_block().unwrap_err();
        assert!(err.to_string().contains("mismatched"));
    }

    #[test]
    fn test_read_next_block_scalar() {
        let mut reader = JsonReader::new(b"42 ,");
        reader.read_next_block().unwrap();
        assert_eq!(reader.peek_token().unwrap(), Token::ValueSeparator);
    }

    #[test]
    fn test_expect_end_rejects_trailing() {
        let mut reader = JsonReader::new(b"1 2");
        reader.read_i32().unwrap();
        assert!(reader.expect_end().is_err());

        let mut reader = JsonReader::new(b"1  ");
        reader.read_i32().unwrap();
        assert!(reader.expect_end().is_ok());
    }

    #[test]
    fn test_depth_guard() {
        let options = JsonOptions::new().with_max_depth(2);
        let mut reader = JsonReader::with_options(b"[]", options);
        assert!(reader.enter());
        assert!(reader.enter());
        assert!(!reader.enter());
        reader.exit();
        assert!(reader.enter());
    }

    #[test]
    fn test_error_positions() {
        let mut reader = JsonReader::new(b"   [1,,2]");
        assert!(reader.read_is_begin_array().unwrap());
        let mut count = 0;
        assert!(!reader.read_is_end_array(&mut count).unwrap());
        reader.read_i32().unwrap();
        let err = reader.read_is_end_array(&mut count).unwrap_err();
        assert_eq!(err.position(), Some(6));
    }
}
