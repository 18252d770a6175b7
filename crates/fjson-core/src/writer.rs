//! Growable output buffer and the JSON-shaped writer built on top of it
//!
//! `ByteWriter` is a plain byte sink with span-based write/advance
//! primitives; `JsonWriter` layers the wire grammar (delimiters, literals,
//! string escaping) and the recursion depth guard over it. One writer pair
//! belongs to exactly one logical serialize operation.

use bytes::Bytes;

use crate::options::JsonOptions;

const MIN_CAPACITY: usize = 64;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Growable output buffer with an explicit committed length
///
/// The backing storage grows geometrically; bytes between the committed
/// length and the backing capacity are writable scratch handed out by
/// [`ByteWriter::reserve`].
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    len: usize,
}

impl ByteWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with pre-sized backing storage
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            len: 0,
        }
    }

    /// Return at least `n` writable bytes starting at the committed position,
    /// growing the backing buffer geometrically when needed
    pub fn reserve(&mut self, n: usize) -> &mut [u8] {
        let required = self.len + n;
        if required > self.buf.len() {
            let grown = (self.buf.len() * 2).max(required).max(MIN_CAPACITY);
            self.buf.resize(grown, 0);
        }
        &mut self.buf[self.len..self.len + n]
    }

    /// Commit `n` bytes previously obtained through [`ByteWriter::reserve`]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.len + n <= self.buf.len());
        self.len += n;
    }

    /// Copy a pre-encoded literal into the output. Zero-length writes are
    /// no-ops.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.reserve(bytes.len()).copy_from_slice(bytes);
        self.advance(bytes.len());
    }

    /// Append a single byte
    pub fn push(&mut self, byte: u8) {
        self.reserve(1)[0] = byte;
        self.advance(1);
    }

    /// Committed output so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Number of committed bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been committed
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reset the committed length, keeping the backing storage
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Consume the writer, returning exactly the committed bytes
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.truncate(self.len);
        self.buf
    }

    /// Consume the writer, freezing the committed bytes for zero-copy handoff
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.into_vec())
    }
}

/// JSON text writer over a [`ByteWriter`]
///
/// Carries the per-call options and the recursion depth counter. Formatters
/// that descend into nested containers call [`JsonWriter::enter`] first and
/// emit an empty container when it reports the limit.
pub struct JsonWriter<'a> {
    out: &'a mut ByteWriter,
    options: JsonOptions,
    depth: usize,
}

impl<'a> JsonWriter<'a> {
    /// Wrap an output buffer with the given options
    pub fn new(out: &'a mut ByteWriter, options: JsonOptions) -> Self {
        Self {
            out,
            options,
            depth: 0,
        }
    }

    /// Options for this operation
    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enter one nesting level. Returns false at the configured limit, in
    /// which case the caller must emit an empty container instead of
    /// recursing.
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

    /// Underlying byte buffer
    pub(crate) fn raw(&mut self) -> &mut ByteWriter {
        self.out
    }

    /// Copy a pre-encoded literal (field-name prefix, digits, ...) verbatim
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.out.write_raw(bytes);
    }

    /// Emit the `null` literal
    pub fn write_null(&mut self) {
        self.out.write_raw(b"null");
    }

    /// Emit `true` or `false`
    pub fn write_bool(&mut self, value: bool) {
        let literal: &[u8] = if value { b"true" } else { b"false" };
        self.out.write_raw(literal);
    }

    /// Emit `[`
    pub fn begin_array(&mut self) {
        self.out.push(b'[');
    }

    /// Emit `]`
    pub fn end_array(&mut self) {
        self.out.push(b']');
    }

    /// Emit `{`
    pub fn begin_object(&mut self) {
        self.out.push(b'{');
    }

    /// Emit `}`
    pub fn end_object(&mut self) {
        self.out.push(b'}');
    }

    /// Emit the element/pair separator `,`
    pub fn value_separator(&mut self) {
        self.out.push(b',');
    }

    /// Emit the name separator `:`
    pub fn name_separator(&mut self) {
        self.out.push(b':');
    }

    /// Emit a quoted, escaped string
    pub fn write_string(&mut self, value: &str) {
        self.out.push(b'"');
        self.write_escaped(value.as_bytes());
        self.out.push(b'"');
    }

    /// Emit a quoted property name followed by `:`
    pub fn write_property_name(&mut self, name: &str) {
        self.write_string(name);
        self.out.push(b':');
    }

    fn write_escaped(&mut self, bytes: &[u8]) {
        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let escape = match byte {
                b'"' => Some(b'"'),
                b'\\' => Some(b'\\'),
                0x08 => Some(b'b'),
                0x0C => Some(b'f'),
                b'\n' => Some(b'n'),
                b'\r' => Some(b'r'),
                b'\t' => Some(b't'),
                0x00..=0x1F => Some(0),
                _ => None,
            };
            let Some(short) = escape else { continue };
            self.out.write_raw(&bytes[start..i]);
            if short == 0 {
                self.out.write_raw(b"\\u00");
                self.out.push(HEX_DIGITS[(byte >> 4) as usize]);
                self.out.push(HEX_DIGITS[(byte & 0x0F) as usize]);
            } else {
                self.out.push(b'\\');
                self.out.push(short);
            }
            start = i + 1;
        }
        self.out.write_raw(&bytes[start..]);
    }
}
