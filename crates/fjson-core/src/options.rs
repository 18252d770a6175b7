//! Engine configuration consumed by readers, writers and formatters
//!
//! One small `Copy` struct travels inside each reader/writer pair, so the
//! hot path never chases a pointer for a limit check. Named profiles follow
//! the same constructor pattern as the rest of the configuration surface.

/// Default nesting depth limit for both directions
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How enum values appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRepr {
    /// Named constants render as quoted strings; unnamed values fall back
    /// to the bare underlying integer
    #[default]
    Name,
    /// The underlying integer storage is copied through the integer codec
    /// with no numeric reinterpretation
    Number,
}

/// Options controlling one serialize/deserialize operation
#[derive(Debug, Clone, Copy)]
pub struct JsonOptions {
    /// Maximum container nesting depth before the depth guard short-circuits
    pub max_depth: usize,
    /// Enum wire representation
    pub enum_repr: EnumRepr,
    /// Skip absent (`None`) properties when serializing objects
    pub omit_null: bool,
    /// Match object property names ignoring ASCII case.
    ///
    /// Deliberately a standalone flag: it controls property matching and
    /// nothing else.
    pub case_insensitive_properties: bool,
}

impl JsonOptions {
    /// Balanced defaults suitable for most payloads
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            enum_repr: EnumRepr::Name,
            omit_null: false,
            case_insensitive_properties: false,
        }
    }

    /// Shallow nesting limit for untrusted input
    pub fn strict() -> Self {
        Self {
            max_depth: 16,
            ..Self::new()
        }
    }

    /// Deep nesting and case-insensitive property matching for data from
    /// loosely specified producers
    pub fn permissive() -> Self {
        Self {
            max_depth: 256,
            case_insensitive_properties: true,
            ..Self::new()
        }
    }

    /// Replace the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the enum representation
    pub fn with_enum_repr(mut self, repr: EnumRepr) -> Self {
        self.enum_repr = repr;
        self
    }

    /// Enable or disable null-property omission
    pub fn with_omit_null(mut self, omit: bool) -> Self {
        self.omit_null = omit;
        self
    }

    /// Enable or disable case-insensitive property matching
    pub fn with_case_insensitive_properties(mut self, enabled: bool) -> Self {
        self.case_insensitive_properties = enabled;
        self
    }
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self::new()
    }
}
