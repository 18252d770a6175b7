//! Composable type→formatter resolution with process-wide caching
//!
//! A resolver is an ordered chain of strategies fixed at construction: the
//! built-in hot-set table, explicit registrations, any user strategies, and
//! a terminal refusal. Lookups memoize into a concurrent cache that only
//! ever grows; the mapping is a pure function of the type, so unbounded
//! memoization is safe. First-use synthesis walks the chain under a single
//! mutex; cached reads never take it. Entries are built fully off to the
//! side and published atomically, so a concurrent reader can never observe
//! a half-constructed formatter.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::fmt::{Formatter, JsonFormat, TypedFormatter};
use crate::table::ScalarKeyTable;

/// One strategy in a resolver chain
pub trait FormatterResolver: Send + Sync + 'static {
    /// Diagnostic name of the strategy
    fn name(&self) -> &'static str;

    /// Produce a formatter for the type, or decline
    fn resolve(&self, type_id: TypeId) -> Option<Arc<dyn Formatter>>;
}

fn entry<T: JsonFormat + 'static>() -> (TypeId, Arc<dyn Formatter>) {
    (TypeId::of::<T>(), Arc::new(TypedFormatter::<T>::new()))
}

macro_rules! builtin_entries {
    ($($ty:ty),* $(,)?) => {
        vec![$(entry::<$ty>(),)* $(entry::<Option<$ty>>(),)*]
    };
}

/// Fixed hot set resolved through a precomputed open-addressed table,
/// bypassing the chain walk and the synthesis lock entirely
pub struct BuiltinResolver {
    table: ScalarKeyTable<TypeId, Arc<dyn Formatter>>,
}

impl BuiltinResolver {
    fn new() -> Self {
        // primitives, their nullable forms, strings, span-like buffers,
        // primitive lists and the date/time family
        let mut entries = builtin_entries![
            bool,
            u8,
            u16,
            u32,
            u64,
            u128,
            i8,
            i16,
            i32,
            i64,
            i128,
            f32,
            f64,
            char,
            String,
            bytes::Bytes,
            DateTime<Utc>,
            DateTime<FixedOffset>,
            DateTime<Local>,
            NaiveDateTime,
            NaiveDate,
            NaiveTime,
            TimeDelta,
        ];
        entries.push(entry::<()>());
        entries.extend([
            entry::<Vec<bool>>(),
            entry::<Vec<u8>>(),
            entry::<Vec<u16>>(),
            entry::<Vec<u32>>(),
            entry::<Vec<u64>>(),
            entry::<Vec<i8>>(),
            entry::<Vec<i16>>(),
            entry::<Vec<i32>>(),
            entry::<Vec<i64>>(),
            entry::<Vec<u128>>(),
            entry::<Vec<i128>>(),
            entry::<Vec<f32>>(),
            entry::<Vec<f64>>(),
            entry::<Vec<String>>(),
        ]);
        let table = match ScalarKeyTable::build(entries) {
            Ok(table) => table,
            // TypeId keys are distinct by construction
            Err(_) => ScalarKeyTable::build_first_wins(Vec::new()),
        };
        Self { table }
    }

    /// Number of types in the hot set
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// The hot set is never empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl FormatterResolver for BuiltinResolver {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn resolve(&self, type_id: TypeId) -> Option<Arc<dyn Formatter>> {
        self.table.get(type_id).cloned()
    }
}

/// Explicit registrations, frozen when the composite resolver is built
pub struct RegistryResolver {
    entries: HashMap<TypeId, Arc<dyn Formatter>>,
}

impl FormatterResolver for RegistryResolver {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn resolve(&self, type_id: TypeId) -> Option<Arc<dyn Formatter>> {
        self.entries.get(&type_id).cloned()
    }
}

/// Terminal strategy: always declines, so misses surface as
/// [`Error::UnsupportedType`]
pub struct FailResolver;

impl FormatterResolver for FailResolver {
    fn name(&self) -> &'static str {
        "fail"
    }

    fn resolve(&self, _type_id: TypeId) -> Option<Arc<dyn Formatter>> {
        None
    }
}

/// Builder for a composite [`Resolver`]; composition is immutable once
/// built
#[derive(Default)]
pub struct ResolverBuilder {
    registered: Vec<(TypeId, Arc<dyn Formatter>)>,
    strategies: Vec<Arc<dyn FormatterResolver>>,
}

impl ResolverBuilder {
    /// Start from the built-in hot set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statically known type
    pub fn register<T: JsonFormat + 'static>(mut self) -> Self {
        self.registered
            .push((TypeId::of::<T>(), Arc::new(TypedFormatter::<T>::new())));
        self
    }

    /// Register a hand-built formatter for a type id
    pub fn register_formatter(mut self, type_id: TypeId, formatter: Arc<dyn Formatter>) -> Self {
        self.registered.push((type_id, formatter));
        self
    }

    /// Append a custom strategy after the built-ins and registrations
    pub fn push_strategy(mut self, strategy: Arc<dyn FormatterResolver>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Freeze the composition
    pub fn build(self) -> Resolver {
        let mut chain: Vec<Arc<dyn FormatterResolver>> = Vec::with_capacity(
            // builtin + registry + user strategies + terminal refusal
            self.strategies.len() + 3,
        );
        chain.push(Arc::new(BuiltinResolver::new()));
        if !self.registered.is_empty() {
            chain.push(Arc::new(RegistryResolver {
                entries: self.registered.into_iter().collect(),
            }));
        }
        chain.extend(self.strategies);
        chain.push(Arc::new(FailResolver));
        Resolver {
            chain,
            cache: DashMap::new(),
            synthesis: Mutex::new(()),
        }
    }
}

/// Composite resolver: ordered strategy chain plus a monotonic
/// type→formatter cache
pub struct Resolver {
    chain: Vec<Arc<dyn FormatterResolver>>,
    cache: DashMap<TypeId, Arc<dyn Formatter>>,
    synthesis: Mutex<()>,
}

impl Resolver {
    /// Formatter for a runtime type id.
    ///
    /// Cached reads are lock-free. A miss walks the chain under the
    /// synthesis mutex; insertion is idempotent, so racers that slip past
    /// the lock hand-off may build duplicate equivalent entries and either
    /// copy may win.
    pub fn formatter(&self, type_id: TypeId, type_name: &'static str) -> Result<Arc<dyn Formatter>> {
        if let Some(hit) = self.cache.get(&type_id) {
            return Ok(Arc::clone(&hit));
        }
        let _synthesis = self.synthesis.lock();
        if let Some(hit) = self.cache.get(&type_id) {
            return Ok(Arc::clone(&hit));
        }
        for strategy in &self.chain {
            let Some(built) = strategy.resolve(type_id) else {
                continue;
            };
            tracing::debug!(
                strategy = strategy.name(),
                type_name,
                "formatter resolved"
            );
            let published = self.cache.entry(type_id).or_insert(built);
            return Ok(Arc::clone(&published));
        }
        tracing::debug!(type_name, "no formatter strategy matched");
        Err(Error::unsupported(type_name))
    }

    /// Formatter for a statically known type; synthesizes and memoizes the
    /// bridge on first use
    pub fn formatter_of<T: JsonFormat + 'static>(&self) -> Arc<dyn Formatter> {
        let type_id = TypeId::of::<T>();
        if let Some(hit) = self.cache.get(&type_id) {
            return Arc::clone(&hit);
        }
        let built: Arc<dyn Formatter> = Arc::new(TypedFormatter::<T>::new());
        let published = self.cache.entry(type_id).or_insert(built);
        Arc::clone(&published)
    }

    /// Number of memoized types
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Process-wide resolver used by the typeless entry points
pub fn global_resolver() -> &'static Resolver {
    static GLOBAL_RESOLVER: Lazy<Resolver> = Lazy::new(|| ResolverBuilder::new().build());
    &GLOBAL_RESOLVER
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::JsonOptions;
    use crate::reader::JsonReader;
    use crate::writer::{ByteWriter, JsonWriter};

    #[test]
    fn test_builtin_hot_set_size() {
        let builtin = BuiltinResolver::new();
        assert!(builtin.len() >= 60, "hot set has {} entries", builtin.len());
        assert!(!builtin.is_empty());
    }

    #[test]
    fn test_builtin_resolution() {
        let resolver = ResolverBuilder::new().build();
        let formatter = resolver
            .formatter(TypeId::of::<i32>(), "i32")
            .expect("builtin type");
        let mut reader = JsonReader::new(b"-5");
        let value = formatter.deserialize_typeless(&mut reader).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&-5));
    }

    #[test]
    fn test_unsupported_type_fails() {
        struct Opaque;
        let resolver = ResolverBuilder::new().build();
        let err = resolver
            .formatter(TypeId::of::<Opaque>(), "Opaque")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { type_name: "Opaque" }));
    }

    #[test]
    fn test_registration_extends_the_chain() {
        #[derive(Debug, PartialEq)]
        struct Meters(f64);

        impl JsonFormat for Meters {
            fn serialize(&self, writer: &mut JsonWriter<'_>) -> crate::Result<()> {
                writer.write_f64(self.0);
                Ok(())
            }

            fn deserialize(reader: &mut JsonReader<'_>) -> crate::Result<Self> {
                Ok(Meters(reader.read_f64()?))
            }
        }

        let resolver = ResolverBuilder::new().register::<Meters>().build();
        let formatter = resolver
            .formatter(TypeId::of::<Meters>(), "Meters")
            .expect("registered type");

        let mut out = ByteWriter::new();
        let mut writer = JsonWriter::new(&mut out, JsonOptions::default());
        formatter
            .serialize_typeless(&mut writer, &Meters(1.5))
            .unwrap();
        assert_eq!(out.as_slice(), b"1.5");
    }

    #[test]
    fn test_cache_is_monotonic() {
        let resolver = ResolverBuilder::new().build();
        assert_eq!(resolver.cached_len(), 0);
        resolver.formatter(TypeId::of::<bool>(), "bool").unwrap();
        resolver.formatter(TypeId::of::<bool>(), "bool").unwrap();
        assert_eq!(resolver.cached_len(), 1);
        resolver.formatter_of::<String>();
        assert_eq!(resolver.cached_len(), 2);
    }

    #[test]
    fn test_formatter_of_synthesizes_uncached_types() {
        let resolver = ResolverBuilder::new().build();
        let formatter = resolver.formatter_of::<Vec<Vec<u32>>>();
        let mut reader = JsonReader::new(b"[[1],[2,3]]");
        let value = formatter.deserialize_typeless(&mut reader).unwrap();
        assert_eq!(
            value.downcast_ref::<Vec<Vec<u32>>>(),
            Some(&vec![vec![1], vec![2, 3]])
        );
    }

    #[test]
    fn test_global_resolver_is_shared() {
        let first = global_resolver().formatter_of::<u64>();
        let second = global_resolver().formatter(TypeId::of::<u64>(), "u64").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
