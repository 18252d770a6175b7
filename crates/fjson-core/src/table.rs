//! Fixed open-addressed lookup tables for static key sets
//!
//! Both tables are sized once from the entry count at a 0.5 target load
//! factor and never resized. Hashes are computed once per key at
//! construction and recomputed identically at lookup; byte keys reject on
//! length before comparing content. Used by the enum codecs (value↔name)
//! and the resolver's built-in hot set.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over a byte sequence
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Finalizer spreading scalar keys across the table
fn mix64(mut value: u64) -> u64 {
    value ^= value >> 33;
    value = value.wrapping_mul(0xff51_afd7_ed55_8ccd);
    value ^= value >> 33;
    value = value.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    value ^ (value >> 33)
}

fn table_capacity(entries: usize) -> usize {
    // target load factor 0.5
    (entries * 2).next_power_of_two().max(4)
}

struct ByteKeyEntry<V> {
    hash: u64,
    key: Box<[u8]>,
    value: V,
}

/// Open-addressed table keyed by byte sequences
pub struct ByteKeyTable<V> {
    slots: Box<[Option<ByteKeyEntry<V>>]>,
    mask: usize,
    len: usize,
}

impl<V> ByteKeyTable<V> {
    /// Build a table from a fixed entry set. Duplicate keys are a
    /// construction error.
    pub fn build<K: AsRef<[u8]>>(entries: impl IntoIterator<Item = (K, V)>) -> Result<Self> {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        let capacity = table_capacity(entries.len());
        let mut slots: Vec<Option<ByteKeyEntry<V>>> = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let mask = capacity - 1;
        let mut len = 0;

        for (key, value) in entries {
            let key = key.as_ref();
            let hash = fnv1a(key);
            let mut index = (hash as usize) & mask;
            loop {
                match &slots[index] {
                    None => {
                        slots[index] = Some(ByteKeyEntry {
                            hash,
                            key: key.into(),
                            value,
                        });
                        len += 1;
                        break;
                    }
                    Some(existing) => {
                        if existing.hash == hash && &*existing.key == key {
                            return Err(Error::invariant(format!(
                                "duplicate table key `{}`",
                                String::from_utf8_lossy(key)
                            )));
                        }
                        index = (index + 1) & mask;
                    }
                }
            }
        }

        Ok(Self {
            slots: slots.into_boxed_slice(),
            mask,
            len,
        })
    }

    /// Build a table keeping the first occurrence of any duplicated key
    pub fn build_first_wins<K: AsRef<[u8]>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        let capacity = table_capacity(entries.len());
        let mut slots: Vec<Option<ByteKeyEntry<V>>> = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let mask = capacity - 1;
        let mut len = 0;

        'next: for (key, value) in entries {
            let key = key.as_ref();
            let hash = fnv1a(key);
            let mut index = (hash as usize) & mask;
            loop {
                match &slots[index] {
                    None => {
                        slots[index] = Some(ByteKeyEntry {
                            hash,
                            key: key.into(),
                            value,
                        });
                        len += 1;
                        continue 'next;
                    }
                    Some(existing) => {
                        if existing.hash == hash && &*existing.key == key {
                            continue 'next;
                        }
                        index = (index + 1) & mask;
                    }
                }
            }
        }

        Self {
            slots: slots.into_boxed_slice(),
            mask,
            len,
        }
    }

    /// Look up a byte-sequence key
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let hash = fnv1a(key);
        let mut index = (hash as usize) & self.mask;
        loop {
            match &self.slots[index] {
                None => return None,
                Some(entry) => {
                    // cheap rejects first: recomputed hash, then length
                    if entry.hash == hash && entry.key.len() == key.len() && &*entry.key == key {
                        return Some(&entry.value);
                    }
                }
            }
            index = (index + 1) & self.mask;
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Key types usable in a [`ScalarKeyTable`]
pub trait ScalarKey: Copy + Eq {
    /// Hash used for slot selection; must be identical at construction and
    /// lookup
    fn table_hash(self) -> u64;
}

macro_rules! scalar_keys {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ScalarKey for $ty {
                fn table_hash(self) -> u64 {
                    mix64(self as u64)
                }
            }
        )*
    };
}

scalar_keys!(u8, u16, u32, u64, i8, i16, i32, i64, usize);

impl ScalarKey for TypeId {
    fn table_hash(self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        mix64(hasher.finish())
    }
}

/// Open-addressed table keyed by scalar values
pub struct ScalarKeyTable<K: ScalarKey, V> {
    slots: Box<[Option<(K, V)>]>,
    mask: usize,
    len: usize,
}

impl<K: ScalarKey, V> ScalarKeyTable<K, V> {
    /// Build a table from a fixed entry set. Duplicate keys are a
    /// construction error.
    pub fn build(entries: impl IntoIterator<Item = (K, V)>) -> Result<Self> {
        Self::build_inner(entries, false)
    }

    /// Build a table keeping the first occurrence of any duplicated key
    /// (flag aliases share an underlying value)
    pub fn build_first_wins(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        match Self::build_inner(entries, true) {
            Ok(table) => table,
            // unreachable: first-wins construction has no error path
            Err(_) => Self {
                slots: Box::new([]),
                mask: 0,
                len: 0,
            },
        }
    }

    fn build_inner(
        entries: impl IntoIterator<Item = (K, V)>,
        first_wins: bool,
    ) -> Result<Self> {
        let entries: Vec<(K, V)> = entries.into_iter().collect();
        let capacity = table_capacity(entries.len());
        let mut slots: Vec<Option<(K, V)>> = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let mask = capacity - 1;
        let mut len = 0;

        'next: for (key, value) in entries {
            let mut index = (key.table_hash() as usize) & mask;
            loop {
                match &slots[index] {
                    None => {
                        slots[index] = Some((key, value));
                        len += 1;
                        continue 'next;
                    }
                    Some((existing, _)) => {
                        if *existing == key {
                            if first_wins {
                                continue 'next;
                            }
                            return Err(Error::invariant("duplicate scalar table key"));
                        }
                        index = (index + 1) & mask;
                    }
                }
            }
        }

        Ok(Self {
            slots: slots.into_boxed_slice(),
            mask,
            len,
        })
    }

    /// Look up a scalar key
    pub fn get(&self, key: K) -> Option<&V> {
        if self.slots.is_empty() {
            return None;
        }
        let mut index = (key.table_hash() as usize) & self.mask;
        loop {
            match &self.slots[index] {
                None => return None,
                Some((existing, value)) => {
                    if *existing == key {
                        return Some(value);
                    }
                }
            }
            index = (index + 1) & self.mask;
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_key_lookup() {
        let table = ByteKeyTable::build([(b"red" as &[u8], 1), (b"green", 2), (b"blue", 3)])
            .expect("distinct keys");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(b"red"), Some(&1));
        assert_eq!(table.get(b"green"), Some(&2));
        assert_eq!(table.get(b"blue"), Some(&3));
        assert_eq!(table.get(b"cyan"), None);
        // length reject before byte compare
        assert_eq!(table.get(b"re"), None);
        assert_eq!(table.get(b"reddish"), None);
    }

    #[test]
    fn test_byte_key_duplicates_rejected() {
        let result = ByteKeyTable::build([(b"x" as &[u8], 1), (b"x", 2)]);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_byte_key_first_wins() {
        let table = ByteKeyTable::build_first_wins([(b"x" as &[u8], 1), (b"x", 2)]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(b"x"), Some(&1));
    }

    #[test]
    fn test_load_factor_target() {
        let entries: Vec<(String, usize)> = (0..33).map(|i| (format!("key{i}"), i)).collect();
        let table = ByteKeyTable::build(entries).expect("distinct keys");
        assert_eq!(table.len(), 33);
        // 33 entries at load 0.5 round up to 128 slots
        assert_eq!(table.slots.len(), 128);
        for i in 0..33 {
            assert_eq!(table.get(format!("key{i}").as_bytes()), Some(&i));
        }
    }

    #[test]
    fn test_scalar_key_lookup() {
        let table =
            ScalarKeyTable::build([(1u64, "one"), (2, "two"), (99, "ninety-nine")]).unwrap();
        assert_eq!(table.get(1), Some(&"one"));
        assert_eq!(table.get(99), Some(&"ninety-nine"));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn test_scalar_key_negative_values() {
        let table = ScalarKeyTable::build([(-1i64, "minus"), (i64::MIN, "min")]).unwrap();
        assert_eq!(table.get(-1), Some(&"minus"));
        assert_eq!(table.get(i64::MIN), Some(&"min"));
        assert_eq!(table.get(0), None);
    }

    #[test]
    fn test_scalar_first_wins_for_aliases() {
        let table = ScalarKeyTable::build_first_wins([(7u8, "first"), (7, "alias")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(7), Some(&"first"));
    }

    #[test]
    fn test_type_id_keys() {
        let table = ScalarKeyTable::build([
            (TypeId::of::<u32>(), "u32"),
            (TypeId::of::<String>(), "String"),
        ])
        .unwrap();
        assert_eq!(table.get(TypeId::of::<u32>()), Some(&"u32"));
        assert_eq!(table.get(TypeId::of::<Vec<u8>>()), None);
    }

    #[test]
    fn test_empty_table() {
        let table: ByteKeyTable<u8> = ByteKeyTable::build(Vec::<(&[u8], u8)>::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.get(b"anything"), None);
    }

    #[test]
    fn test_probe_wraparound() {
        // force collisions by filling half the minimum table
        let entries: Vec<(Vec<u8>, usize)> = (0..8).map(|i| (vec![i as u8], i)).collect();
        let table = ByteKeyTable::build(entries).unwrap();
        for i in 0..8usize {
            assert_eq!(table.get(&[i as u8]), Some(&i));
        }
    }
}
