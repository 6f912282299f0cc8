use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    io, iter, mem, slice,
};

use log::debug;

use crate::{
    DefaultHashBuilder,
    error::{Result, TableError},
    table::HashTable,
    utils::{self, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR},
};

/// A hash table of unique keys using separate chaining.
///
/// Each key lives in bucket `hash(key) mod bucket_count`, and a bucket keeps its keys in
/// insertion order. The bucket count is always prime. When the load factor (keys per bucket)
/// goes above the maximum, the bucket count grows to the next prime at or above twice its size
/// and every key is moved to its new bucket.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug)]
pub struct SeparateChainingTable<K, S = DefaultHashBuilder> {
    /// The buckets, each holding the keys that hash to its index
    buckets: Vec<Vec<K>>,
    /// Number of keys across all buckets
    size: usize,
    /// Load factor above which the table grows
    max_load_factor: f64,
    /// Builds the hasher for per-key hashing
    hash_builder: S,
}

/// Allocates `count` empty buckets
fn empty_buckets<K>(count: usize) -> Vec<Vec<K>> {
    iter::repeat_with(Vec::new).take(count).collect()
}

impl<K: Clone, S: Clone> Clone for SeparateChainingTable<K, S> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            size: self.size,
            max_load_factor: self.max_load_factor,
            hash_builder: self.hash_builder.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.buckets.clone_from(&source.buckets);
        self.size = source.size;
        self.max_load_factor = source.max_load_factor;
        self.hash_builder.clone_from(&source.hash_builder);
    }
}

impl<K, S> Default for SeparateChainingTable<K, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<K> SeparateChainingTable<K, DefaultHashBuilder> {
    /// Creates an empty table with 11 buckets and a maximum load factor of 1.0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with `buckets` rounded up to the next prime
    #[must_use]
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_and_hasher(buckets, DefaultHashBuilder::default())
    }
}

impl<K, S> SeparateChainingTable<K, S> {
    /// Creates an empty table with the default bucket count which will use `hash_builder` to
    /// hash keys
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty table with `buckets` rounded up to the next prime, using
    /// `hash_builder` to hash keys
    pub fn with_capacity_and_hasher(buckets: usize, hash_builder: S) -> Self {
        Self {
            buckets: empty_buckets(utils::next_prime(buckets)),
            size: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hash_builder,
        }
    }

    /// Returns the number of keys in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the table holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of buckets
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of keys in bucket `n`
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfRange`] if `n >= bucket_count()`.
    pub fn bucket_size(&self, n: usize) -> Result<usize> {
        self.buckets
            .get(n)
            .map(Vec::len)
            .ok_or(TableError::OutOfRange { index: n, bucket_count: self.buckets.len() })
    }

    /// Returns the current load factor, `len / bucket_count`
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        utils::ratio(self.size, self.buckets.len())
    }

    /// Returns the load factor above which the table grows
    #[must_use]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Returns a reference to the table's `BuildHasher`
    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Empties every bucket, keeping the bucket count
    pub fn make_empty(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.size = 0;
    }

    /// Returns an iterator over the keys, bucket by bucket
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter { buckets: self.buckets.iter(), keys: slice::Iter::default(), remaining: self.size }
    }

    /// Writes every non-empty bucket as `[index] key key ...`, one per line in bucket order,
    /// or `<empty>`
    ///
    /// # Errors
    ///
    /// Returns any error raised by `out`.
    pub fn print_table<W: io::Write>(&self, out: &mut W) -> io::Result<()>
    where
        K: fmt::Debug,
    {
        if self.is_empty() {
            return writeln!(out, "<empty>");
        }
        for (index, bucket) in self.buckets.iter().enumerate().filter(|(_, b)| !b.is_empty()) {
            write!(out, "[{index}]")?;
            for key in bucket {
                write!(out, " {key:?}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl<K, S> SeparateChainingTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Returns the bucket `key` is stored in, or would be stored in
    #[must_use]
    pub fn bucket<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        utils::slot_index(self.hash_builder.hash_one(key), self.buckets.len())
    }

    /// Inserts a key, returning `false` if an equal key is already present.
    ///
    /// After a successful insert the table grows until the load factor is back under the
    /// maximum.
    pub fn insert(&mut self, key: K) -> bool {
        let index = self.bucket(&key);
        let Some(bucket) = self.buckets.get_mut(index) else {
            return false;
        };
        if bucket.contains(&key) {
            return false;
        }
        bucket.push(key);
        self.size = self.size.saturating_add(1);
        self.grow_while_overloaded();
        true
    }

    /// Removes a key, returning the number of keys removed (0 or 1)
    pub fn remove<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket(key);
        let Some(bucket) = self.buckets.get_mut(index) else {
            return 0;
        };
        let Some(position) = bucket.iter().position(|stored| stored.borrow() == key) else {
            return 0;
        };
        bucket.remove(position);
        self.size = self.size.saturating_sub(1);
        1
    }

    /// Returns true if the table holds a key equal to `key`
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .get(self.bucket(key))
            .is_some_and(|bucket| bucket.iter().any(|stored| stored.borrow() == key))
    }

    /// Returns the number of keys a lookup of `key` compares against
    #[must_use]
    pub fn probe_length<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.get(self.bucket(key)).map_or(0, |bucket| {
            bucket
                .iter()
                .position(|stored| stored.borrow() == key)
                .map_or(bucket.len(), |position| position.saturating_add(1))
        })
    }

    /// Sets the load factor above which the table grows, growing immediately if the current
    /// load factor is over it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidArgument`] unless `max_load_factor` is positive and
    /// finite; the table is left unchanged.
    pub fn set_max_load_factor(&mut self, max_load_factor: f64) -> Result<()> {
        if !max_load_factor.is_finite() || max_load_factor <= 0.0 {
            return Err(TableError::InvalidArgument {
                name: "max load factor",
                value: max_load_factor,
            });
        }
        self.max_load_factor = max_load_factor;
        self.grow_while_overloaded();
        Ok(())
    }

    /// Redistributes the keys over `next_prime(count)` buckets, or over as many as the
    /// maximum load factor needs if that is more.
    ///
    /// This can shrink the table as well as grow it.
    pub fn rehash(&mut self, count: usize) {
        let target = utils::next_prime(count.max(self.min_bucket_count()));
        if target != self.buckets.len() {
            self.redistribute(target);
        }
        self.grow_while_overloaded();
    }

    /// The fewest buckets that hold the current keys without exceeding the maximum load factor
    #[allow(
        clippy::arithmetic_side_effects,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn min_bucket_count(&self) -> usize {
        (self.size as f64 / self.max_load_factor).ceil() as usize
    }

    /// Grows until the load factor is at most the maximum
    fn grow_while_overloaded(&mut self) {
        while self.load_factor() > self.max_load_factor {
            self.redistribute(utils::grown_capacity(self.buckets.len()));
        }
    }

    /// Moves every key into a fresh array of `count` buckets, keeping bucket order
    fn redistribute(&mut self, count: usize) {
        let old_count = self.buckets.len();
        let old_buckets = mem::replace(&mut self.buckets, empty_buckets(count));

        for key in old_buckets.into_iter().flatten() {
            let index = self.bucket(&key);
            if let Some(bucket) = self.buckets.get_mut(index) {
                bucket.push(key);
            }
        }

        debug!("rehashed {} keys from {old_count} to {count} buckets", self.size);
    }
}

impl<K, S> HashTable<K> for SeparateChainingTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn insert(&mut self, key: K) -> bool {
        Self::insert(self, key)
    }

    fn remove(&mut self, key: &K) -> usize {
        Self::remove(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        Self::contains(self, key)
    }

    fn len(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    fn set_max_load_factor(&mut self, max_load_factor: f64) -> Result<()> {
        Self::set_max_load_factor(self, max_load_factor)
    }

    fn make_empty(&mut self) {
        Self::make_empty(self);
    }
}

impl<K, S> Extend<K> for SeparateChainingTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, S> FromIterator<K> for SeparateChainingTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<'a, K, S> IntoIterator for &'a SeparateChainingTable<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the keys of a [`SeparateChainingTable`], bucket by bucket
#[derive(Debug, Clone)]
pub struct Iter<'a, K> {
    /// Buckets not yet started
    buckets: slice::Iter<'a, Vec<K>>,
    /// Rest of the current bucket
    keys: slice::Iter<'a, K>,
    /// Keys not yet yielded
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.keys.next() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some(key);
            }
            self.keys = self.buckets.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_hashers::{Colliding, Identity};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn printed<K: fmt::Debug, S>(table: &SeparateChainingTable<K, S>) -> String {
        let mut out = Vec::new();
        table.print_table(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_insert_and_contains() {
        let mut table = SeparateChainingTable::new();
        assert!(table.insert("key1".to_string()));
        assert!(table.insert("key2".to_string()));
        assert!(table.insert("key3".to_string()));

        assert!(table.contains("key1"));
        assert!(table.contains("key2"));
        assert!(table.contains("key3"));
        assert!(!table.contains("key4"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_duplicate_insert() {
        let mut table = SeparateChainingTable::new();
        assert!(table.insert("Closer to the Heart"));
        assert!(!table.insert("Closer to the Heart"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_keeps_bucket_order() {
        let mut table = SeparateChainingTable::<&str, _>::with_hasher(Colliding);
        table.insert("a");
        table.insert("b");
        table.insert("c");
        assert_eq!(table.bucket_size(0), Ok(3));

        assert_eq!(table.remove(&"missing"), 0);
        assert_eq!(table.remove(&"b"), 1);
        assert_eq!(table.remove(&"b"), 0);
        assert_eq!(table.len(), 2);
        assert!(!table.contains(&"b"));

        let keys: Vec<&str> = table.iter().copied().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_growth_from_default_bucket_count() {
        let mut table = SeparateChainingTable::new();
        assert_eq!(table.bucket_count(), 11);

        for key in 0..11_u64 {
            assert!(table.insert(key));
        }
        assert_eq!(table.bucket_count(), 11);

        assert!(table.insert(11));
        assert_eq!(table.bucket_count(), 23);
        assert_eq!(table.len(), 12);

        for key in 0..12_u64 {
            assert!(table.contains(&key), "key {key} lost in rehash");
            let expected = table.hasher().hash_one(key) % 23;
            assert_eq!(u64::try_from(table.bucket(&key)).unwrap(), expected);
        }
    }

    #[test]
    fn test_bucket_size() {
        let mut table = SeparateChainingTable::<u64, _>::with_hasher(Identity);
        table.insert(1);
        table.insert(12);
        table.insert(5);

        assert_eq!(table.bucket_size(1), Ok(2));
        assert_eq!(table.bucket_size(5), Ok(1));
        assert_eq!(table.bucket_size(0), Ok(0));
        assert_eq!(
            table.bucket_size(11),
            Err(TableError::OutOfRange { index: 11, bucket_count: 11 })
        );
        assert_eq!(table.bucket(&23), 1);

        let total: usize =
            (0..table.bucket_count()).filter_map(|n| table.bucket_size(n).ok()).sum();
        assert_eq!(total, table.len());
    }

    #[test]
    fn test_set_max_load_factor() {
        let mut table = SeparateChainingTable::new();
        for key in 0..8 {
            table.insert(key);
        }

        for invalid in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                table.set_max_load_factor(invalid),
                Err(TableError::InvalidArgument { .. })
            ));
        }
        assert!((table.max_load_factor() - 1.0).abs() < f64::EPSILON);
        assert_eq!(table.bucket_count(), 11);

        table.set_max_load_factor(0.5).unwrap();
        assert_eq!(table.bucket_count(), 23);
        assert!((0..8).all(|key| table.contains(&key)));
    }

    #[test]
    fn test_max_load_factor_above_one() {
        let mut table = SeparateChainingTable::new();
        table.set_max_load_factor(4.0).unwrap();
        for key in 0..44 {
            table.insert(key);
        }
        assert_eq!(table.bucket_count(), 11);
        assert!((table.load_factor() - 4.0).abs() < f64::EPSILON);

        table.insert(44);
        assert_eq!(table.bucket_count(), 23);
    }

    #[test]
    fn test_load_factor_stays_under_max() {
        let mut table = SeparateChainingTable::new();
        table.set_max_load_factor(0.75).unwrap();
        for key in 0..300 {
            table.insert(key);
            assert!(table.load_factor() <= table.max_load_factor());
            assert!(utils::is_prime(table.bucket_count()));
        }
        assert_eq!(table.len(), 300);
    }

    #[test]
    fn test_rehash() {
        let mut table = SeparateChainingTable::new();
        for key in 0..12 {
            table.insert(key);
        }

        table.rehash(100);
        assert_eq!(table.bucket_count(), 101);
        assert!((0..12).all(|key| table.contains(&key)));

        // Never below what the maximum load factor allows
        table.rehash(1);
        assert_eq!(table.bucket_count(), 13);
        assert_eq!(table.len(), 12);
        assert!((0..12).all(|key| table.contains(&key)));
    }

    #[test]
    fn test_make_empty() {
        let mut table = SeparateChainingTable::with_capacity(30);
        for key in 0..10 {
            table.insert(key);
        }
        table.make_empty();

        assert!(table.is_empty());
        assert_eq!(table.bucket_count(), 31);
        assert!(!table.contains(&1));
        assert!((0..31).all(|n| table.bucket_size(n) == Ok(0)));
    }

    #[test]
    fn test_clone_is_deep() {
        let mut table = SeparateChainingTable::new();
        table.insert("key1".to_string());
        let copy = table.clone();

        table.insert("key2".to_string());
        table.remove("key1");

        assert!(copy.contains("key1"));
        assert!(!copy.contains("key2"));
        assert_eq!(copy.len(), 1);

        let mut target = SeparateChainingTable::with_capacity(97);
        target.insert("other".to_string());
        target.clone_from(&table);
        assert_eq!(target.bucket_count(), 11);
        assert!(target.contains("key2"));
        assert!(!target.contains("other"));
    }

    #[test]
    fn test_probe_length() {
        let mut table = SeparateChainingTable::<&str, _>::with_hasher(Colliding);
        assert_eq!(table.probe_length(&"a"), 0);
        table.insert("a");
        table.insert("b");
        table.insert("c");
        assert_eq!(table.probe_length(&"a"), 1);
        assert_eq!(table.probe_length(&"c"), 3);
        assert_eq!(table.probe_length(&"d"), 3);
    }

    #[test]
    fn test_print_table() {
        let mut table = SeparateChainingTable::<u64, _>::with_hasher(Identity);
        assert_eq!(printed(&table), "<empty>\n");

        table.insert(1);
        table.insert(3);
        table.insert(12);
        assert_eq!(printed(&table), "[1] 1 12\n[3] 3\n");
    }

    #[test]
    fn test_iter() {
        let table: SeparateChainingTable<u64, Identity> = [14, 3, 2].into_iter().collect();
        let keys: Vec<u64> = table.iter().copied().collect();
        assert_eq!(keys, vec![2, 14, 3]);
        assert_eq!(table.iter().len(), 3);
        assert_eq!((&table).into_iter().count(), 3);
    }

    proptest! {
        #[test]
        fn inserted_keys_are_found(keys in proptest::collection::hash_set(any::<u32>(), 0..300)) {
            let mut table = SeparateChainingTable::new();
            for &key in &keys {
                prop_assert!(table.insert(key));
            }
            prop_assert_eq!(table.len(), keys.len());
            for key in &keys {
                prop_assert!(table.contains(key));
            }
            for key in (0..50_u32).filter(|key| !keys.contains(key)) {
                prop_assert!(!table.contains(&key));
            }
        }

        #[test]
        fn behaves_like_std_hash_set(
            max_load_factor in 0.1_f64..4.0,
            ops in proptest::collection::vec((any::<bool>(), 0_u64..64), 0..400)
        ) {
            let mut table = SeparateChainingTable::<u64, _>::with_hasher(Identity);
            table.set_max_load_factor(max_load_factor).unwrap();
            let mut model = HashSet::new();
            for (insert, key) in ops {
                if insert {
                    prop_assert_eq!(table.insert(key), model.insert(key));
                    prop_assert!(table.load_factor() <= table.max_load_factor());
                } else {
                    prop_assert_eq!(table.remove(&key), usize::from(model.remove(&key)));
                }
                prop_assert_eq!(table.len(), model.len());
            }
            for key in 0..64 {
                prop_assert_eq!(table.contains(&key), model.contains(&key));
            }
            for &key in &model {
                let expected = usize::try_from(key).unwrap() % table.bucket_count();
                prop_assert_eq!(table.bucket(&key), expected);
            }
        }
    }
}
