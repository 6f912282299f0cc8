use std::{
    borrow::Borrow,
    fmt,
    hash::{BuildHasher, Hash},
    io, iter, mem, slice,
};

use log::{debug, trace};

use crate::{
    DefaultHashBuilder,
    error::{Result, TableError},
    table::HashTable,
    utils::{self, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR},
};

/// A single slot of the table
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot<K> {
    /// Never written since the last rehash or `make_empty`
    Empty,
    /// Holds a live key
    Occupied(K),
    /// Held a key that has since been removed (tombstone)
    Deleted,
}

/// Where a probe for a key ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    /// The key is stored at this slot
    Found(usize),
    /// The key is absent and would be stored at this slot
    Vacant(usize),
    /// The key is absent and every slot on its probe sequence holds another key
    Exhausted,
}

/// A hash table of unique keys using open addressing with quadratic probing.
///
/// Slots are probed at `h, h + 1, h + 4, h + 9, ...` modulo the capacity, where `h` is the
/// key's hash reduced to a slot index. The capacity is always prime, so the first
/// `capacity / 2 + 1` probes visit distinct slots; a probe never looks further than that.
///
/// Removal leaves a tombstone behind so that keys displaced past the removed slot stay
/// reachable. Tombstones are reused by later inserts and dropped wholesale when the table
/// grows.
///
/// Note: This implementation is not thread-safe.
#[derive(Debug)]
pub struct OpenAddressingTable<K, S = DefaultHashBuilder> {
    /// The slot array, its length is the capacity
    slots: Vec<Slot<K>>,
    /// Number of occupied slots
    size: usize,
    /// Number of deleted slots
    tombstones: usize,
    /// Load factor above which the table grows
    max_load_factor: f64,
    /// Builds the hasher for per-key hashing
    hash_builder: S,
}

/// Allocates `capacity` empty slots
fn empty_slots<K>(capacity: usize) -> Vec<Slot<K>> {
    iter::repeat_with(|| Slot::Empty).take(capacity).collect()
}

impl<K: Clone, S: Clone> Clone for OpenAddressingTable<K, S> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            size: self.size,
            tombstones: self.tombstones,
            max_load_factor: self.max_load_factor,
            hash_builder: self.hash_builder.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.slots.clone_from(&source.slots);
        self.size = source.size;
        self.tombstones = source.tombstones;
        self.max_load_factor = source.max_load_factor;
        self.hash_builder.clone_from(&source.hash_builder);
    }
}

impl<K, S> Default for OpenAddressingTable<K, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<K> OpenAddressingTable<K, DefaultHashBuilder> {
    /// Creates an empty table with 11 slots and a maximum load factor of 1.0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with `capacity` rounded up to the next prime
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, S> OpenAddressingTable<K, S> {
    /// Creates an empty table with the default capacity which will use `hash_builder` to hash
    /// keys
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty table with `capacity` rounded up to the next prime, using
    /// `hash_builder` to hash keys
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            slots: empty_slots(utils::next_prime(capacity)),
            size: 0,
            tombstones: 0,
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

    /// Returns the number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstones left by removals since the last rehash
    #[must_use]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns the current load factor, `len / capacity`
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        utils::ratio(self.size, self.slots.len())
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

    /// Marks every slot empty, keeping the capacity
    pub fn make_empty(&mut self) {
        self.slots.fill_with(|| Slot::Empty);
        self.size = 0;
        self.tombstones = 0;
    }

    /// Returns an iterator over the keys in slot order
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K> {
        Iter { slots: self.slots.iter(), remaining: self.size }
    }

    /// Writes every occupied slot as `[index] key`, one per line in slot order, or `<empty>`
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
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(key) = slot {
                writeln!(out, "[{index}] {key:?}")?;
            }
        }
        Ok(())
    }
}

impl<K, S> OpenAddressingTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts a key, returning `false` if an equal key is already present.
    ///
    /// If the probe sequence has no free slot left the table grows first. After a successful
    /// insert the table keeps growing until the load factor is back under the maximum.
    pub fn insert(&mut self, key: K) -> bool {
        match self.probe(&key).0 {
            Probe::Found(_) => return false,
            Probe::Vacant(index) => self.occupy(index, key),
            Probe::Exhausted => {
                trace!("no free slot on the probe sequence at capacity {}", self.capacity());
                self.rehash(utils::grown_capacity(self.capacity()));
                self.insert_unique(key);
            }
        }
        self.grow_while_overloaded();
        true
    }

    /// Removes a key, returning the number of keys removed (0 or 1)
    pub fn remove<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Probe::Found(index) = self.probe(key).0 else {
            return 0;
        };
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Slot::Deleted;
                self.size = self.size.saturating_sub(1);
                self.tombstones = self.tombstones.saturating_add(1);
                1
            }
            None => 0,
        }
    }

    /// Returns true if the table holds a key equal to `key`
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        matches!(self.probe(key).0, Probe::Found(_))
    }

    /// Returns the slot where `key` is stored, or else where it would be inserted.
    ///
    /// An absent key goes to the first tombstone on its probe sequence, or failing that to the
    /// empty slot that ended the probe. Returns `None` if every slot on the sequence holds some
    /// other key, in which case an insert has to grow the table first.
    #[must_use]
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.probe(key).0 {
            Probe::Found(index) | Probe::Vacant(index) => Some(index),
            Probe::Exhausted => None,
        }
    }

    /// Returns the number of slots a lookup of `key` examines
    #[must_use]
    pub fn probe_length<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.probe(key).1
    }

    /// Sets the load factor above which the table grows, growing immediately if the current
    /// load factor is over it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidArgument`] unless `0.0 < max_load_factor <= 1.0`; the
    /// table is left unchanged.
    pub fn set_max_load_factor(&mut self, max_load_factor: f64) -> Result<()> {
        if max_load_factor.is_nan() || max_load_factor <= 0.0 || max_load_factor > 1.0 {
            return Err(TableError::InvalidArgument {
                name: "max load factor",
                value: max_load_factor,
            });
        }
        self.max_load_factor = max_load_factor;
        self.grow_while_overloaded();
        Ok(())
    }

    /// Walks the probe sequence of `key`, returning where it ended and how many slots it read
    fn probe<Q>(&self, key: &Q) -> (Probe, usize)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let capacity = self.slots.len();
        let limit = (capacity / 2).saturating_add(1);
        let mut index = utils::slot_index(self.hash_builder.hash_one(key), capacity);
        let mut offset: usize = 1;
        let mut first_tombstone = None;
        let mut probes: usize = 0;

        while probes < limit {
            let Some(slot) = self.slots.get(index) else {
                break;
            };
            probes = probes.saturating_add(1);
            match slot {
                Slot::Empty => {
                    return (Probe::Vacant(first_tombstone.unwrap_or(index)), probes);
                }
                Slot::Occupied(stored) if stored.borrow() == key => {
                    return (Probe::Found(index), probes);
                }
                Slot::Deleted if first_tombstone.is_none() => first_tombstone = Some(index),
                Slot::Deleted | Slot::Occupied(_) => {}
            }
            index = index.saturating_add(offset).checked_rem(capacity).unwrap_or(0);
            offset = offset.saturating_add(2);
        }

        (first_tombstone.map_or(Probe::Exhausted, Probe::Vacant), probes)
    }

    /// Stores `key` at `index`, which must be vacant
    fn occupy(&mut self, index: usize, key: K) {
        if let Some(slot) = self.slots.get_mut(index) {
            if matches!(slot, Slot::Deleted) {
                trace!("reusing tombstone at slot {index}");
                self.tombstones = self.tombstones.saturating_sub(1);
            }
            *slot = Slot::Occupied(key);
            self.size = self.size.saturating_add(1);
        }
    }

    /// Stores a key known to be absent, growing for as long as its probe sequence is full
    fn insert_unique(&mut self, key: K) {
        loop {
            match self.probe(&key).0 {
                Probe::Vacant(index) => {
                    self.occupy(index, key);
                    return;
                }
                Probe::Found(_) => return,
                Probe::Exhausted => self.rehash(utils::grown_capacity(self.capacity())),
            }
        }
    }

    /// Grows until the load factor is at most the maximum
    fn grow_while_overloaded(&mut self) {
        while self.load_factor() > self.max_load_factor {
            self.rehash(utils::grown_capacity(self.capacity()));
        }
    }

    /// Moves every live key into a fresh array of `capacity` slots, dropping all tombstones
    fn rehash(&mut self, capacity: usize) {
        let old_capacity = self.slots.len();
        let old_slots = mem::replace(&mut self.slots, empty_slots(capacity));
        let live = self.size;
        self.size = 0;
        self.tombstones = 0;

        for slot in old_slots {
            if let Slot::Occupied(key) = slot {
                self.insert_unique(key);
            }
        }

        debug!("rehashed {live} keys from {old_capacity} to {} slots", self.slots.len());
    }
}

impl<K, S> HashTable<K> for OpenAddressingTable<K, S>
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
        self.slots.len()
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

impl<K, S> Extend<K> for OpenAddressingTable<K, S>
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

impl<K, S> FromIterator<K> for OpenAddressingTable<K, S>
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

impl<'a, K, S> IntoIterator for &'a OpenAddressingTable<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the keys of an [`OpenAddressingTable`] in slot order
#[derive(Debug, Clone)]
pub struct Iter<'a, K> {
    /// Slots not yet visited
    slots: slice::Iter<'a, Slot<K>>,
    /// Keys not yet yielded
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.slots.find_map(|slot| match slot {
            Slot::Occupied(key) => Some(key),
            Slot::Empty | Slot::Deleted => None,
        })?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
