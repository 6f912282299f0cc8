//! The contract shared by both table strategies

use crate::error::Result;

/// Operations every table strategy supports.
///
/// Both [`OpenAddressingTable`](crate::OpenAddressingTable) and
/// [`SeparateChainingTable`](crate::SeparateChainingTable) implement this trait by forwarding to
/// their inherent methods, so generic code can be written once and run against either layout.
pub trait HashTable<K> {
    /// Inserts `key`, returning `false` without modifying the table if an equal key is present
    fn insert(&mut self, key: K) -> bool;

    /// Removes `key`, returning the number of keys removed (0 or 1)
    fn remove(&mut self, key: &K) -> usize;

    /// Returns true if an equal key is stored in the table
    fn contains(&self, key: &K) -> bool;

    /// Returns the number of live keys
    fn len(&self) -> usize;

    /// Returns true if the table holds no live keys
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots or buckets
    fn capacity(&self) -> usize;

    /// Returns `len / capacity`
    fn load_factor(&self) -> f64 {
        crate::utils::ratio(self.len(), self.capacity())
    }

    /// Returns the load factor above which the table grows
    fn max_load_factor(&self) -> f64;

    /// Sets the growth threshold, growing immediately if the table is now over it
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidArgument`](crate::TableError::InvalidArgument) if the
    /// strategy does not accept `max_load_factor`.
    fn set_max_load_factor(&mut self, max_load_factor: f64) -> Result<()>;

    /// Removes every key, keeping the current capacity
    fn make_empty(&mut self);
}
