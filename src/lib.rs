//! # Prime Hash
//!
//! Hash tables of unique keys with prime-sized storage.
//!
//! This crate provides two table implementations behind the shared [`HashTable`] trait:
//!
//! - `OpenAddressingTable`: a single slot array probed quadratically, with tombstones for
//!   removed keys
//! - `SeparateChainingTable`: an array of buckets, each an ordered list of keys
//!
//! Both start at 11 slots (or the next prime at or above a requested capacity), report their
//! load factor as `len / capacity`, and grow to the next prime at or above twice their capacity
//! once the load factor goes above the configured maximum.
//!
//! ## Basic Usage
//!
//! ```rust
//! use primehash::OpenAddressingTable;
//!
//! let mut table = OpenAddressingTable::new();
//!
//! // Insert keys, duplicates are rejected
//! assert!(table.insert("apple".to_string()));
//! assert!(!table.insert("apple".to_string()));
//!
//! // Look keys up by any borrowed form
//! assert!(table.contains("apple"));
//!
//! // Remove keys
//! assert_eq!(table.remove("apple"), 1);
//! assert_eq!(table.remove("apple"), 0);
//! ```
//!
//! ## Separate Chaining
//!
//! ```rust
//! use primehash::SeparateChainingTable;
//!
//! let mut table = SeparateChainingTable::new();
//! for key in 0..12 {
//!     table.insert(key);
//! }
//!
//! // 12 keys in 11 buckets is over the default maximum load factor of 1.0
//! assert_eq!(table.bucket_count(), 23);
//! assert!(table.load_factor() <= table.max_load_factor());
//! assert!(table.bucket_size(23).is_err());
//! ```
//!
//! ## Writing Against Either Strategy
//!
//! ```rust
//! use primehash::{HashTable, OpenAddressingTable, SeparateChainingTable};
//!
//! fn fill<T: HashTable<u32>>(table: &mut T) -> usize {
//!     (0..100).filter(|&key| table.insert(key)).count()
//! }
//!
//! assert_eq!(fill(&mut OpenAddressingTable::new()), 100);
//! assert_eq!(fill(&mut SeparateChainingTable::new()), 100);
//! ```

use std::{collections::hash_map::DefaultHasher, hash::BuildHasherDefault};

/// Module defining the errors returned by table operations
mod error;
/// Module implementing the open-addressing table with quadratic probing
mod open_addressing;
/// Module implementing the separate-chaining table
mod separate_chaining;
/// Module defining the contract shared by both tables
mod table;
/// Utility functions for prime sizing
mod utils;

pub use error::{Result, TableError};
pub use open_addressing::OpenAddressingTable;
pub use separate_chaining::SeparateChainingTable;
pub use table::HashTable;
pub use utils::{DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, is_prime, next_prime};

/// Iterator types returned by the tables
pub mod iter {
    pub use crate::open_addressing::Iter as OpenAddressingIter;
    pub use crate::separate_chaining::Iter as SeparateChainingIter;
}

/// The hasher builder both tables use unless given another one.
///
/// It is deterministic: a key hashes to the same value on every run.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;
