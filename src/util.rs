//! Support functions that don't belong anywhere else.

use fnv::FnvHasher;
use std::collections;
use std::hash::BuildHasherDefault;

/// Type alias for hashmaps to allow swapping out the implementation.
///
/// The FNV hasher is seeded identically on every run, so iteration order is a
/// pure function of the inserted keys and verification stays deterministic.
pub(crate) type HashMap<K, V> = collections::HashMap<K, V, BuildHasherDefault<FnvHasher>>;
/// Type alias for hashsets to allow swapping out the implementation.
pub(crate) type HashSet<K> = collections::HashSet<K, BuildHasherDefault<FnvHasher>>;
