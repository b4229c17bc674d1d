//! A `HashMap`/`HashSet` pair hashed with `ahash` instead of `SipHash`.
//!
//! Used throughout the pipeline in place of `std::collections::HashMap` for
//! its lower per-lookup overhead; never used where iteration order matters.
#[cfg(feature = "ahash")]
pub type ARandomState = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
pub type ARandomState = std::collections::hash_map::RandomState;

pub type AHashMap<K, V> = std::collections::HashMap<K, V, ARandomState>;
pub type AHashSet<T> = std::collections::HashSet<T, ARandomState>;
