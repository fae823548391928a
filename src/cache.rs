//! Direct-mapped operation cache for the BDD manager.
//!
//! Keys are spread over the slots with the [Szudzik pairing function][szudzik-pairing]:
//!
//! ```text
//! (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
//! ```
//!
//! [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf

use std::cell::Cell;

use crate::reference::Ref;

/// Szudzik pairing with wrapping arithmetic: large arguments degrade into an ordinary hash.
fn pair(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Keys that can pick a cache slot.
pub trait SlotHash {
    fn slot_hash(&self) -> u64;
}

struct Entry<K, V> {
    key: K,
    value: V,
}

/// A lossy cache: each key maps to one slot, and a new entry evicts the old one.
///
/// Full keys are stored, so a slot collision is a miss rather than a wrong answer.
pub struct Cache<K, V> {
    data: Vec<Option<Entry<K, V>>>,
    bitmask: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K, V> Cache<K, V> {
    /// Create a new cache of size `2^bits`.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");

        let size = 1 << bits;
        let bitmask = (size - 1) as u64;

        Self {
            data: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Get the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits.get()
    }
    /// Get the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    /// Reset the cache.
    pub fn clear(&mut self) {
        self.data.fill_with(|| None);
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }

    /// Get the cached result.
    pub fn get(&self, key: &K) -> Option<&V>
    where
        K: SlotHash + Eq,
    {
        let index = self.index(key.slot_hash());
        match &self.data[index] {
            Some(entry) if &entry.key == key => {
                self.hits.set(self.hits.get() + 1);
                Some(&entry.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    /// Insert a result into the cache.
    pub fn insert(&mut self, key: K, value: V)
    where
        K: SlotHash,
    {
        let index = self.index(key.slot_hash());
        self.data[index] = Some(Entry { key, value });
    }
}

impl SlotHash for (Ref, Ref, Ref) {
    fn slot_hash(&self) -> u64 {
        let (f, g, h) = self;
        pair(pair(f.as_lit() as u64, g.as_lit() as u64), h.as_lit() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl SlotHash for (u64, u64) {
        fn slot_hash(&self) -> u64 {
            pair(self.0, self.1)
        }
    }

    #[test]
    fn test_pairing() {
        // a\b  0  1  2  3  4
        // ------------------
        // 0    0  1  4  9 16
        // 1    2  3  5 10 17
        // 2    6  7  8 11 18
        // 3   12 13 14 15 19
        // 4   20 21 22 23 24
        assert_eq!(pair(0, 0), 0);
        assert_eq!(pair(0, 1), 1);
        assert_eq!(pair(1, 0), 2);
        assert_eq!(pair(1, 1), 3);
        assert_eq!(pair(0, 2), 4);
        assert_eq!(pair(1, 2), 5);
        assert_eq!(pair(2, 0), 6);
        assert_eq!(pair(2, 2), 8);
        assert_eq!(pair(4, 4), 24);

        // Wraps instead of overflowing.
        let big = u64::MAX - 1;
        let _ = pair(pair(big, big), big);
    }

    #[test]
    fn test_ref_triples() {
        let mut cache = Cache::<(Ref, Ref, Ref), Ref>::new(4);
        let key = (Ref::new(2), Ref::new(-3), Ref::new(1));
        cache.insert(key, Ref::new(5));
        assert_eq!(cache.get(&key), Some(&Ref::new(5)));
        assert_eq!(cache.get(&(Ref::new(2), Ref::new(3), Ref::new(1))), None);
    }

    #[test]
    fn test_cache() {
        let mut cache = Cache::<(u64, u64), i32>::new(3);

        cache.insert((1, 2), 3);
        cache.insert((2, 3), 1);
        cache.insert((1, 3), 2);

        assert_eq!(cache.get(&(1, 2)), Some(&3));
        assert_eq!(cache.get(&(2, 3)), Some(&1));
        assert_eq!(cache.get(&(1, 3)), Some(&2));
        assert_eq!(cache.get(&(2, 1)), None);
        assert_eq!(cache.get(&(3, 1)), None);
        assert_eq!(cache.get(&(2, 2)), None);
        assert_eq!(cache.hits(), 3);
        assert_eq!(cache.misses(), 3);
    }

    #[test]
    fn test_collision_is_a_miss() {
        // Two slots only: (0, 1) and (0, 3) hash to 1 and 9, both landing in slot 1.
        let mut cache = Cache::<(u64, u64), &str>::new(1);
        cache.insert((0, 1), "first");
        cache.insert((0, 3), "second");
        assert_eq!(cache.get(&(0, 1)), None);
        assert_eq!(cache.get(&(0, 3)), Some(&"second"));
    }
}
