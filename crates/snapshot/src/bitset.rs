//! Growable bitmap for read/write set indexing.
//!
//! The conflict-graph builder assigns every distinct key a dense integer
//! index and represents each transaction's read and write sets as bitmaps
//! over that index space, so pairwise conflict checks reduce to word-wise
//! intersection tests.

/// A growable set of small integers backed by a word vector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index, growing the backing storage as needed.
    pub fn insert(&mut self, index: usize) {
        let word = index / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (index % 64);
    }

    /// Check if an index is present.
    pub fn contains(&self, index: usize) -> bool {
        let word = index / 64;
        match self.words.get(word) {
            Some(&w) => (w >> (index % 64)) & 1 == 1,
            None => false,
        }
    }

    /// Add every index of `other` to this set.
    pub fn union_with(&mut self, other: &BitSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst |= src;
        }
    }

    /// Check whether any index is present in both sets.
    pub fn intersects(&self, other: &BitSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// Check if no index is present.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterate over the present indices in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            (0..64)
                .filter(move |bit| (word >> bit) & 1 == 1)
                .map(move |bit| wi * 64 + bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = BitSet::new();
        assert!(!set.contains(0));

        set.insert(0);
        set.insert(63);
        set.insert(64);
        set.insert(500);

        assert!(set.contains(0));
        assert!(set.contains(63));
        assert!(set.contains(64));
        assert!(set.contains(500));
        assert!(!set.contains(1));
        assert!(!set.contains(501));
    }

    #[test]
    fn test_intersects() {
        let mut a = BitSet::new();
        let mut b = BitSet::new();
        a.insert(3);
        a.insert(130);
        b.insert(130);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));

        let mut c = BitSet::new();
        c.insert(4);
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&BitSet::new()));
    }

    #[test]
    fn test_union_with_grows() {
        let mut a = BitSet::new();
        a.insert(1);

        let mut b = BitSet::new();
        b.insert(200);
        a.union_with(&b);

        assert!(a.contains(1));
        assert!(a.contains(200));
        assert!(!b.contains(1));
    }

    #[test]
    fn test_ones_ascending() {
        let mut set = BitSet::new();
        for i in [7usize, 0, 64, 63, 128] {
            set.insert(i);
        }
        let ones: Vec<usize> = set.ones().collect();
        assert_eq!(ones, vec![0, 7, 63, 64, 128]);
    }

    #[test]
    fn test_is_empty() {
        let mut set = BitSet::new();
        assert!(set.is_empty());
        set.insert(42);
        assert!(!set.is_empty());
    }
}
