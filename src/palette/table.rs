//! Ordered pixel-to-color interning table.
//!
//! The table is a skip list stored in an index arena: every node lives in a
//! `Vec` and forward links are indices into it. Lookups and inserts are
//! expected O(log n), and the bottom level always holds every entry in
//! ascending pixel order.

use rand::prelude::*;

/// Maximum number of forward links per node.
pub const MAX_LEVEL: usize = 32;

/// Default seed for the level generator.
///
/// Node levels only affect lookup cost, never iteration order, so a fixed
/// seed keeps runs reproducible without changing any output.
pub const DEFAULT_LEVEL_SEED: u64 = 0x5854_535f_4c56_4c53;

/// An 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in RGB order.
    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// The interned record for one distinct pixel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorEntry {
    /// Raw pixel value from the trace.
    pub pixel: u32,
    /// Assigned color, `None` until the assigner has run.
    pub color: Option<Rgb>,
    /// Position in sorted order at assignment time.
    pub rank: Option<usize>,
}

impl ColorEntry {
    fn unassigned(pixel: u32) -> Self {
        Self {
            pixel,
            color: None,
            rank: None,
        }
    }

    /// Whether the assigner has given this entry its final color.
    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.color.is_some()
    }
}

#[derive(Debug)]
struct Node {
    entry: ColorEntry,
    /// Forward links; `next.len()` is the node's level.
    next: Vec<Option<usize>>,
}

/// Predecessor at each level for an insert; `None` means the head.
type Update = [Option<usize>; MAX_LEVEL];

/// Ordered map from pixel value to [`ColorEntry`].
#[derive(Debug)]
pub struct ColorTable {
    nodes: Vec<Node>,
    head: [Option<usize>; MAX_LEVEL],
    /// Highest level in use by any node.
    level: usize,
    rng: StdRng,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorTable {
    /// Create an empty table using [`DEFAULT_LEVEL_SEED`].
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_LEVEL_SEED)
    }

    /// Create an empty table with a specific level seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            head: [None; MAX_LEVEL],
            level: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of distinct pixel values interned.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the entry for `pixel`, creating an unassigned one if needed.
    pub fn find_or_insert(&mut self, pixel: u32) -> &ColorEntry {
        let index = match self.locate(pixel) {
            Ok(index) => index,
            Err(update) => self.insert_at(pixel, &update),
        };
        &self.nodes[index].entry
    }

    /// Look up `pixel` without inserting.
    pub fn get(&self, pixel: u32) -> Option<&ColorEntry> {
        self.locate(pixel).ok().map(|index| &self.nodes[index].entry)
    }

    /// Assigned color for `pixel`, if it is present and colored.
    #[inline]
    pub fn color_of(&self, pixel: u32) -> Option<Rgb> {
        self.get(pixel).and_then(|entry| entry.color)
    }

    /// Iterate entries in strictly ascending pixel order.
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            table: self,
            cursor: self.head[0],
            remaining: self.nodes.len(),
        }
    }

    /// Visit every entry in ascending pixel order with mutable access.
    ///
    /// The closure receives the zero-based sorted index of each entry.
    pub fn for_each_sorted_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &mut ColorEntry),
    {
        let mut cursor = self.head[0];
        let mut index = 0;
        while let Some(node) = cursor {
            f(index, &mut self.nodes[node].entry);
            cursor = self.nodes[node].next[0];
            index += 1;
        }
    }

    /// Link following `from` at `level`; `None` as `from` is the head.
    #[inline]
    fn link(&self, from: Option<usize>, level: usize) -> Option<usize> {
        match from {
            None => self.head[level],
            Some(node) => self.nodes[node].next[level],
        }
    }

    #[inline]
    fn set_link(&mut self, from: Option<usize>, level: usize, to: Option<usize>) {
        match from {
            None => self.head[level] = to,
            Some(node) => self.nodes[node].next[level] = to,
        }
    }

    /// Find the node holding `pixel`, or the predecessors where it belongs.
    fn locate(&self, pixel: u32) -> Result<usize, Update> {
        let mut update: Update = [None; MAX_LEVEL];
        let mut current = None;

        for level in (0..self.level).rev() {
            while let Some(next) = self.link(current, level) {
                let key = self.nodes[next].entry.pixel;
                if key == pixel {
                    return Ok(next);
                }
                if key > pixel {
                    break;
                }
                current = Some(next);
            }
            update[level] = current;
        }

        Err(update)
    }

    fn insert_at(&mut self, pixel: u32, update: &Update) -> usize {
        let level = self.random_level();
        let index = self.nodes.len();

        // Levels above the current height have the head as predecessor,
        // which is what `update` already holds there.
        let next = (0..level).map(|l| self.link(update[l], l)).collect();
        self.nodes.push(Node {
            entry: ColorEntry::unassigned(pixel),
            next,
        });
        for (l, &pred) in update.iter().enumerate().take(level) {
            self.set_link(pred, l, Some(index));
        }
        self.level = self.level.max(level);

        index
    }

    /// Each bit is set with probability 3/4; the level is one more than the
    /// number of clear low bits.
    fn random_level(&mut self) -> usize {
        let mut bits = self.rng.r#gen::<u32>() | self.rng.r#gen::<u32>();
        let mut level = 1;
        while level < MAX_LEVEL && bits & 1 == 0 {
            bits >>= 1;
            level += 1;
        }
        level
    }
}

/// Iterator over table entries in ascending pixel order.
pub struct Entries<'a> {
    table: &'a ColorTable,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a ColorEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.table;
        let node = &table.nodes[self.cursor?];
        self.cursor = node.next[0];
        self.remaining -= 1;
        Some(&node.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> ExactSizeIterator for Entries<'a> {}

impl<'a> IntoIterator for &'a ColorTable {
    type Item = &'a ColorEntry;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_empty_table() {
        let table = ColorTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert_eq!(table.iter().count(), 0);
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_insert_creates_unassigned_entry() {
        let mut table = ColorTable::new();
        let entry = table.find_or_insert(0x00ff_0000);
        assert_eq!(entry.pixel, 0x00ff_0000);
        assert!(!entry.is_assigned());
        assert_eq!(entry.rank, None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_repeat_lookup_does_not_grow() {
        let mut table = ColorTable::new();
        for _ in 0..1000 {
            table.find_or_insert(7);
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sorted_iteration() {
        let mut table = ColorTable::new();
        for pixel in [50, 3, u32::MAX, 0, 17, 3, 50] {
            table.find_or_insert(pixel);
        }
        let keys: Vec<u32> = table.iter().map(|e| e.pixel).collect();
        assert_eq!(keys, vec![0, 3, 17, 50, u32::MAX]);
        assert_eq!(table.iter().len(), 5);
    }

    #[test]
    fn test_for_each_sorted_mut_indices() {
        let mut table = ColorTable::new();
        for pixel in [30, 10, 20] {
            table.find_or_insert(pixel);
        }
        let mut seen = Vec::new();
        table.for_each_sorted_mut(|i, entry| {
            entry.rank = Some(i);
            seen.push((i, entry.pixel));
        });
        assert_eq!(seen, vec![(0, 10), (1, 20), (2, 30)]);
        assert_eq!(table.get(30).and_then(|e| e.rank), Some(2));
    }

    #[test]
    fn test_seed_does_not_change_order() {
        let pixels: Vec<u32> = (0..500).map(|i| (i * 7919) % 1031).collect();
        let mut a = ColorTable::with_seed(1);
        let mut b = ColorTable::with_seed(2);
        for &p in &pixels {
            a.find_or_insert(p);
            b.find_or_insert(p);
        }
        assert!(a.iter().eq(b.iter()));
    }

    #[test]
    fn test_large_sequential_insert() {
        let mut table = ColorTable::new();
        for pixel in (0..10_000u32).rev() {
            table.find_or_insert(pixel);
        }
        assert_eq!(table.len(), 10_000);
        assert!(table.iter().map(|e| e.pixel).eq(0..10_000));
    }

    proptest! {
        #[test]
        fn len_counts_distinct(pixels in prop::collection::vec(any::<u32>(), 0..400)) {
            let mut table = ColorTable::new();
            for &p in &pixels {
                table.find_or_insert(p);
            }
            let distinct: BTreeSet<u32> = pixels.iter().copied().collect();
            prop_assert_eq!(table.len(), distinct.len());
        }

        #[test]
        fn iteration_is_strictly_ascending_and_repeatable(
            pixels in prop::collection::vec(0u32..64, 0..300),
        ) {
            let mut table = ColorTable::new();
            for &p in &pixels {
                table.find_or_insert(p);
            }
            let first: Vec<u32> = table.iter().map(|e| e.pixel).collect();
            let second: Vec<u32> = table.iter().map(|e| e.pixel).collect();
            prop_assert_eq!(first.len(), table.len());
            prop_assert!(first.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn find_or_insert_is_idempotent(
            pixels in prop::collection::vec(any::<u32>(), 1..200),
        ) {
            let mut table = ColorTable::new();
            for &p in &pixels {
                table.find_or_insert(p);
            }
            let before = table.len();
            for &p in &pixels {
                let entry = table.find_or_insert(p).clone();
                prop_assert_eq!(entry.pixel, p);
                prop_assert_eq!(Some(&entry), table.get(p));
            }
            prop_assert_eq!(table.len(), before);
        }
    }
}
