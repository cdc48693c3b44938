//! An insertion-ordered multiset.
//!
//! [`Bag`] backs equipped and inventory collections: the same item added
//! twice shows up once with a count of two, and the user-visible order of
//! first addition is preserved across further adds and removes.

/// An order-preserving value-to-count container.
///
/// Values compare by equality, not identity. A value's position is fixed
/// when it is first added; dropping its count below one removes the pair
/// entirely.
///
/// # Examples
///
/// ```rust
/// use gearcalc::Bag;
///
/// let mut bag = Bag::new();
/// bag.add("torch");
/// bag.add("rope");
/// bag.add("torch");
///
/// assert_eq!(bag.len(), 2);
/// assert_eq!(bag.count_of(&"torch"), 2);
/// assert_eq!(bag.get(0), Some(&"torch"));
///
/// bag.remove_n(&"torch", 2);
/// assert_eq!(bag.count_of(&"torch"), 0);
/// assert_eq!(bag.get(0), Some(&"rope"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Bag<T> {
    entries: Vec<(T, u32)>,
}

impl<T: PartialEq> Bag<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The number of distinct values (not the total count).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Position of a value in insertion order.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.entries.iter().position(|(v, _)| v == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// The value at a position in insertion order.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|(v, _)| v)
    }

    /// The count of the value at a position in insertion order.
    pub fn count_at(&self, index: usize) -> u32 {
        self.entries.get(index).map_or(0, |(_, count)| *count)
    }

    /// The count of a value; zero when absent.
    pub fn count_of(&self, value: &T) -> u32 {
        self.index_of(value).map_or(0, |i| self.count_at(i))
    }

    /// Add one of the value.
    pub fn add(&mut self, value: T) {
        self.add_n(value, 1);
    }

    /// Add `amount` of the value. A value already present keeps its
    /// position and gains count; a new value is appended at the end.
    pub fn add_n(&mut self, value: T, amount: u32) {
        match self.index_of(&value) {
            Some(i) => self.entries[i].1 += amount,
            None => self.entries.push((value, amount)),
        }
    }

    /// Remove one of the value. Returns false if the value was absent.
    pub fn remove(&mut self, value: &T) -> bool {
        self.remove_n(value, 1)
    }

    /// Remove `amount` of the value; a count that would drop below one
    /// removes the pair entirely. Returns false if the value was absent.
    pub fn remove_n(&mut self, value: &T, amount: u32) -> bool {
        match self.index_of(value) {
            Some(i) => {
                if self.entries[i].1 > amount {
                    self.entries[i].1 -= amount;
                } else {
                    self.entries.remove(i);
                }
                true
            }
            None => false,
        }
    }

    /// Overwrite the count of a present value; absent values are ignored.
    /// A count of zero removes the pair.
    pub fn set_count(&mut self, value: &T, count: u32) {
        if let Some(i) = self.index_of(value) {
            if count == 0 {
                self.entries.remove(i);
            } else {
                self.entries[i].1 = count;
            }
        }
    }

    /// Iterate `(value, count)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.entries.iter().map(|(v, c)| (v, *c))
    }
}

impl<T: PartialEq> Default for Bag<T> {
    fn default() -> Self {
        Self::new()
    }
}
