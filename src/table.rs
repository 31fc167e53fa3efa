use std::ops::Index;

use crate::utils::MyHash;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

/// Append-only hash-consing table.
///
/// Values are stored in insertion order at indices `1, 2, ...`; index `0` is the
/// sentry that terminates bucket chains. Putting a value equal to a stored one
/// returns the existing index.
#[derive(Debug, Clone)]
pub struct Table<T> {
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Table<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");
        let buckets_size = 1 << bits;
        Self {
            data: Vec::new(),
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        &self.data[index - 1].value
    }

    /// Get the index of the next cell in the bucket chain.
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index - 1].next
    }
    fn set_next(&mut self, index: usize, next: usize) {
        self.data[index - 1].next = next;
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.data.iter().enumerate().map(|(i, e)| (i + 1, &e.value))
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Index of the stored value equal to `value`, if any.
    pub fn find(&self, value: &T) -> Option<usize> {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != 0 {
            if self.value(index) == value {
                return Some(index);
            }
            index = self.next(index);
        }
        None
    }

    /// Put a new value into the table and return its index.
    ///
    /// If an equal value is already stored, its index is returned and `value` is dropped.
    pub fn put(&mut self, value: T) -> usize {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];
        let mut last = 0;

        while index != 0 {
            if &value == self.value(index) {
                // The entry already exists.
                return index;
            }
            last = index;
            index = self.next(index);
        }

        self.data.push(Entry { value, next: 0 });
        let i = self.data.len();
        if last == 0 {
            self.buckets[bucket_index] = i;
        } else {
            self.set_next(last, i);
        }

        if self.data.len() > 2 * self.buckets.len() {
            self.grow();
        }
        i
    }

    /// Double the number of buckets and rebuild the chains.
    fn grow(&mut self) {
        let size = self.buckets.len() * 2;
        self.buckets = vec![0; size];
        self.bitmask = (size - 1) as u64;
        for index in 1..=self.data.len() {
            let b = self.bucket_index(self.value(index));
            let head = self.buckets[b];
            self.set_next(index, head);
            self.buckets[b] = index;
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
    struct Item(i32);

    impl MyHash for Item {
        fn hash(&self) -> u64 {
            self.0.unsigned_abs() as u64
        }
    }

    #[test]
    fn test_put_returns_existing() {
        let mut table = Table::new(2);
        let i = table.put(Item(42));
        assert_eq!(i, 1);
        assert_eq!(table.put(Item(42)), i);
        assert_eq!(table.len(), 1);
        assert_eq!(table[i], Item(42));
    }

    #[test]
    fn test_collisions_are_chained() {
        let mut table = Table::new(2);
        let index1 = table.put(Item(5));
        let index2 = table.put(Item(-5));
        assert_ne!(index1, index2);
        assert_eq!(table[index1], Item(5));
        assert_eq!(table[index2], Item(-5));
        assert_eq!(table.next(index1), index2);
        assert_eq!(table.find(&Item(-5)), Some(index2));
        assert_eq!(table.find(&Item(6)), None);
    }

    #[test]
    fn test_grow_keeps_indices() {
        let mut table = Table::new(1);
        let indices: Vec<usize> = (0..100).map(|i| table.put(Item(i))).collect();
        assert!(table.num_buckets() > 2);
        for (i, &index) in indices.iter().enumerate() {
            assert_eq!(index, i + 1);
            assert_eq!(table.find(&Item(i as i32)), Some(index));
            assert_eq!(table.put(Item(i as i32)), index);
        }
        assert_eq!(table.len(), 100);
    }
}
