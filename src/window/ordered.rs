use std::cmp::Ordering;

use crate::error::ScanError;
use crate::window::BoundedFifoBuffer;

/// Plain function comparator; any `Fn(&T, &T) -> Ordering` works as well.
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Smallest value first.
pub fn ascending(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

/// Largest value first.
pub fn descending(a: &f64, b: &f64) -> Ordering {
    b.total_cmp(a)
}

#[derive(Debug, Clone)]
struct Entry<T> {
    seq: u64,
    value: T,
}

/// Sliding window that keeps its live values sorted by `cmp`.
///
/// Eviction follows insertion order: once `capacity` values are live, each
/// `add` drops the oldest one, whatever its rank. Every entry carries its
/// insertion sequence number and the sorted vector is ordered by
/// `(cmp(value), seq)`, so the evicted entry is located by identity even when
/// several live values compare equal.
///
/// `first()` is O(1). `add` is O(log N) to locate and O(N) to shift, which is
/// fine for the window sizes used here (days to weeks of bars).
#[derive(Debug, Clone)]
pub struct OrderedWindowCache<T, C = Comparator<T>> {
    fifo: BoundedFifoBuffer<Entry<T>>,
    sorted: Vec<Entry<T>>,
    cmp: C,
    next_seq: u64,
}

impl<T, C> OrderedWindowCache<T, C>
where
    T: Clone,
    C: Fn(&T, &T) -> Ordering,
{
    pub fn new(capacity: usize, cmp: C) -> Result<Self, ScanError> {
        let fifo = BoundedFifoBuffer::new(capacity)?;
        Ok(Self {
            fifo,
            sorted: Vec::with_capacity(capacity),
            cmp,
            next_seq: 0,
        })
    }

    /// Add `value` and return the value evicted to make room for it.
    pub fn add(&mut self, value: T) -> Option<T> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let evicted = self.fifo.enqueue(Entry {
            seq,
            value: value.clone(),
        });

        if let Some(old) = &evicted {
            self.remove_entry(old);
        }

        let cmp = &self.cmp;
        let idx = self
            .sorted
            .partition_point(|e| entry_order(cmp, e, &value, seq) == Ordering::Less);
        self.sorted.insert(idx, Entry { seq, value });

        evicted.map(|e| e.value)
    }

    fn remove_entry(&mut self, old: &Entry<T>) {
        let cmp = &self.cmp;
        let found = self
            .sorted
            .binary_search_by(|e| entry_order(cmp, e, &old.value, old.seq))
            .ok()
            // A comparator that is not a total order can defeat the binary
            // search; the sequence number still identifies the entry.
            .or_else(|| self.sorted.iter().position(|e| e.seq == old.seq));

        if let Some(idx) = found {
            self.sorted.remove(idx);
        }
    }

    /// The extreme live value under `cmp`, or `None` before the first `add`.
    pub fn first(&self) -> Option<&T> {
        self.sorted.first().map(|e| &e.value)
    }

    /// Live values in `cmp` order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &T> {
        self.sorted.iter().map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.fifo.capacity()
    }
}

fn entry_order<T, C>(cmp: &C, entry: &Entry<T>, value: &T, seq: u64) -> Ordering
where
    C: Fn(&T, &T) -> Ordering,
{
    cmp(&entry.value, value).then(entry.seq.cmp(&seq))
}
