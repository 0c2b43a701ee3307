use crate::error::ScanError;

/// Fixed-capacity ring of the last `capacity` inserted values.
///
/// Slots start empty. Every `enqueue` overwrites the slot under the write
/// cursor and hands back its previous occupant, so once the buffer is full the
/// k-th insertion returns the value inserted at step `k - capacity`.
#[derive(Debug, Clone)]
pub struct BoundedFifoBuffer<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
    len: usize,
}

impl<T> BoundedFifoBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, ScanError> {
        if capacity == 0 {
            return Err(ScanError::InvalidCapacity);
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            cursor: 0,
            len: 0,
        })
    }

    /// Insert `item` and return the value it displaced (`None` while warming up).
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        let replaced = self.slots[self.cursor].replace(item);
        self.cursor = (self.cursor + 1) % self.slots.len();
        if replaced.is_none() {
            self.len += 1;
        }
        replaced
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live slots, i.e. `min(insertions, capacity)`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_rejects_zero_capacity() {
        let result = BoundedFifoBuffer::<i32>::new(0);
        assert_eq!(result.err(), Some(ScanError::InvalidCapacity));
    }

    #[test]
    fn test_enqueue_returns_none_until_full_then_evicts_in_fifo_order() {
        let size = 3;
        let mut buffer = BoundedFifoBuffer::new(size).unwrap();

        // First returned items are always None
        for i in 0..size {
            assert_eq!(buffer.enqueue(i), None);
        }

        // Afterwards, elements are removed according to FIFO
        for i in 0..size {
            assert_eq!(buffer.enqueue(i + 10), Some(i));
        }
    }

    #[test]
    fn test_enqueue_evicts_oldest_not_smallest() {
        let mut buffer = BoundedFifoBuffer::new(2).unwrap();
        buffer.enqueue(5);
        buffer.enqueue(1);

        // 5 is larger than 1 but it is the oldest
        assert_eq!(buffer.enqueue(3), Some(5));
        assert_eq!(buffer.enqueue(9), Some(1));
    }

    #[test]
    fn test_capacity_one_evicts_previous_value_every_time() {
        let mut buffer = BoundedFifoBuffer::new(1).unwrap();
        assert_eq!(buffer.enqueue('a'), None);
        assert_eq!(buffer.enqueue('b'), Some('a'));
        assert_eq!(buffer.enqueue('c'), Some('b'));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_enqueue_after_wraparound_returns_oldest_live_value() {
        let mut buffer = BoundedFifoBuffer::new(3).unwrap();
        for v in 1..=5 {
            buffer.enqueue(v);
        }
        // 3, 4, 5 are live
        assert_eq!(buffer.enqueue(6), Some(3));
        assert_eq!(buffer.enqueue(7), Some(4));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_warm_up_keeps_buffer_partially_filled() {
        let mut buffer = BoundedFifoBuffer::new(4).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.enqueue(7), None);
        assert_eq!(buffer.enqueue(8), None);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.capacity(), 4);
    }

    proptest! {
        #[test]
        fn test_len_is_min_of_insertions_and_capacity(
            capacity in 1..16usize,
            values in prop::collection::vec(any::<i16>(), 0..64)
        ) {
            let mut buffer = BoundedFifoBuffer::new(capacity).unwrap();
            for (k, v) in values.iter().enumerate() {
                buffer.enqueue(*v);
                prop_assert_eq!(buffer.len(), (k + 1).min(capacity));
            }
        }

        #[test]
        fn test_kth_insertion_evicts_value_from_k_minus_capacity(
            capacity in 1..16usize,
            values in prop::collection::vec(0..4i16, 0..64)
        ) {
            let mut buffer = BoundedFifoBuffer::new(capacity).unwrap();
            for (k, v) in values.iter().enumerate() {
                let evicted = buffer.enqueue(*v);
                if k < capacity {
                    prop_assert_eq!(evicted, None);
                } else {
                    prop_assert_eq!(evicted, Some(values[k - capacity]));
                }
            }
        }
    }
}
