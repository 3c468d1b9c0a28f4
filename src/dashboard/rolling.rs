use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent `CAPACITY` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct RollingSeries<T, const CAPACITY: usize> {
    samples: VecDeque<T>,
}

impl<T, const CAPACITY: usize> Default for RollingSeries<T, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAPACITY: usize> RollingSeries<T, CAPACITY> {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(CAPACITY + 1),
        }
    }

    /// Appends a sample and returns the one evicted to make room, if any.
    pub fn push(&mut self, sample: T) -> Option<T> {
        self.samples.push_back(sample);
        if self.samples.len() > CAPACITY {
            return self.samples.pop_front();
        }
        None
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        CAPACITY
    }
}
