//! Time-stamped signal window.
//!
//! Samples arrive in capture order and leave oldest-first once the window is
//! full. The window limits follow the measured frame rate.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One accepted frame: scalar intensity and capture time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Reduced channel intensity
    pub value: f64,
    /// Monotonic capture timestamp in milliseconds
    pub timestamp_ms: f64,
}

impl Sample {
    #[must_use]
    pub const fn new(value: f64, timestamp_ms: f64) -> Self {
        Self { value, timestamp_ms }
    }
}

/// FIFO window of samples with strictly increasing timestamps
#[derive(Debug, Clone)]
pub struct SlidingBuffer {
    samples: VecDeque<Sample>,
    min_len: usize,
    max_len: usize,
}

impl SlidingBuffer {
    /// Create a buffer that is ready at `min_len` samples and holds at most `max_len`
    ///
    /// # Panics
    ///
    /// Panics if `max_len` is smaller than `min_len` or zero
    #[must_use]
    pub fn new(min_len: usize, max_len: usize) -> Self {
        assert!(max_len > 0, "Max window must be greater than 0");
        assert!(max_len >= min_len, "Max window {max_len} smaller than min window {min_len}");
        Self {
            samples: VecDeque::with_capacity(max_len + 1),
            min_len,
            max_len,
        }
    }

    /// Append a sample, evicting the oldest once over capacity
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp does not follow the newest sample
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if let Some(last) = self.samples.back() {
            if sample.timestamp_ms <= last.timestamp_ms {
                return Err(Error::NonMonotonicTimestamp {
                    previous: last.timestamp_ms,
                    current: sample.timestamp_ms,
                });
            }
        }

        self.samples.push_back(sample);
        self.evict();
        Ok(())
    }

    /// Update window limits after a frame rate change; shrinking evicts immediately
    pub fn set_limits(&mut self, min_len: usize, max_len: usize) {
        self.max_len = max_len.max(1);
        self.min_len = min_len.min(self.max_len);
        self.evict();
    }

    /// Remove up to `count` of the newest samples, returning how many were removed
    pub fn drop_recent(&mut self, count: usize) -> usize {
        let count = count.min(self.samples.len());
        self.samples.truncate(self.samples.len() - count);
        count
    }

    /// Keep only the most recent `count` samples
    pub fn retain_recent(&mut self, count: usize) {
        while self.samples.len() > count {
            self.samples.pop_front();
        }
    }

    fn evict(&mut self) {
        while self.samples.len() > self.max_len {
            self.samples.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Enough samples to attempt an estimate
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.is_empty() && self.samples.len() >= self.min_len
    }

    #[must_use]
    pub const fn min_len(&self) -> usize {
        self.min_len
    }

    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Read-only view of the last `count` samples, oldest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Sample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(count))
    }

    /// All samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Split the window into parallel value and timestamp vectors
    #[must_use]
    pub fn split(&self) -> (Vec<f64>, Vec<f64>) {
        self.samples.iter().map(|s| (s.value, s.timestamp_ms)).unzip()
    }

    /// Owned copy of the window for display
    #[must_use]
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(count: usize, min_len: usize, max_len: usize) -> SlidingBuffer {
        let mut buffer = SlidingBuffer::new(min_len, max_len);
        for i in 0..count {
            buffer.push(Sample::new(i as f64, i as f64 * 10.0)).unwrap();
        }
        buffer
    }

    #[test]
    fn test_fifo_eviction() {
        let buffer = filled(8, 2, 5);
        assert_eq!(buffer.len(), 5);
        let values: Vec<f64> = buffer.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_ready_predicate() {
        let mut buffer = filled(2, 3, 5);
        assert!(!buffer.is_ready());
        buffer.push(Sample::new(0.0, 100.0)).unwrap();
        assert!(buffer.is_ready());
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let mut buffer = filled(3, 1, 5);
        assert!(buffer.push(Sample::new(1.0, 20.0)).is_err());
        assert!(buffer.push(Sample::new(1.0, 15.0)).is_err());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_recent_view() {
        let buffer = filled(6, 1, 10);
        let recent: Vec<f64> = buffer.recent(2).map(|s| s.value).collect();
        assert_eq!(recent, vec![4.0, 5.0]);
        assert_eq!(buffer.recent(100).count(), 6);
    }

    #[test]
    fn test_shrinking_limits_evicts() {
        let mut buffer = filled(10, 2, 10);
        buffer.set_limits(2, 4);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.iter().next().unwrap().value, 6.0);
    }

    #[test]
    fn test_drop_recent() {
        let mut buffer = filled(5, 1, 10);
        assert_eq!(buffer.drop_recent(2), 2);
        let values: Vec<f64> = buffer.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);

        // Later samples must still follow the newest remaining timestamp
        buffer.push(Sample::new(9.0, 25.0)).unwrap();
        assert_eq!(buffer.drop_recent(10), 4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_empty_buffer_is_never_ready() {
        let mut buffer = SlidingBuffer::new(0, 5);
        assert!(!buffer.is_ready());
        buffer.push(Sample::new(1.0, 0.0)).unwrap();
        assert!(buffer.is_ready());
    }

    #[test]
    fn test_retain_recent() {
        let mut buffer = filled(10, 2, 10);
        buffer.retain_recent(3);
        let (values, timestamps) = buffer.split();
        assert_eq!(values, vec![7.0, 8.0, 9.0]);
        assert_eq!(timestamps, vec![70.0, 80.0, 90.0]);
    }
}
