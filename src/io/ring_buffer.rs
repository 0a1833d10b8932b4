//! Fixed-capacity ring for live capture
//!
//! The capture callback appends blocks of arbitrary size; the live loop reads
//! the most recent window once per frame. Old audio is overwritten.

/// Fixed-capacity circular sample store
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<f32>,
    write_pos: usize,
    filled: usize,
}

impl RingBuffer {
    /// Create an empty ring holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_pos: 0,
            filled: 0,
        }
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of valid samples currently held
    pub fn len(&self) -> usize {
        self.filled
    }

    /// True if nothing has been written since creation or the last clear
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Append samples, overwriting the oldest audio when full
    pub fn push(&mut self, samples: &[f32]) {
        let capacity = self.data.len();
        // Only the tail of an oversized block can survive
        let samples = if samples.len() > capacity {
            &samples[samples.len() - capacity..]
        } else {
            samples
        };

        let first = (capacity - self.write_pos).min(samples.len());
        self.data[self.write_pos..self.write_pos + first].copy_from_slice(&samples[..first]);
        let rest = samples.len() - first;
        self.data[..rest].copy_from_slice(&samples[first..]);

        self.write_pos = (self.write_pos + samples.len()) % capacity;
        self.filled = (self.filled + samples.len()).min(capacity);
    }

    /// Copy the most recent `out.len()` samples into `out`, oldest first
    ///
    /// Returns `false` (leaving `out` untouched) until enough audio has
    /// been captured.
    pub fn latest_into(&self, out: &mut [f32]) -> bool {
        let n = out.len();
        if n == 0 || n > self.filled {
            return false;
        }
        let capacity = self.data.len();
        let start = (self.write_pos + capacity - n) % capacity;
        let first = (capacity - start).min(n);
        out[..first].copy_from_slice(&self.data[start..start + first]);
        out[first..].copy_from_slice(&self.data[..n - first]);
        true
    }

    /// Forget all captured audio
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.filled = 0;
    }
}
