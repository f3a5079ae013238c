//! Fixed-capacity sample queue decoupling host block size from vector size.
//!
//! One [`RingBuffer`] sits on every engine input and output channel. The host
//! side writes (or reads) whatever block size it was handed; the engine side
//! reads (or writes) exactly one processing vector at a time. Each buffer has
//! one writer and one reader, both on the audio thread.
//!
//! Transfers never block and never fail: [`write()`](RingBuffer::write) and
//! [`read()`](RingBuffer::read) return the number of samples actually moved,
//! and a short count is the caller's signal for overflow or starvation.
//!
//! Storage is allocated only in [`with_capacity()`](RingBuffer::with_capacity)
//! and [`resize()`](RingBuffer::resize); the transfer methods are
//! allocation-free.

use crate::GraphError;

/// Single-writer, single-reader `f32` ring buffer with fixed capacity.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer {
    data: Vec<f32>,
    read_pos: usize,
    write_pos: usize,
    len: usize,
}

impl RingBuffer {
    /// Creates an empty buffer able to hold `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity],
            read_pos: 0,
            write_pos: 0,
            len: 0,
        }
    }

    /// Reallocates storage for `capacity` samples and discards the contents.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if the allocation fails. The buffer
    /// is left empty but keeps its previous capacity in that case.
    pub fn resize(&mut self, capacity: usize) -> Result<(), GraphError> {
        self.clear();
        if capacity > self.data.len() {
            self.data
                .try_reserve_exact(capacity - self.data.len())
                .map_err(|_| GraphError::Allocation(capacity))?;
        }
        self.data.resize(capacity, 0.0);
        self.data.shrink_to(capacity);
        Ok(())
    }

    /// Total number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of samples available for reading.
    pub fn remaining(&self) -> usize {
        self.len
    }

    /// Number of samples that can be written before the buffer is full.
    pub fn space(&self) -> usize {
        self.data.len() - self.len
    }

    /// Returns true if nothing is available for reading.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends as many samples from `src` as fit.
    ///
    /// Returns the number written, which is less than `src.len()` when the
    /// buffer fills up. Samples that do not fit are dropped.
    pub fn write(&mut self, src: &[f32]) -> usize {
        let count = src.len().min(self.space());
        if count == 0 {
            return 0;
        }
        let cap = self.data.len();
        let first = count.min(cap - self.write_pos);
        self.data[self.write_pos..self.write_pos + first].copy_from_slice(&src[..first]);
        let second = count - first;
        if second > 0 {
            self.data[..second].copy_from_slice(&src[first..count]);
        }
        self.write_pos = (self.write_pos + count) % cap;
        self.len += count;
        count
    }

    /// Appends `count` zeros, returning how many fit.
    pub fn write_silence(&mut self, count: usize) -> usize {
        let count = count.min(self.space());
        let cap = self.data.len();
        for i in 0..count {
            self.data[(self.write_pos + i) % cap] = 0.0;
        }
        if count > 0 {
            self.write_pos = (self.write_pos + count) % cap;
            self.len += count;
        }
        count
    }

    /// Moves up to `dst.len()` of the oldest samples into `dst`.
    ///
    /// Returns the number read. Entries of `dst` past that count are left
    /// untouched.
    pub fn read(&mut self, dst: &mut [f32]) -> usize {
        let count = dst.len().min(self.len);
        if count == 0 {
            return 0;
        }
        let cap = self.data.len();
        let first = count.min(cap - self.read_pos);
        dst[..first].copy_from_slice(&self.data[self.read_pos..self.read_pos + first]);
        let second = count - first;
        if second > 0 {
            dst[first..count].copy_from_slice(&self.data[..second]);
        }
        self.read_pos = (self.read_pos + count) % cap;
        self.len -= count;
        count
    }

    /// Drops up to `count` of the oldest samples, returning how many were dropped.
    pub fn discard(&mut self, count: usize) -> usize {
        let count = count.min(self.len);
        if count > 0 {
            self.read_pos = (self.read_pos + count) % self.data.len();
            self.len -= count;
        }
        count
    }

    /// Empties the buffer without touching its capacity.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_is_identical() {
        let mut rb = RingBuffer::with_capacity(8);
        let src = [0.1, -0.2, 0.3, 0.4, -0.5];
        assert_eq!(rb.write(&src), 5);
        assert_eq!(rb.remaining(), 5);

        let mut dst = [0.0; 5];
        assert_eq!(rb.read(&mut dst), 5);
        assert_eq!(dst, src);
        assert!(rb.is_empty());
    }

    #[test]
    fn wraps_around_the_end() {
        let mut rb = RingBuffer::with_capacity(4);
        let mut scratch = [0.0; 3];
        rb.write(&[1.0, 2.0, 3.0]);
        rb.read(&mut scratch);

        // write_pos is now 3, this write spans the seam
        assert_eq!(rb.write(&[4.0, 5.0, 6.0]), 3);
        let mut dst = [0.0; 3];
        assert_eq!(rb.read(&mut dst), 3);
        assert_eq!(dst, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn short_write_when_full() {
        let mut rb = RingBuffer::with_capacity(4);
        assert_eq!(rb.write(&[1.0; 6]), 4);
        assert_eq!(rb.space(), 0);
        assert_eq!(rb.write(&[2.0]), 0);
    }

    #[test]
    fn short_read_leaves_tail_untouched() {
        let mut rb = RingBuffer::with_capacity(4);
        rb.write(&[1.0, 2.0]);
        let mut dst = [9.0; 4];
        assert_eq!(rb.read(&mut dst), 2);
        assert_eq!(dst, [1.0, 2.0, 9.0, 9.0]);
    }

    #[test]
    fn write_silence_and_discard() {
        let mut rb = RingBuffer::with_capacity(8);
        assert_eq!(rb.write_silence(3), 3);
        rb.write(&[1.0, 2.0]);
        assert_eq!(rb.discard(3), 3);
        let mut dst = [0.0; 2];
        rb.read(&mut dst);
        assert_eq!(dst, [1.0, 2.0]);
        assert_eq!(rb.discard(10), 0);
    }

    #[test]
    fn resize_clears_and_changes_capacity() {
        let mut rb = RingBuffer::with_capacity(4);
        rb.write(&[1.0, 2.0]);
        rb.resize(16).unwrap();
        assert_eq!(rb.capacity(), 16);
        assert!(rb.is_empty());
        rb.resize(2).unwrap();
        assert_eq!(rb.capacity(), 2);
    }

    #[test]
    fn zero_capacity_is_inert() {
        let mut rb = RingBuffer::default();
        assert_eq!(rb.write(&[1.0]), 0);
        assert_eq!(rb.write_silence(4), 0);
        let mut dst = [0.0; 1];
        assert_eq!(rb.read(&mut dst), 0);
    }
}
