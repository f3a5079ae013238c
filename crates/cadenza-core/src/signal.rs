//! Two-dimensional sample buffer.
//!
//! A [`Signal`] is `rows × frames` samples stored row-major in one allocation.
//! Node port buffers use one row per port, the converter uses one row per
//! voice field, and published-signal reads use one row per backing buffer.

use crate::GraphError;

/// Row-major `rows × frames` `f32` buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    data: Vec<f32>,
    rows: usize,
    frames: usize,
}

impl Signal {
    /// Creates a zeroed signal.
    pub fn new(rows: usize, frames: usize) -> Self {
        Self {
            data: vec![0.0; rows * frames],
            rows,
            frames,
        }
    }

    /// Reshapes the signal and zeroes every sample.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if the new storage cannot be reserved.
    pub fn resize(&mut self, rows: usize, frames: usize) -> Result<(), GraphError> {
        let len = rows * frames;
        if len > self.data.len() {
            self.data
                .try_reserve_exact(len - self.data.len())
                .map_err(|_| GraphError::Allocation(len))?;
        }
        self.data.clear();
        self.data.resize(len, 0.0);
        self.rows = rows;
        self.frames = frames;
        Ok(())
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of frames per row.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Borrows one row. Panics if `row >= rows()`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Mutably borrows one row. Panics if `row >= rows()`.
    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        let start = row * self.frames;
        &mut self.data[start..start + self.frames]
    }

    /// Iterates over rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics
        self.data.chunks_exact(self.frames.max(1)).take(self.rows)
    }

    /// Sets every sample to zero.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// All samples, row-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_disjoint() {
        let mut sig = Signal::new(3, 4);
        sig.row_mut(1).fill(1.0);
        assert_eq!(sig.row(0), &[0.0; 4]);
        assert_eq!(sig.row(1), &[1.0; 4]);
        assert_eq!(sig.row(2), &[0.0; 4]);
    }

    #[test]
    fn resize_zeroes() {
        let mut sig = Signal::new(1, 2);
        sig.row_mut(0).fill(5.0);
        sig.resize(2, 8).unwrap();
        assert_eq!(sig.rows(), 2);
        assert_eq!(sig.frames(), 8);
        assert!(sig.as_slice().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn iter_rows_yields_each_row() {
        let mut sig = Signal::new(2, 3);
        sig.row_mut(1)[2] = 7.0;
        let rows: Vec<&[f32]> = sig.iter_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], &[0.0, 0.0, 7.0]);
    }
}
