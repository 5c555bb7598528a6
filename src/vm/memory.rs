//! Intcode memory subsystem.
//!
//! Memory is a flat, growable sequence of signed 64-bit cells. Programs
//! load into the low addresses and may read or write far beyond their own
//! length; unwritten cells read as zero.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Intcode memory: a zero-extended vector of i64 cells.
///
/// Reads past the end return 0 without growing the store. Writes past the
/// end zero-extend through the target address. Memory never shrinks.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Create empty memory.
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Create memory initialized from a program image.
    pub fn from_image(image: &[i64]) -> Self {
        Self { cells: image.to_vec() }
    }

    /// Read the cell at `addr`.
    ///
    /// Addresses at or beyond the current extent read as 0. Negative
    /// addresses are a fatal error.
    #[inline]
    pub fn read(&self, addr: i64) -> Result<i64, MemoryError> {
        if addr < 0 {
            return Err(MemoryError::NegativeAddress(addr));
        }
        Ok(self.cells.get(addr as usize).copied().unwrap_or(0))
    }

    /// Write `value` to the cell at `addr`, zero-extending if needed.
    ///
    /// Negative addresses are a fatal error.
    #[inline]
    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), MemoryError> {
        if addr < 0 {
            return Err(MemoryError::NegativeAddress(addr));
        }
        let index = addr as usize;
        if index >= self.cells.len() {
            self.cells.resize(index + 1, 0);
        }
        self.cells[index] = value;
        Ok(())
    }

    /// Number of cells currently backed by storage.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cells are backed yet.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The full current image.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Replace the contents with a new program image.
    pub fn load_image(&mut self, image: &[i64]) {
        self.cells.clear();
        self.cells.extend_from_slice(image);
    }

    /// Dump a window of memory (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, i64)> {
        let end = (start + count).min(self.cells.len());
        (start..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Memory {
    /// Comma-separated decimal, the program text round-trip format.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for cell in &self.cells {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", cell)?;
            first = false;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only count non-zero cells
        let non_zero = self.cells.iter().filter(|c| **c != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &self.cells.len())
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is negative; the program or the engine is malformed.
    #[error("negative memory address {0}")]
    NegativeAddress(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write(10, 42).unwrap();
        assert_eq!(mem.read(10).unwrap(), 42);
    }

    #[test]
    fn test_read_past_end_is_zero() {
        let mem = Memory::from_image(&[1, 2, 3]);

        assert_eq!(mem.read(2).unwrap(), 3);
        assert_eq!(mem.read(3).unwrap(), 0);
        assert_eq!(mem.read(1_000_000).unwrap(), 0);
        // Reads never grow the store
        assert_eq!(mem.len(), 3);
    }

    #[test]
    fn test_write_extends_with_zeros() {
        let mut mem = Memory::from_image(&[1, 2, 3]);

        mem.write(10_000, 7).unwrap();

        assert_eq!(mem.len(), 10_001);
        assert_eq!(mem.read(10_000).unwrap(), 7);
        // The gap between old end and the write reads as zero
        assert_eq!(mem.read(5_000).unwrap(), 0);
        assert_eq!(mem.read(3).unwrap(), 0);
    }

    #[test]
    fn test_negative_address_rejected() {
        let mut mem = Memory::from_image(&[1, 2, 3]);

        assert_eq!(mem.read(-1), Err(MemoryError::NegativeAddress(-1)));
        assert_eq!(mem.write(-5, 9), Err(MemoryError::NegativeAddress(-5)));
    }

    #[test]
    fn test_display_roundtrip_format() {
        let mem = Memory::from_image(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        assert_eq!(mem.to_string(), "1,9,10,3,2,3,11,0,99,30,40,50");

        let negatives = Memory::from_image(&[-1, 0, 1]);
        assert_eq!(negatives.to_string(), "-1,0,1");
    }

    #[test]
    fn test_load_image_resets() {
        let mut mem = Memory::from_image(&[1, 2, 3]);
        mem.write(100, 5).unwrap();

        mem.load_image(&[9, 8]);

        assert_eq!(mem.len(), 2);
        assert_eq!(mem.read(100).unwrap(), 0);
    }
}
