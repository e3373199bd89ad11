//! Square 2D containers for activations, weights and input images
//!
//! [`Grid`] owns a `length × length` matrix in a single row-major buffer. Feature maps,
//! kernel weights and padded input images are all grids; [`LabeledInputGrid`] adds the
//! ground-truth label carried alongside an input image.

use crate::error::GridError;
use std::fmt::Display;

/// Side length of a padded network input.
pub const INPUT_LEN: usize = 32;

/// Side length of a raw (unpadded) source image.
pub const IMAGE_LEN: usize = 28;

/// Zero border added on every side of a source image.
pub const PADDING: usize = (INPUT_LEN - IMAGE_LEN) / 2;

/// One activation plane of real values.
pub type FeatureMap = Grid<f32>;

/// Owned square matrix stored row-major.
///
/// Indices passed to [`cell`](Grid::cell) and [`set_cell`](Grid::set_cell) must lie in
/// `[0, length)`; this is checked in debug builds only. Use [`try_cell`](Grid::try_cell)
/// when the indices come from untrusted input.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    length: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Allocate a grid filled with `T::default()`.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            cells: vec![T::default(); length * length],
        }
    }

    /// Build a grid from `length * length` row-major values.
    pub fn from_vec(length: usize, cells: Vec<T>) -> Result<Self, GridError> {
        if cells.len() != length * length {
            return Err(GridError::SizeMismatch {
                expected: length * length,
                found: cells.len(),
            });
        }
        Ok(Self { length, cells })
    }

    /// Reallocate storage for a new side length, dropping the previous contents.
    pub fn init(&mut self, length: usize) {
        self.length = length;
        self.cells = vec![T::default(); length * length];
    }

    /// Side length of the grid.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Read a cell. Bounds are checked in debug builds only.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> T {
        debug_assert!(
            row < self.length && col < self.length,
            "cell ({}, {}) outside grid of side {}",
            row,
            col,
            self.length
        );
        self.cells[row * self.length + col]
    }

    /// Bounds-checked read.
    pub fn try_cell(&self, row: usize, col: usize) -> Result<T, GridError> {
        self.check(row, col)?;
        Ok(self.cells[row * self.length + col])
    }

    /// Write a cell. Bounds are checked in debug builds only.
    #[inline]
    pub fn set_cell(&mut self, value: T, row: usize, col: usize) {
        debug_assert!(
            row < self.length && col < self.length,
            "cell ({}, {}) outside grid of side {}",
            row,
            col,
            self.length
        );
        self.cells[row * self.length + col] = value;
    }

    /// Bounds-checked write.
    pub fn try_set_cell(&mut self, value: T, row: usize, col: usize) -> Result<(), GridError> {
        self.check(row, col)?;
        self.cells[row * self.length + col] = value;
        Ok(())
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Iterate over rows as slices.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks_exact(0) panics, so an empty grid yields no rows
        self.cells.chunks_exact(self.length.max(1))
    }

    /// Apply `f` to every cell, producing a grid of the same side.
    pub fn map<U: Copy + Default>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            length: self.length,
            cells: self.cells.iter().map(|&v| f(v)).collect(),
        }
    }

    fn check(&self, row: usize, col: usize) -> Result<(), GridError> {
        if row >= self.length || col >= self.length {
            return Err(GridError::IndexOutOfBounds {
                row,
                col,
                length: self.length,
            });
        }
        Ok(())
    }
}

impl<T: Copy + Default + Display> Grid<T> {
    /// Text form: space-separated cells per row, rows joined by `\n`, no trailing newline.
    pub fn serialize(&self) -> String {
        self.rows()
            .map(|row| {
                row.iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A padded input image plus its one-character label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledInputGrid {
    grid: Grid<u8>,
    label: char,
}

impl LabeledInputGrid {
    pub fn new(grid: Grid<u8>, label: char) -> Self {
        Self { grid, label }
    }

    /// Build a network input from a row-major `IMAGE_LEN × IMAGE_LEN` image,
    /// surrounding it with a `PADDING`-wide zero border.
    pub fn from_pixels(label: char, pixels: &[u8]) -> Result<Self, GridError> {
        if pixels.len() != IMAGE_LEN * IMAGE_LEN {
            return Err(GridError::SizeMismatch {
                expected: IMAGE_LEN * IMAGE_LEN,
                found: pixels.len(),
            });
        }

        let mut grid = Grid::new(INPUT_LEN);
        for (row, line) in pixels.chunks_exact(IMAGE_LEN).enumerate() {
            for (col, &value) in line.iter().enumerate() {
                grid.set_cell(value, row + PADDING, col + PADDING);
            }
        }
        Ok(Self { grid, label })
    }

    pub fn grid(&self) -> &Grid<u8> {
        &self.grid
    }

    pub fn label(&self) -> char {
        self.label
    }

    pub fn set_label(&mut self, label: char) {
        self.label = label;
    }

    pub fn set_cell(&mut self, value: u8, row: usize, col: usize) {
        self.grid.set_cell(value, row, col);
    }

    pub fn serialize(&self) -> String {
        self.grid.serialize()
    }
}
