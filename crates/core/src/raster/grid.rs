//! Single-band pixel grid

use crate::error::{Error, Result};
use ndarray::Array2;

/// A 2-D grid of per-pixel values for one band.
///
/// Values are IEEE doubles. `NaN` marks a masked (undefined) pixel; every
/// transform in this library uses NaN as the masking channel, so arithmetic
/// edge cases propagate through computations instead of raising errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Array2<f64>,
}

impl Grid {
    /// Create a grid filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    /// Create a grid filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
        }
    }

    /// Create a fully masked grid (every pixel NaN)
    pub fn masked(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, f64::NAN)
    }

    /// Create a grid from existing data in row-major order
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self { data: array })
    }

    /// Create a grid from an ndarray
    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| Error::Other(format!(
                "index ({}, {}) out of bounds for {}x{} grid",
                row,
                col,
                self.rows(),
                self.cols()
            )))
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> f64 {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::Other(format!(
                "index ({}, {}) out of bounds for {}x{} grid",
                row,
                col,
                self.rows(),
                self.cols()
            ))),
        }
    }

    /// Whether the pixel at (row, col) is masked
    pub fn is_masked(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.get(row, col)?.is_nan())
    }

    /// Apply a function to every pixel, returning a new grid.
    ///
    /// NaN inputs propagate through `f` by IEEE semantics; callers that need
    /// to treat masked pixels specially should test `is_nan` themselves.
    pub fn map<F>(&self, f: F) -> Grid
    where
        F: Fn(f64) -> f64,
    {
        Self {
            data: self.data.mapv(|v| f(v)),
        }
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consume the grid and return the underlying array
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }
}
