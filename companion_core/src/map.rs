use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Cell ({row}, {col}) is out of bounds for a {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// A dense 2D grid.
///
/// Stores elements of type `T` in a flat vector in row-major order, addressed by
/// `(row, col)` or [`Position`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Self
    where
        T: Default + Clone,
    {
        let size = rows.checked_mul(cols).expect("Grid size overflow");
        Grid {
            rows,
            cols,
            cells: vec![T::default(); size],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Checks if the position lies inside the grid.
    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    /// Converts a position to a flat vector index.
    ///
    /// Returns `None` if the position is out of bounds.
    #[inline]
    pub fn flat_index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.row * self.cols + pos.col)
        } else {
            None
        }
    }

    /// Gets a reference to the cell at `pos`, or `None` when out of bounds.
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.flat_index(pos).map(|index| &self.cells[index])
    }

    /// Sets the value of the cell at `pos`.
    ///
    /// Returns `Err(GridError::OutOfBounds)` if the position is invalid.
    pub fn set(&mut self, pos: Position, value: T) -> Result<(), GridError> {
        let index = self.flat_index(pos).ok_or(GridError::OutOfBounds {
            row: pos.row,
            col: pos.col,
            rows: self.rows,
            cols: self.cols,
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (Position::new(index / cols, index % cols), cell))
    }

    /// Every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<T> {
        let (rows, cols) = (self.rows, self.cols);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
    }
}

/// Unchecked-in-release indexing. Out-of-range positions trip a debug assertion;
/// release builds fall through to the slice bounds check of the flat index.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: Position) -> &Self::Output {
        debug_assert!(
            self.in_bounds(pos),
            "Grid index ({}, {}) out of bounds for a {}x{} grid",
            pos.row,
            pos.col,
            self.rows,
            self.cols
        );
        &self.cells[pos.row * self.cols + pos.col]
    }
}
