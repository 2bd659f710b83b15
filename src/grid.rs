use std::fmt;

use crate::error::{PlayfieldError, Result};

/// Cell value: 0 is empty, anything positive is occupied and names the piece kind.
pub type Cell = u8;

pub const EMPTY: Cell = 0;

// ============================================================================
// Grid
// ============================================================================

/// Fixed-size occupancy matrix of settled cells.
///
/// Row 0 is the top of the field. Every accessor is bounds-checked and panics
/// on an out-of-range coordinate; callers are expected to validate positions
/// before touching the grid.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Creates an all-empty grid. Panics on a zero dimension.
    pub fn new(rows: usize, columns: usize) -> Self {
        assert!(
            rows > 0 && columns > 0,
            "grid dimensions must be positive, got {rows}x{columns}"
        );
        Self {
            rows,
            columns,
            cells: vec![vec![EMPTY; columns]; rows],
        }
    }

    /// Builds a grid from preset rows, top to bottom.
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Result<Self> {
        let rows = cells.len();
        let columns = cells.first().map_or(0, Vec::len);
        if rows == 0 || columns == 0 {
            return Err(PlayfieldError::InvalidDimensions { rows, columns });
        }
        if let Some((row, found)) = cells
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != columns)
        {
            return Err(PlayfieldError::RaggedRows {
                row,
                expected: columns,
                found,
            });
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    fn check_bounds(&self, row: usize, col: usize) {
        assert!(
            row < self.rows && col < self.columns,
            "cell ({row}, {col}) is outside the {}x{} grid",
            self.rows,
            self.columns
        );
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.check_bounds(row, col);
        self.cells[row][col]
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cell(row, col) > EMPTY
    }

    /// Overwrites a single cell; `EMPTY` clears it.
    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        self.check_bounds(row, col);
        self.cells[row][col] = value;
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        assert!(
            row < self.rows,
            "row {row} is outside the {}x{} grid",
            self.rows,
            self.columns
        );
        &self.cells[row]
    }

    pub fn is_row_complete(&self, row: usize) -> bool {
        self.row(row).iter().all(|&cell| cell != EMPTY)
    }

    pub fn filled_count_in_row(&self, row: usize) -> usize {
        self.row(row).iter().filter(|&&cell| cell != EMPTY).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell != EMPTY)
            .count()
    }

    pub fn has_complete_row(&self) -> bool {
        self.cells
            .iter()
            .any(|row| row.iter().all(|&cell| cell != EMPTY))
    }

    /// Removes every complete row and returns how many were removed.
    ///
    /// Surviving rows keep their relative order and sink to the bottom; the
    /// freed space is refilled with empty rows at the top.
    pub fn clear_complete_rows(&mut self) -> usize {
        let (complete, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.cells)
            .into_iter()
            .partition(|row| row.iter().all(|&cell| cell != EMPTY));

        let cleared = complete.len();
        let columns = self.columns;
        let mut cells = Vec::with_capacity(self.rows);
        cells.extend((0..cleared).map(|_| vec![EMPTY; columns]));
        cells.extend(kept);
        self.cells = cells;

        cleared
    }

    /// Empties every cell in place.
    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(EMPTY);
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for &cell in row {
                f.write_str(if cell == EMPTY { "." } else { "#" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
