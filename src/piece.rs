use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PlayfieldError, Result};
use crate::grid::{Cell, EMPTY};

// ============================================================================
// Piece
// ============================================================================

/// Immutable occupancy pattern of a falling piece.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Piece {
    /// Builds a piece from its rows, top to bottom. The pattern must be
    /// rectangular with at least one filled cell; zero entries are holes.
    pub fn new(pattern: Vec<Vec<Cell>>) -> Result<Self> {
        let rows = pattern.len();
        let columns = pattern.first().map_or(0, Vec::len);
        if rows == 0 || columns == 0 {
            return Err(PlayfieldError::InvalidDimensions { rows, columns });
        }

        let mut cells = Vec::with_capacity(rows * columns);
        for (row, line) in pattern.into_iter().enumerate() {
            if line.len() != columns {
                return Err(PlayfieldError::RaggedRows {
                    row,
                    expected: columns,
                    found: line.len(),
                });
            }
            cells.extend(line);
        }
        if cells.iter().all(|&value| value == EMPTY) {
            return Err(PlayfieldError::EmptyPiece);
        }

        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    /// Solid rectangle of `value`.
    pub fn filled(rows: usize, columns: usize, value: Cell) -> Result<Self> {
        Self::new(vec![vec![value; columns]; rows])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Cell value at `(i, j)` of the bounding box; 0 means empty.
    pub fn occupancy_at(&self, i: usize, j: usize) -> Cell {
        assert!(
            i < self.rows && j < self.columns,
            "cell ({i}, {j}) is outside the {}x{} piece",
            self.rows,
            self.columns
        );
        self.cells[i * self.columns + j]
    }

    /// `(i, j, value)` for every filled cell, row-major.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != EMPTY)
            .map(move |(idx, value)| (idx / self.columns, idx % self.columns, *value))
    }
}

// ============================================================================
// Piece Feed Trait
// ============================================================================

pub trait PieceFeed {
    fn next_piece(&mut self) -> Piece;
}

/// Draws uniformly from a fixed catalogue of pieces.
pub struct RandomFeed {
    catalogue: Vec<Piece>,
    rng: StdRng,
}

impl RandomFeed {
    /// Panics on an empty catalogue.
    pub fn new(catalogue: Vec<Piece>) -> Self {
        Self::with_rng(catalogue, StdRng::from_entropy())
    }

    pub fn seeded(catalogue: Vec<Piece>, seed: u64) -> Self {
        Self::with_rng(catalogue, StdRng::seed_from_u64(seed))
    }

    fn with_rng(catalogue: Vec<Piece>, rng: StdRng) -> Self {
        assert!(!catalogue.is_empty(), "piece catalogue must not be empty");
        Self { catalogue, rng }
    }
}

impl PieceFeed for RandomFeed {
    fn next_piece(&mut self) -> Piece {
        let idx = self.rng.gen_range(0..self.catalogue.len());
        self.catalogue[idx].clone()
    }
}

/// Cycles through a fixed list of pieces in order.
pub struct SequenceFeed {
    pieces: Vec<Piece>,
    index: usize,
}

impl SequenceFeed {
    /// Panics on an empty list.
    pub fn new(pieces: Vec<Piece>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceFeed for SequenceFeed {
    fn next_piece(&mut self) -> Piece {
        let piece = self.pieces[self.index % self.pieces.len()].clone();
        self.index += 1;
        piece
    }
}
