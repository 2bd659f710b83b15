//! Configuration for a Playfield

use crate::error::{PlayfieldError, Result};

pub const DEFAULT_ROWS: usize = 20;
pub const DEFAULT_COLUMNS: usize = 10;

/// Dimensions of the playing field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayfieldConfig {
    /// Number of rows (height)
    pub rows: usize,

    /// Number of columns (width)
    pub columns: usize,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
        }
    }
}

impl PlayfieldConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of rows
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Set the number of columns
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Reject zero-sized fields before a grid is allocated
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(PlayfieldError::InvalidDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(())
    }
}
