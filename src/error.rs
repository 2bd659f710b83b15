/// Error types for the playfield engine
use thiserror::Error;

/// Result type alias for playfield operations
pub type Result<T> = std::result::Result<T, PlayfieldError>;

/// Errors that can occur while setting up or driving a playfield
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayfieldError {
    /// A grid or piece was requested with a zero dimension
    #[error("Invalid dimensions: {rows}x{columns}, both must be positive")]
    InvalidDimensions { rows: usize, columns: usize },

    /// Preset rows do not form a rectangle
    #[error("Ragged rows: row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        /// Index of the offending row
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of the offending row
        found: usize,
    },

    /// A piece pattern has no filled cell
    #[error("Piece pattern has no filled cell")]
    EmptyPiece,

    /// The spawned piece is larger than the grid itself
    #[error("Piece {piece_rows}x{piece_columns} does not fit in a {rows}x{columns} grid")]
    PieceDoesNotFit {
        piece_rows: usize,
        piece_columns: usize,
        rows: usize,
        columns: usize,
    },

    /// Lock requested while no piece is falling
    #[error("No active piece")]
    NoActivePiece,

    /// The next piece overlaps settled terrain at its spawn position
    #[error("Game over: spawn position is blocked")]
    GameOver,
}
