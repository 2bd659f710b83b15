//! Playing-field engine for a falling-block puzzle game.
//!
//! [`Grid`] stores settled cells and clears complete rows. [`Playfield`] owns a
//! grid and the falling piece, validates moves against walls and terrain, and
//! locks pieces in place. Pieces come from a [`PieceFeed`] and every state
//! change is pushed to a [`Renderer`].

pub mod config;
pub mod error;
pub mod grid;
pub mod piece;
pub mod playfield;
pub mod render;

pub use config::PlayfieldConfig;
pub use error::{PlayfieldError, Result};
pub use grid::{Cell, Grid, EMPTY};
pub use piece::{Piece, PieceFeed, RandomFeed, SequenceFeed};
pub use playfield::{Direction, Phase, Playfield, PlayfieldEvent, StepOutcome};
pub use render::{NullRenderer, Renderer};
