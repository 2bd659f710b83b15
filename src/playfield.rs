use crate::config::PlayfieldConfig;
use crate::error::{PlayfieldError, Result};
use crate::grid::Grid;
use crate::piece::{Piece, PieceFeed};
use crate::render::Renderer;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
    Down,
    HardDrop,
}

impl Direction {
    /// (row, column) delta of a single step
    fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Down | Direction::HardDrop => (1, 0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// No piece has been spawned yet
    Idle,
    Falling,
    /// The last downward move was rejected; waiting for a lock
    Landed,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PlayfieldEvent {
    Spawned,
    Moved,
    Blocked,
    Landed,
    Locked,
    LinesCleared(usize),
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepOutcome {
    Moved,
    Blocked,
    Locked { rows_cleared: usize },
}

struct ActivePiece {
    piece: Piece,
    row: isize,
    col: isize,
}

// ============================================================================
// Playfield
// ============================================================================

/// Settled terrain plus the falling piece.
///
/// The grid only ever holds settled cells. The active piece is kept apart and
/// overlaid on demand, so collision checks never see the piece's own cells.
pub struct Playfield {
    grid: Grid,
    active: Option<ActivePiece>,
    phase: Phase,
    lines_cleared: usize,
    feed: Box<dyn PieceFeed>,
    renderer: Box<dyn Renderer>,
    events: Vec<PlayfieldEvent>,
}

impl Playfield {
    pub fn new(
        config: PlayfieldConfig,
        feed: Box<dyn PieceFeed>,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_grid(
            Grid::new(config.rows, config.columns),
            feed,
            renderer,
        ))
    }

    /// Starts from a preset settled grid.
    pub fn with_grid(grid: Grid, feed: Box<dyn PieceFeed>, renderer: Box<dyn Renderer>) -> Self {
        Self {
            grid,
            active: None,
            phase: Phase::Idle,
            lines_cleared: 0,
            feed,
            renderer,
            events: Vec::new(),
        }
    }

    /// True if every filled cell of `piece` anchored at `(row, col)` lands
    /// inside the grid on an empty settled cell.
    fn fits(&self, piece: &Piece, row: isize, col: isize) -> bool {
        piece.occupied_cells().all(|(i, j, _)| {
            let r = row + i as isize;
            let c = col + j as isize;
            r >= 0
                && c >= 0
                && (r as usize) < self.grid.rows()
                && (c as usize) < self.grid.columns()
                && !self.grid.is_occupied(r as usize, c as usize)
        })
    }

    fn render(&mut self) {
        let view = self.merged_view();
        self.renderer.render(&view);
    }

    /// Takes the next piece from the feed and places it centered on the top row.
    ///
    /// Fails with [`PlayfieldError::GameOver`] when the spawn position overlaps
    /// settled terrain; the grid is left untouched and the playfield stays
    /// over until [`Playfield::reset`].
    pub fn spawn(&mut self) -> Result<()> {
        if self.phase == Phase::GameOver {
            return Err(PlayfieldError::GameOver);
        }

        let piece = self.feed.next_piece();
        let (rows, columns) = (self.grid.rows(), self.grid.columns());
        if piece.rows() > rows || piece.columns() > columns {
            return Err(PlayfieldError::PieceDoesNotFit {
                piece_rows: piece.rows(),
                piece_columns: piece.columns(),
                rows,
                columns,
            });
        }

        let col = ((columns - piece.columns()) / 2) as isize;
        if !self.fits(&piece, 0, col) {
            tracing::warn!("Spawn at column {} is blocked, game over\n{}", col, self.grid);
            self.active = None;
            self.phase = Phase::GameOver;
            self.events.push(PlayfieldEvent::GameOver);
            self.render();
            return Err(PlayfieldError::GameOver);
        }

        tracing::debug!(
            "Spawned {}x{} piece at (0, {})",
            piece.rows(),
            piece.columns(),
            col
        );
        self.active = Some(ActivePiece { piece, row: 0, col });
        self.phase = Phase::Falling;
        self.events.push(PlayfieldEvent::Spawned);
        self.render();
        Ok(())
    }

    /// Moves the active piece one step, or all the way down for `HardDrop`.
    ///
    /// Returns true if the piece moved. A rejected `Down` means the piece has
    /// landed; `HardDrop` always lands and so always returns false.
    pub fn attempt_move(&mut self, direction: Direction) -> bool {
        let Some(active) = self.active.as_ref() else {
            tracing::trace!("Ignoring {:?}, no active piece", direction);
            return false;
        };

        let (dr, dc) = direction.offset();
        let (row, col) = (active.row, active.col);
        let target = if direction == Direction::HardDrop {
            let mut bottom = row;
            while self.fits(&active.piece, bottom + dr, col) {
                bottom += dr;
            }
            Some((bottom, col))
        } else {
            let (r, c) = (row + dr, col + dc);
            self.fits(&active.piece, r, c).then_some((r, c))
        };

        if let (Some((r, c)), Some(active)) = (target, self.active.as_mut()) {
            active.row = r;
            active.col = c;
        }

        let moved = match (direction, target) {
            (Direction::HardDrop, _) => {
                self.phase = Phase::Landed;
                self.events.push(PlayfieldEvent::Landed);
                false
            }
            (_, Some(_)) => {
                self.phase = Phase::Falling;
                self.events.push(PlayfieldEvent::Moved);
                true
            }
            (Direction::Down, None) => {
                self.phase = Phase::Landed;
                self.events.push(PlayfieldEvent::Landed);
                false
            }
            (_, None) => {
                self.events.push(PlayfieldEvent::Blocked);
                false
            }
        };
        tracing::trace!("{:?} -> {:?} (moved: {})", direction, target, moved);

        self.render();
        moved
    }

    /// Settles the active piece, removes every complete row, then spawns the
    /// next piece. Returns the number of rows removed.
    pub fn lock_and_clear(&mut self) -> Result<usize> {
        if self.phase == Phase::GameOver {
            return Err(PlayfieldError::GameOver);
        }
        let active = self.active.take().ok_or(PlayfieldError::NoActivePiece)?;

        for (i, j, value) in active.piece.occupied_cells() {
            let r = (active.row + i as isize) as usize;
            let c = (active.col + j as isize) as usize;
            self.grid.set_cell(r, c, value);
        }
        self.events.push(PlayfieldEvent::Locked);
        tracing::debug!("Locked piece at ({}, {})", active.row, active.col);

        let mut rows_cleared = 0;
        while self.grid.has_complete_row() {
            rows_cleared += self.grid.clear_complete_rows();
        }
        if rows_cleared > 0 {
            self.lines_cleared += rows_cleared;
            self.events.push(PlayfieldEvent::LinesCleared(rows_cleared));
            tracing::info!(
                "Cleared {} row(s), {} in total",
                rows_cleared,
                self.lines_cleared
            );
        }

        self.spawn()?;
        Ok(rows_cleared)
    }

    /// Moves, and locks the piece if a downward move landed it.
    pub fn step(&mut self, direction: Direction) -> Result<StepOutcome> {
        if self.phase == Phase::GameOver {
            return Err(PlayfieldError::GameOver);
        }
        if self.attempt_move(direction) {
            return Ok(StepOutcome::Moved);
        }
        match direction {
            Direction::Down | Direction::HardDrop if self.phase == Phase::Landed => {
                let rows_cleared = self.lock_and_clear()?;
                Ok(StepOutcome::Locked { rows_cleared })
            }
            _ => Ok(StepOutcome::Blocked),
        }
    }

    /// One gravity step.
    pub fn tick(&mut self) -> Result<StepOutcome> {
        self.step(Direction::Down)
    }

    /// Empties the field and returns to `Idle`; call [`Playfield::spawn`] to play again.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.active = None;
        self.phase = Phase::Idle;
        self.lines_cleared = 0;
        self.events.clear();
        self.render();
    }

    /// Settled terrain only
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Settled terrain with the active piece overlaid
    pub fn merged_view(&self) -> Grid {
        let mut view = self.grid.clone();
        if let Some(active) = &self.active {
            for (i, j, value) in active.piece.occupied_cells() {
                let r = (active.row + i as isize) as usize;
                let c = (active.col + j as isize) as usize;
                view.set_cell(r, c, value);
            }
        }
        view
    }

    pub fn active_piece(&self) -> Option<&Piece> {
        self.active.as_ref().map(|active| &active.piece)
    }

    /// Top-left corner of the active piece's bounding box as (row, column)
    pub fn anchor(&self) -> Option<(isize, isize)> {
        self.active.as_ref().map(|active| (active.row, active.col))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Rows removed since construction or the last reset
    pub fn lines_cleared(&self) -> usize {
        self.lines_cleared
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<PlayfieldEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::grid::Cell;

    pub type Frames = Rc<RefCell<Vec<Grid>>>;

    /// Keeps a copy of every rendered frame.
    pub struct RecordingRenderer {
        frames: Frames,
    }

    impl RecordingRenderer {
        /// Returns the renderer and a handle to the frames it records.
        pub fn new() -> (Self, Frames) {
            let frames = Frames::default();
            (
                Self {
                    frames: Rc::clone(&frames),
                },
                frames,
            )
        }
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, grid: &Grid) {
            self.frames.borrow_mut().push(grid.clone());
        }
    }

    pub fn fill_row(grid: &mut Grid, row: usize) {
        for col in 0..grid.columns() {
            grid.set_cell(row, col, 1);
        }
    }

    pub fn fill_row_with_gap(grid: &mut Grid, row: usize, gap_col: usize) {
        for col in 0..grid.columns() {
            if col != gap_col {
                grid.set_cell(row, col, 1);
            }
        }
    }

    /// Solid `rows` x `columns` piece of value 1.
    pub fn block(rows: usize, columns: usize) -> Piece {
        Piece::filled(rows, columns, 1).expect("block dimensions must be positive")
    }

    /// Writes `pattern` into `row`, starting at column 0.
    pub fn set_row(grid: &mut Grid, row: usize, pattern: &[Cell]) {
        for (col, &value) in pattern.iter().enumerate() {
            grid.set_cell(row, col, value);
        }
    }
}
