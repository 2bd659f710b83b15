use crate::grid::Grid;

/// Receives a snapshot of the field after every spawn, move and lock.
///
/// The snapshot is the settled terrain with the active piece overlaid.
pub trait Renderer {
    fn render(&mut self, grid: &Grid);
}

/// Discards every frame.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _grid: &Grid) {}
}
