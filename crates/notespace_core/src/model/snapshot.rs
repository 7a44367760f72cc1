//! The durable unit of workspace state.

use super::note::{DrawingOrder, NoteCollection};
use super::viewport::Viewport;

/// Notes, their drawing order and the viewport, saved and loaded together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub notes: NoteCollection,
    pub drawing_order: DrawingOrder,
    pub viewport: Viewport,
}
