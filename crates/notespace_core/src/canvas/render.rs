//! Render boundary between the workspace core and the host UI.
//!
//! The core never draws. It tells a `RenderAdapter` where each note goes and
//! how large it is; the adapter owns the concrete elements.

use super::viewport::{note_display_size, to_screen};
use crate::model::coords::{CanvasPoint, ScreenPoint};
use crate::model::note::{Note, NoteId};
use crate::model::snapshot::PersistedState;
use crate::model::viewport::Viewport;

/// Where and how large one note is drawn under the current viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotePlacement {
    pub id: NoteId,
    pub position: ScreenPoint,
    pub display_size: f64,
}

impl NotePlacement {
    pub fn for_note(note: &Note, viewport: &Viewport, base_note_size: f64) -> Self {
        Self {
            id: note.id,
            position: to_screen(CanvasPoint::new(note.x, note.y), viewport),
            display_size: note_display_size(base_note_size, viewport.zoom()),
        }
    }
}

/// Placements for every note, bottom-most first.
pub fn placements(state: &PersistedState, base_note_size: f64) -> Vec<NotePlacement> {
    state
        .drawing_order
        .ids()
        .iter()
        .filter_map(|id| state.notes.get(*id))
        .map(|note| NotePlacement::for_note(note, &state.viewport, base_note_size))
        .collect()
}

/// Host-side renderer driven by the interaction state machine.
pub trait RenderAdapter {
    /// Creates the element for a note that is not on screen yet.
    fn render_note(&mut self, note: &Note, placement: NotePlacement);

    /// Moves the note's element to the end of the paint order.
    fn raise_note(&mut self, id: NoteId);

    /// Visual-only move of one element while it is being dragged.
    fn move_note(&mut self, id: NoteId, position: ScreenPoint);

    /// Pan: element positions changed, sizes did not.
    fn reposition(&mut self, viewport: &Viewport, placements: &[NotePlacement]);

    /// Zoom: positions and sizes of every element must be recomputed.
    fn redraw(&mut self, viewport: &Viewport, placements: &[NotePlacement]);
}
