//! Pointer gesture state machine.
//!
//! # Responsibility
//! - Classify each pointer-down into a pan or a note drag and run it to
//!   pointer-up.
//! - Apply wheel zoom, content edits and note creation at any time.
//!
//! # Invariants
//! - A gesture starts only from `GestureState::Idle`; pointer-downs arriving
//!   mid-gesture are ignored.
//! - Pan moves update the viewport and re-render synchronously; only the
//!   write to storage is debounced.
//! - Drag moves are visual-only; the note's canvas position is written once,
//!   on pointer-up.

use super::render::{placements, NotePlacement, RenderAdapter};
use super::viewport::{note_display_size, to_canvas, to_screen, zoom_delta};
use crate::config::WorkspaceConfig;
use crate::model::coords::{CanvasPoint, ScreenPoint, ViewportSize};
use crate::model::note::NoteId;
use crate::model::viewport::ViewportPatch;
use crate::repo::blob_repo::BlobRepository;
use crate::service::workspace::WorkspaceState;
use log::{debug, trace};

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerTarget {
    /// Empty canvas background.
    Canvas,
    /// A note element whose top-left is currently drawn at `origin`.
    Note { id: NoteId, origin: ScreenPoint },
}

/// Raw input delivered by the host UI, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        position: ScreenPoint,
        target: PointerTarget,
    },
    PointerMove {
        position: ScreenPoint,
    },
    PointerUp {
        position: ScreenPoint,
    },
    /// Vertical wheel delta; positive zooms in.
    Wheel {
        delta_y: f64,
    },
    ContentEdited {
        id: NoteId,
        content: String,
    },
    /// The "add note" action, with the current visible canvas size.
    CreateRequested {
        viewport_size: ViewportSize,
    },
}

/// Current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// `anchor` is the pointer position minus the viewport offset at press.
    Panning { anchor: ScreenPoint },
    /// `grab_offset` is the pointer position minus the note origin at press.
    Dragging {
        id: NoteId,
        grab_offset: ScreenPoint,
        position: ScreenPoint,
    },
}

/// Effect of one handled event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// No transition and no mutation.
    Ignored,
    PanStarted,
    Panned { offset_x: f64, offset_y: f64 },
    PanEnded,
    DragStarted(NoteId),
    Dragged { id: NoteId, position: ScreenPoint },
    DragEnded { id: NoteId, position: CanvasPoint },
    Zoomed(u16),
    ContentUpdated(NoteId),
    NoteCreated(NoteId),
}

/// Turns input events into workspace mutations and render calls.
#[derive(Debug, Clone)]
pub struct InteractionStateMachine {
    state: GestureState,
    base_note_size: f64,
}

impl InteractionStateMachine {
    /// `base_note_size` is the note edge length at zoom 100.
    pub fn new(base_note_size: f64) -> Self {
        Self {
            state: GestureState::Idle,
            base_note_size,
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.base_note_size)
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// Handles one event against `workspace`, driving `renderer`.
    pub fn handle<R, A>(
        &mut self,
        event: InputEvent,
        workspace: &mut WorkspaceState<R>,
        renderer: &mut A,
    ) -> EventOutcome
    where
        R: BlobRepository,
        A: RenderAdapter + ?Sized,
    {
        match event {
            InputEvent::PointerDown { position, target } => {
                self.pointer_down(position, target, workspace, renderer)
            }
            InputEvent::PointerMove { position } => {
                self.pointer_move(position, workspace, renderer)
            }
            InputEvent::PointerUp { position } => self.pointer_up(position, workspace, renderer),
            InputEvent::Wheel { delta_y } => self.wheel(delta_y, workspace, renderer),
            InputEvent::ContentEdited { id, content } => {
                if workspace.update_content(id, content) {
                    EventOutcome::ContentUpdated(id)
                } else {
                    EventOutcome::Ignored
                }
            }
            InputEvent::CreateRequested { viewport_size } => {
                self.create(viewport_size, workspace, renderer)
            }
        }
    }

    fn pointer_down<R, A>(
        &mut self,
        position: ScreenPoint,
        target: PointerTarget,
        workspace: &mut WorkspaceState<R>,
        renderer: &mut A,
    ) -> EventOutcome
    where
        R: BlobRepository,
        A: RenderAdapter + ?Sized,
    {
        if !self.is_idle() {
            debug!("event=gesture_start module=canvas status=skipped reason=gesture_active");
            return EventOutcome::Ignored;
        }

        match target {
            PointerTarget::Canvas => {
                let viewport = workspace.viewport();
                let anchor = ScreenPoint::new(
                    position.x - viewport.offset_x,
                    position.y - viewport.offset_y,
                );
                self.state = GestureState::Panning { anchor };
                debug!("event=gesture_start module=canvas status=ok kind=pan");
                EventOutcome::PanStarted
            }
            PointerTarget::Note { id, origin } => {
                if !workspace.move_to_top(id) {
                    debug!("event=gesture_start module=canvas status=skipped reason=unknown_id id={id}");
                    return EventOutcome::Ignored;
                }
                renderer.raise_note(id);
                self.state = GestureState::Dragging {
                    id,
                    grab_offset: position.minus(origin),
                    position: origin,
                };
                debug!("event=gesture_start module=canvas status=ok kind=drag id={id}");
                EventOutcome::DragStarted(id)
            }
        }
    }

    fn pointer_move<R, A>(
        &mut self,
        position: ScreenPoint,
        workspace: &mut WorkspaceState<R>,
        renderer: &mut A,
    ) -> EventOutcome
    where
        R: BlobRepository,
        A: RenderAdapter + ?Sized,
    {
        match self.state {
            GestureState::Idle => EventOutcome::Ignored,
            GestureState::Panning { anchor } => {
                let offset = position.minus(anchor);
                workspace.set_viewport(ViewportPatch::offset(offset.x, offset.y));
                let viewport = *workspace.viewport();
                let layout = placements(workspace.snapshot(), self.base_note_size);
                renderer.reposition(&viewport, &layout);
                trace!(
                    "event=pan_move module=canvas offset_x={} offset_y={}",
                    viewport.offset_x,
                    viewport.offset_y
                );
                EventOutcome::Panned {
                    offset_x: viewport.offset_x,
                    offset_y: viewport.offset_y,
                }
            }
            GestureState::Dragging {
                id, grab_offset, ..
            } => {
                let note_position = position.minus(grab_offset);
                self.state = GestureState::Dragging {
                    id,
                    grab_offset,
                    position: note_position,
                };
                renderer.move_note(id, note_position);
                EventOutcome::Dragged {
                    id,
                    position: note_position,
                }
            }
        }
    }

    fn pointer_up<R, A>(
        &mut self,
        position: ScreenPoint,
        workspace: &mut WorkspaceState<R>,
        renderer: &mut A,
    ) -> EventOutcome
    where
        R: BlobRepository,
        A: RenderAdapter + ?Sized,
    {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => EventOutcome::Ignored,
            GestureState::Panning { .. } => {
                workspace.request_save();
                debug!("event=gesture_end module=canvas status=ok kind=pan");
                EventOutcome::PanEnded
            }
            GestureState::Dragging {
                id, grab_offset, ..
            } => {
                let final_screen = position.minus(grab_offset);
                let mut canvas = to_canvas(final_screen, workspace.viewport());
                if !workspace.update_position(id, canvas) {
                    debug!("event=gesture_end module=canvas status=skipped reason=position_rejected id={id}");
                }
                // Settle the element wherever the note actually is.
                if let Some(note) = workspace.note(id) {
                    canvas = CanvasPoint::new(note.x, note.y);
                }
                renderer.move_note(id, to_screen(canvas, workspace.viewport()));
                debug!(
                    "event=gesture_end module=canvas status=ok kind=drag id={id} x={} y={}",
                    canvas.x, canvas.y
                );
                EventOutcome::DragEnded {
                    id,
                    position: canvas,
                }
            }
        }
    }

    fn wheel<R, A>(
        &mut self,
        delta_y: f64,
        workspace: &mut WorkspaceState<R>,
        renderer: &mut A,
    ) -> EventOutcome
    where
        R: BlobRepository,
        A: RenderAdapter + ?Sized,
    {
        let zoom = zoom_delta(workspace.viewport().zoom(), delta_y);
        workspace.set_viewport(ViewportPatch::zoom(i64::from(zoom)));
        let layout = placements(workspace.snapshot(), self.base_note_size);
        renderer.redraw(workspace.viewport(), &layout);
        debug!("event=zoom module=canvas status=ok zoom={zoom}");
        EventOutcome::Zoomed(zoom)
    }

    fn create<R, A>(
        &mut self,
        viewport_size: ViewportSize,
        workspace: &mut WorkspaceState<R>,
        renderer: &mut A,
    ) -> EventOutcome
    where
        R: BlobRepository,
        A: RenderAdapter + ?Sized,
    {
        let size = note_display_size(self.base_note_size, workspace.viewport().zoom());
        let Some((id, note)) = workspace.create_note(viewport_size, size) else {
            return EventOutcome::Ignored;
        };
        let placement = NotePlacement::for_note(&note, workspace.viewport(), self.base_note_size);
        renderer.render_note(&note, placement);
        EventOutcome::NoteCreated(id)
    }
}
