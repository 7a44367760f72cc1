//! Workspace use-case service.
//!
//! # Responsibility
//! - Own the canonical notes, drawing order and viewport.
//! - Expose every mutation and schedule persistence after each one.
//!
//! # Invariants
//! - `set(drawing_order) == set(notes.keys())` at every public boundary.
//! - Operations on unknown note ids are silent no-ops.
//! - Zoom stays inside `[1, 250]`.
//! - Note positions and viewport offsets are always finite.
//! - A workspace only exists after `load`, so mutators never see unloaded
//!   state.

use crate::canvas::viewport::to_canvas;
use crate::config::WorkspaceConfig;
use crate::model::coords::{CanvasPoint, ScreenPoint, ViewportSize};
use crate::model::note::{DrawingOrder, Note, NoteCollection, NoteId};
use crate::model::snapshot::PersistedState;
use crate::model::viewport::{Viewport, ViewportPatch, DEFAULT_ZOOM};
use crate::persist::PersistenceGateway;
use crate::repo::blob_repo::BlobRepository;
use log::{debug, info, warn};
use rand::Rng;
use std::time::Instant;

/// Loaded, mutable workspace bound to one blob store.
pub struct WorkspaceState<R: BlobRepository> {
    state: PersistedState,
    gateway: PersistenceGateway<R>,
}

impl<R: BlobRepository> WorkspaceState<R> {
    /// Loads the workspace stored in `repo`.
    ///
    /// Never fails: unreadable parts fall back to defaults and the result
    /// always satisfies the collection/order invariant.
    pub fn load(repo: R, config: &WorkspaceConfig) -> Self {
        Self::load_from(PersistenceGateway::new(repo, config.save_debounce()))
    }

    /// Same as [`WorkspaceState::load`] with a caller-built gateway.
    pub fn load_from(mut gateway: PersistenceGateway<R>) -> Self {
        let stored = gateway.read();

        let Some(notes) = stored.notes else {
            let state = PersistedState::default();
            // Heal a missing or corrupt store right away.
            gateway.write(&state);
            info!("event=workspace_load module=service status=ok notes=0 initialized=true");
            return Self { state, gateway };
        };

        let order_was_missing = stored.drawing_order.is_none();
        let mut drawing_order = stored
            .drawing_order
            .unwrap_or_else(|| DrawingOrder::derive_from(&notes));
        let repaired = drawing_order.reconcile(&notes);
        if repaired {
            warn!(
                "event=workspace_load module=service status=repaired reason=drawing_order_mismatch"
            );
        }

        let (offset_x, offset_y) = stored.offset.unwrap_or((0.0, 0.0));
        let viewport = Viewport::new(
            offset_x,
            offset_y,
            stored.zoom.unwrap_or(i64::from(DEFAULT_ZOOM)),
        );

        let mut workspace = Self {
            state: PersistedState {
                notes,
                drawing_order,
                viewport,
            },
            gateway,
        };
        if order_was_missing || repaired {
            workspace.request_save();
        }

        info!(
            "event=workspace_load module=service status=ok notes={} order_derived={} zoom={}",
            workspace.state.notes.len(),
            order_was_missing,
            workspace.state.viewport.zoom()
        );
        workspace
    }

    pub fn notes(&self) -> &NoteCollection {
        &self.state.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.state.notes.get(id)
    }

    pub fn drawing_order(&self) -> &DrawingOrder {
        &self.state.drawing_order
    }

    pub fn viewport(&self) -> &Viewport {
        &self.state.viewport
    }

    pub fn snapshot(&self) -> &PersistedState {
        &self.state
    }

    /// Notes bottom-most first, ready for a full render pass.
    pub fn notes_in_drawing_order(&self) -> impl Iterator<Item = &Note> + '_ {
        self.state
            .drawing_order
            .ids()
            .iter()
            .filter_map(|id| self.state.notes.get(*id))
    }

    /// Creates an empty note at a random spot inside the visible viewport.
    ///
    /// Returns `None` when the id space is exhausted.
    pub fn create_note(
        &mut self,
        viewport_size: ViewportSize,
        note_size: f64,
    ) -> Option<(NoteId, Note)> {
        self.create_note_with_rng(&mut rand::rng(), viewport_size, note_size)
    }

    /// [`WorkspaceState::create_note`] with a caller-supplied random source.
    ///
    /// The note's screen-space top-left lands in
    /// `[0, width - note_size) x [0, height - note_size)`, each axis clamped to
    /// `0` when the viewport is smaller than the note, on whole pixels.
    pub fn create_note_with_rng<G: Rng>(
        &mut self,
        rng: &mut G,
        viewport_size: ViewportSize,
        note_size: f64,
    ) -> Option<(NoteId, Note)> {
        let Some(id) = self.state.notes.next_id() else {
            warn!("event=note_create module=service status=skipped reason=id_space_exhausted");
            return None;
        };
        let screen = ScreenPoint::new(
            random_offset(rng, viewport_size.width - note_size),
            random_offset(rng, viewport_size.height - note_size),
        );
        let mut canvas = to_canvas(screen, &self.state.viewport);
        if !is_finite_point(canvas) {
            canvas = to_canvas(ScreenPoint::new(0.0, 0.0), &self.state.viewport);
        }
        let note = Note::new(id, canvas.x, canvas.y);

        self.state.notes.insert(note.clone());
        self.state.drawing_order.move_to_top(id);
        self.request_save();

        debug!(
            "event=note_create module=service status=ok id={} x={} y={}",
            id, note.x, note.y
        );
        Some((id, note))
    }

    /// Replaces a note's text. Returns `false` for unknown ids.
    pub fn update_content(&mut self, id: NoteId, content: impl Into<String>) -> bool {
        let Some(note) = self.state.notes.get_mut(id) else {
            debug!("event=note_update module=service status=skipped reason=unknown_id id={id}");
            return false;
        };
        note.content = content.into();
        self.request_save();
        true
    }

    /// Stores a new canvas position and raises the note.
    ///
    /// Callers convert from screen space first (see `canvas::viewport::to_canvas`).
    /// Returns `false` for unknown ids and non-finite positions.
    pub fn update_position(&mut self, id: NoteId, position: CanvasPoint) -> bool {
        if !is_finite_point(position) {
            warn!("event=note_move module=service status=skipped reason=non_finite_position id={id}");
            return false;
        }
        let Some(note) = self.state.notes.get_mut(id) else {
            debug!("event=note_move module=service status=skipped reason=unknown_id id={id}");
            return false;
        };
        note.x = position.x;
        note.y = position.y;
        self.move_to_top(id);
        self.request_save();
        true
    }

    /// Makes `id` the topmost note. Idempotent; unknown ids are ignored.
    pub fn move_to_top(&mut self, id: NoteId) -> bool {
        if !self.state.notes.contains(id) {
            return false;
        }
        if self.state.drawing_order.top() != Some(id) {
            self.state.drawing_order.move_to_top(id);
            self.request_save();
        }
        true
    }

    /// Merges viewport fields; zoom is clamped, non-finite offsets are dropped.
    pub fn set_viewport(&mut self, patch: ViewportPatch) {
        self.state.viewport.apply(patch);
        self.request_save();
    }

    /// Arms (or re-arms) the debounced save.
    pub fn request_save(&mut self) {
        self.gateway.schedule_save();
    }

    pub fn has_pending_save(&self) -> bool {
        self.gateway.has_pending_save()
    }

    pub fn next_save_deadline(&self) -> Option<Instant> {
        self.gateway.next_deadline()
    }

    /// Writes state if the debounce window has elapsed. Call from the host loop.
    pub fn poll_persistence(&mut self) -> bool {
        self.poll_persistence_at(Instant::now())
    }

    pub fn poll_persistence_at(&mut self, now: Instant) -> bool {
        self.gateway.poll_at(now, &self.state)
    }

    /// Writes any pending save immediately.
    pub fn flush(&mut self) -> bool {
        self.gateway.flush(&self.state)
    }

    /// Flushes and hands the blob store back.
    pub fn close(mut self) -> R {
        self.flush();
        self.gateway.into_repository()
    }
}

fn is_finite_point(point: CanvasPoint) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

fn random_offset<G: Rng>(rng: &mut G, span: f64) -> f64 {
    if span > 0.0 && span.is_finite() {
        rng.random_range(0.0..span).floor()
    } else {
        0.0
    }
}
