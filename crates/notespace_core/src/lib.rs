//! Core state model for the Notespace infinite-canvas sticky-note workspace.
//! This crate is the single source of truth for workspace invariants.

pub mod canvas;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;
pub mod service;

pub use canvas::interaction::{
    EventOutcome, GestureState, InputEvent, InteractionStateMachine, PointerTarget,
};
pub use canvas::render::{placements, NotePlacement, RenderAdapter};
pub use canvas::viewport::{note_display_size, to_canvas, to_screen, zoom_delta};
pub use config::WorkspaceConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::coords::{CanvasPoint, ScreenPoint, ViewportSize};
pub use model::note::{DrawingOrder, Note, NoteCollection, NoteId};
pub use model::snapshot::PersistedState;
pub use model::viewport::{Viewport, ViewportPatch, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
pub use persist::PersistenceGateway;
pub use repo::blob_repo::{
    BlobRepository, MemoryBlobRepository, RepoError, RepoResult, SqliteBlobRepository,
};
pub use service::workspace::WorkspaceState;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
