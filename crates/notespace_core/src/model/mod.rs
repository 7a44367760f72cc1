//! Workspace domain model.
//!
//! # Responsibility
//! - Define the canonical note, drawing order and viewport records.
//! - Keep coordinate spaces apart with distinct point types.
//!
//! # Invariants
//! - Note ids are integers `>= 1` and never reused inside one collection.
//! - Viewport zoom is always inside `[MIN_ZOOM, MAX_ZOOM]`.

pub mod coords;
pub mod note;
pub mod snapshot;
pub mod viewport;
