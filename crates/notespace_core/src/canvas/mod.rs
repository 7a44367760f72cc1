//! Canvas interaction: coordinate transforms and the gesture state machine.
//!
//! # Responsibility
//! - Convert between canvas and screen space for the current viewport.
//! - Turn raw pointer, wheel, edit and create input into workspace mutations.
//! - Define the `RenderAdapter` boundary the host UI implements.
//!
//! # Invariants
//! - Panning and dragging never overlap; gestures start only from `Idle`.

pub mod interaction;
pub mod render;
pub mod viewport;
