//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model mutations and persistence into workspace operations.
//! - Keep host UI layers decoupled from storage details.

pub mod workspace;
