//! Key-value blob repositories.
//!
//! # Responsibility
//! - Define the opaque get/set text-blob contract the workspace persists through.
//! - Isolate SQLite details from the persistence gateway.
//!
//! # Invariants
//! - Repositories never interpret blob contents.
//! - Multi-blob writes are applied as one unit where the backend allows it.

pub mod blob_repo;
