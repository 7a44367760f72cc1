//! Durable workspace snapshots.
//!
//! # Responsibility
//! - Encode/decode the persisted state as four named blobs.
//! - Own the debounced save deadline.
//!
//! # Invariants
//! - Unreadable or unparsable blobs decode to `None`; nothing here fails a load.
//! - A failed write is logged and dropped; the next save retries with newer state.

mod debounce;
mod gateway;

pub use debounce::SaveDebouncer;
pub use gateway::{
    PersistenceGateway, StoredSnapshot, DRAWING_ORDER_KEY, NOTES_KEY, VIEWPORT_OFFSET_KEY,
    VIEWPORT_ZOOM_KEY,
};
