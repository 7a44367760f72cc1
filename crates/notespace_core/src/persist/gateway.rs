//! Blob codec and debounced writer for `PersistedState`.
//!
//! # Responsibility
//! - Map the workspace snapshot onto four independently keyed JSON blobs.
//! - Swallow store/codec failures: reads degrade to `None`, writes are dropped.
//! - Collapse bursts of save requests into one write of the latest state.
//!
//! # Blob layout
//! - `notes`: `{"<id>": {"content": "...", "x": 0.0, "y": 0.0}}`
//! - `drawingOrder`: `["1", "2"]`
//! - `viewportOffset`: `{"x": 0.0, "y": 0.0}`
//! - `viewportZoom`: `100`

use super::debounce::SaveDebouncer;
use crate::model::note::{DrawingOrder, Note, NoteCollection, NoteId};
use crate::model::snapshot::PersistedState;
use crate::repo::blob_repo::BlobRepository;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub const NOTES_KEY: &str = "notes";
pub const DRAWING_ORDER_KEY: &str = "drawingOrder";
pub const VIEWPORT_OFFSET_KEY: &str = "viewportOffset";
pub const VIEWPORT_ZOOM_KEY: &str = "viewportZoom";

#[derive(Debug, Serialize, Deserialize)]
struct StoredNote {
    content: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredOffset {
    x: f64,
    y: f64,
}

/// Raw decode result; every part is independently optional.
///
/// `None` means the blob was absent, unreadable, or unparsable. Turning this
/// into a valid workspace is the caller's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredSnapshot {
    pub notes: Option<NoteCollection>,
    pub drawing_order: Option<DrawingOrder>,
    pub offset: Option<(f64, f64)>,
    pub zoom: Option<i64>,
}

/// Reads and writes workspace snapshots through a `BlobRepository`.
pub struct PersistenceGateway<R: BlobRepository> {
    repo: R,
    debouncer: SaveDebouncer,
}

impl<R: BlobRepository> PersistenceGateway<R> {
    pub fn new(repo: R, save_delay: Duration) -> Self {
        Self {
            repo,
            debouncer: SaveDebouncer::new(save_delay),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Gives the backend back. Any pending save is discarded; flush first.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Reads all four blobs.
    pub fn read(&self) -> StoredSnapshot {
        StoredSnapshot {
            notes: self.read_blob(NOTES_KEY).and_then(|raw| decode_notes(&raw)),
            drawing_order: self
                .read_blob(DRAWING_ORDER_KEY)
                .and_then(|raw| decode_blob::<DrawingOrder>(DRAWING_ORDER_KEY, &raw)),
            offset: self
                .read_blob(VIEWPORT_OFFSET_KEY)
                .and_then(|raw| decode_blob::<StoredOffset>(VIEWPORT_OFFSET_KEY, &raw))
                .map(|offset| (offset.x, offset.y)),
            zoom: self
                .read_blob(VIEWPORT_ZOOM_KEY)
                .and_then(|raw| decode_zoom(&raw)),
        }
    }

    /// Writes `state` immediately, cancelling any pending deadline.
    ///
    /// Returns whether the store accepted the write.
    pub fn write(&mut self, state: &PersistedState) -> bool {
        self.debouncer.cancel();

        let entries = match encode(state) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("event=state_save module=persist status=error error_code=encode_failed error={err}");
                return false;
            }
        };

        match self.repo.set_blobs(&entries) {
            Ok(()) => {
                debug!(
                    "event=state_save module=persist status=ok notes={} bytes={}",
                    state.notes.len(),
                    entries.iter().map(|(_, value)| value.len()).sum::<usize>()
                );
                true
            }
            Err(err) => {
                warn!("event=state_save module=persist status=error error_code=store_write_failed error={err}");
                false
            }
        }
    }

    /// Requests a save; repeated calls inside the window collapse into one.
    pub fn schedule_save(&mut self) {
        self.schedule_save_at(Instant::now());
    }

    pub fn schedule_save_at(&mut self, now: Instant) {
        self.debouncer.schedule_at(now);
    }

    pub fn has_pending_save(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// When the host loop should next call `poll_at`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Writes `state` if the pending deadline has passed at `now`.
    pub fn poll_at(&mut self, now: Instant, state: &PersistedState) -> bool {
        if self.debouncer.take_due_at(now) {
            self.write(state)
        } else {
            false
        }
    }

    /// Writes `state` right away if a save is pending.
    pub fn flush(&mut self, state: &PersistedState) -> bool {
        if self.debouncer.is_pending() {
            self.write(state)
        } else {
            false
        }
    }

    fn read_blob(&self, key: &str) -> Option<String> {
        match self.repo.get_blob(key) {
            Ok(value) => value,
            Err(err) => {
                warn!("event=state_load module=persist status=error error_code=store_read_failed key={key} error={err}");
                None
            }
        }
    }
}

fn encode(state: &PersistedState) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    let notes: BTreeMap<NoteId, StoredNote> = state
        .notes
        .iter()
        .map(|note| {
            (
                note.id,
                StoredNote {
                    content: note.content.clone(),
                    x: note.x,
                    y: note.y,
                },
            )
        })
        .collect();
    let offset = StoredOffset {
        x: state.viewport.offset_x,
        y: state.viewport.offset_y,
    };

    Ok(vec![
        (NOTES_KEY, serde_json::to_string(&notes)?),
        (DRAWING_ORDER_KEY, serde_json::to_string(&state.drawing_order)?),
        (VIEWPORT_OFFSET_KEY, serde_json::to_string(&offset)?),
        (VIEWPORT_ZOOM_KEY, state.viewport.zoom().to_string()),
    ])
}

fn decode_blob<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("event=state_load module=persist status=error error_code=blob_corrupt key={key} error={err}");
            None
        }
    }
}

/// Decodes the notes blob entry by entry.
///
/// Only a blob that is not a JSON object counts as corrupt. A single bad
/// entry (invalid id, wrong shape, non-finite position) is skipped so the
/// rest of the workspace survives.
fn decode_notes(raw: &str) -> Option<NoteCollection> {
    let stored = decode_blob::<BTreeMap<String, serde_json::Value>>(NOTES_KEY, raw)?;
    let mut skipped = 0usize;
    let notes: NoteCollection = stored
        .into_iter()
        .filter_map(|(key, value)| {
            let note = decode_note_entry(&key, value);
            if note.is_none() {
                skipped += 1;
                warn!("event=state_load module=persist status=error error_code=note_corrupt key={NOTES_KEY} id={key}");
            }
            note
        })
        .collect();
    if skipped > 0 {
        debug!("event=state_load module=persist status=repaired skipped_notes={skipped}");
    }
    Some(notes)
}

fn decode_note_entry(key: &str, value: serde_json::Value) -> Option<Note> {
    let id = key.parse::<NoteId>().ok()?;
    let note = serde_json::from_value::<StoredNote>(value).ok()?;
    if !(note.x.is_finite() && note.y.is_finite()) {
        return None;
    }
    Some(Note {
        id,
        content: note.content,
        x: note.x,
        y: note.y,
    })
}

fn decode_zoom(raw: &str) -> Option<i64> {
    let value = decode_blob::<f64>(VIEWPORT_ZOOM_KEY, raw)?;
    if value.is_finite() {
        // Saturating cast; the viewport clamps afterwards.
        Some(value.round() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PersistenceGateway, StoredSnapshot, DRAWING_ORDER_KEY, NOTES_KEY, VIEWPORT_OFFSET_KEY,
        VIEWPORT_ZOOM_KEY,
    };
    use crate::model::note::{DrawingOrder, Note, NoteCollection, NoteId};
    use crate::model::snapshot::PersistedState;
    use crate::model::viewport::Viewport;
    use crate::repo::blob_repo::{BlobRepository, MemoryBlobRepository};
    use std::time::{Duration, Instant};

    fn sample_state() -> PersistedState {
        let first = NoteId::FIRST;
        let second = NoteId::new(2).expect("non-zero id");
        let mut note = Note::new(first, 12.0, 34.0);
        note.content = "hello".to_string();
        let notes: NoteCollection = [note, Note::new(second, 5.0, 6.0)].into_iter().collect();
        PersistedState {
            notes,
            drawing_order: DrawingOrder::from_ids([second, first]),
            viewport: Viewport::new(30.0, -10.0, 140),
        }
    }

    #[test]
    fn write_then_read_returns_same_parts() {
        let state = sample_state();
        let mut gateway = PersistenceGateway::new(MemoryBlobRepository::new(), Duration::ZERO);
        assert!(gateway.write(&state));

        let stored = gateway.read();
        assert_eq!(stored.notes.as_ref(), Some(&state.notes));
        assert_eq!(stored.drawing_order.as_ref(), Some(&state.drawing_order));
        assert_eq!(stored.offset, Some((30.0, -10.0)));
        assert_eq!(stored.zoom, Some(140));
    }

    #[test]
    fn blobs_use_documented_layout() {
        let mut gateway = PersistenceGateway::new(MemoryBlobRepository::new(), Duration::ZERO);
        gateway.write(&sample_state());
        let repo = gateway.repository();

        let notes: serde_json::Value =
            serde_json::from_str(repo.raw(NOTES_KEY).expect("notes blob")).expect("json");
        assert_eq!(notes["1"]["content"], "hello");
        assert_eq!(notes["2"]["x"], 5.0);
        assert_eq!(repo.raw(DRAWING_ORDER_KEY), Some(r#"["2","1"]"#));
        assert_eq!(repo.raw(VIEWPORT_OFFSET_KEY), Some(r#"{"x":30.0,"y":-10.0}"#));
        assert_eq!(repo.raw(VIEWPORT_ZOOM_KEY), Some("140"));
    }

    #[test]
    fn corrupt_blobs_decode_to_none_independently() {
        let mut repo = MemoryBlobRepository::new();
        repo.set_blob(NOTES_KEY, "{not json").expect("seed");
        repo.set_blob(DRAWING_ORDER_KEY, r#"["1","0"]"#).expect("seed");
        repo.set_blob(VIEWPORT_OFFSET_KEY, r#"{"x":1.0,"y":2.0}"#).expect("seed");
        repo.set_blob(VIEWPORT_ZOOM_KEY, "lots").expect("seed");

        let stored = PersistenceGateway::new(repo, Duration::ZERO).read();
        assert_eq!(stored.notes, None);
        assert_eq!(stored.drawing_order, None);
        assert_eq!(stored.offset, Some((1.0, 2.0)));
        assert_eq!(stored.zoom, None);
    }

    #[test]
    fn bad_note_entries_are_skipped_not_fatal() {
        let mut repo = MemoryBlobRepository::new();
        repo.set_blob(
            NOTES_KEY,
            r#"{"1":{"content":"keep me","x":1.0,"y":2.0},"2":{"content":"","x":null,"y":0.0},"0":{"content":"","x":0.0,"y":0.0},"abc":{"content":"","x":0.0,"y":0.0},"3":"nope"}"#,
        )
        .expect("seed");

        let notes = PersistenceGateway::new(repo, Duration::ZERO)
            .read()
            .notes
            .expect("object blob decodes");
        assert_eq!(notes.len(), 1);
        let kept = notes.get(NoteId::FIRST).expect("note 1 kept");
        assert_eq!(kept.content, "keep me");
        assert_eq!((kept.x, kept.y), (1.0, 2.0));
    }

    #[test]
    fn unavailable_store_reads_as_empty() {
        let mut repo = MemoryBlobRepository::new();
        repo.set_fail_reads(true);
        let stored = PersistenceGateway::new(repo, Duration::ZERO).read();
        assert_eq!(stored, StoredSnapshot::default());
    }

    #[test]
    fn burst_of_saves_produces_single_write_of_latest_state() {
        let start = Instant::now();
        let delay = Duration::from_millis(50);
        let mut gateway = PersistenceGateway::new(MemoryBlobRepository::new(), delay);
        let mut state = sample_state();

        for step in 0..5u64 {
            state.viewport.offset_x = step as f64;
            gateway.schedule_save_at(start + Duration::from_millis(step * 10));
            assert!(!gateway.poll_at(start + Duration::from_millis(step * 10 + 5), &state));
        }
        assert_eq!(gateway.repository().write_count(), 0);

        assert!(gateway.poll_at(start + Duration::from_millis(40) + delay, &state));
        assert_eq!(gateway.repository().write_count(), 1);
        assert_eq!(gateway.read().offset, Some((4.0, -10.0)));
        assert!(!gateway.has_pending_save());
    }

    #[test]
    fn failed_write_is_dropped_without_panicking() {
        let mut repo = MemoryBlobRepository::new();
        repo.set_fail_writes(true);
        let mut gateway = PersistenceGateway::new(repo, Duration::ZERO);
        gateway.schedule_save();
        assert!(!gateway.flush(&sample_state()));
        assert!(!gateway.has_pending_save());
    }
}
