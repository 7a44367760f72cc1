//! Note records, the note collection and the drawing order.
//!
//! # Responsibility
//! - Define `Note` and its integer identity `NoteId`.
//! - Provide the id-keyed `NoteCollection` and the z-ordered `DrawingOrder`.
//!
//! # Invariants
//! - `NoteId` values are `>= 1`; `0` and non-numeric text never parse.
//! - `DrawingOrder` never holds the same id twice; last element is topmost.
//! - Keeping `DrawingOrder` in set-equality with `NoteCollection` is the
//!   workspace's job; `DrawingOrder::reconcile` is the repair primitive.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Stable integer identity of a note.
///
/// Serialized as decimal text so it can key JSON objects and match the
/// string-typed drawing order blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(u64);

impl NoteId {
    /// First id handed out in an empty workspace.
    pub const FIRST: NoteId = NoteId(1);

    /// Returns `None` for `0`, which is never a valid id.
    pub fn new(value: u64) -> Option<Self> {
        (value >= 1).then_some(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Next id in allocation order; `None` once `u64::MAX` is taken.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error for text that is not a valid note id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteIdParseError(String);

impl Display for NoteIdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid note id `{}`", self.0)
    }
}

impl Error for NoteIdParseError {}

impl FromStr for NoteId {
    type Err = NoteIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(NoteId::new)
            .ok_or_else(|| NoteIdParseError(s.to_string()))
    }
}

impl Serialize for NoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One sticky note.
///
/// `x`/`y` are canvas-space coordinates and do not change when the viewport
/// pans or zooms.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub x: f64,
    pub y: f64,
}

impl Note {
    /// Creates an empty note at the given canvas position.
    pub fn new(id: NoteId, x: f64, y: f64) -> Self {
        Self {
            id,
            content: String::new(),
            x,
            y,
        }
    }
}

/// Id-keyed set of notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteCollection {
    notes: BTreeMap<NoteId, Note>,
}

impl NoteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.contains_key(&id)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.get_mut(&id)
    }

    /// Inserts or replaces the note stored under `note.id`.
    pub fn insert(&mut self, note: Note) {
        self.notes.insert(note.id, note);
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.notes.keys().copied()
    }

    /// Notes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// `max(existing ids) + 1`, or `1` when empty.
    ///
    /// `None` when the largest id is `u64::MAX`; ids are never reused.
    pub fn next_id(&self) -> Option<NoteId> {
        match self.notes.keys().next_back() {
            Some(max) => max.next(),
            None => Some(NoteId::FIRST),
        }
    }
}

impl FromIterator<Note> for NoteCollection {
    fn from_iter<T: IntoIterator<Item = Note>>(iter: T) -> Self {
        Self {
            notes: iter.into_iter().map(|note| (note.id, note)).collect(),
        }
    }
}

/// Paint order of notes; the last id is drawn on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingOrder {
    ids: Vec<NoteId>,
}

impl DrawingOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an order from raw ids, keeping the first occurrence of each.
    pub fn from_ids(ids: impl IntoIterator<Item = NoteId>) -> Self {
        let mut seen = HashSet::new();
        Self {
            ids: ids.into_iter().filter(|id| seen.insert(*id)).collect(),
        }
    }

    /// Order derived from collection keys (ascending id).
    pub fn derive_from(notes: &NoteCollection) -> Self {
        Self {
            ids: notes.ids().collect(),
        }
    }

    pub fn ids(&self) -> &[NoteId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.ids.contains(&id)
    }

    /// Topmost id, if any.
    pub fn top(&self) -> Option<NoteId> {
        self.ids.last().copied()
    }

    /// Removes `id` if present and appends it at the end.
    pub fn move_to_top(&mut self, id: NoteId) {
        self.ids.retain(|current| *current != id);
        self.ids.push(id);
    }

    /// Ids as decimal strings, matching the persisted representation.
    pub fn to_strings(&self) -> Vec<String> {
        self.ids.iter().map(NoteId::to_string).collect()
    }

    /// Repairs this order against `notes`.
    ///
    /// Unknown and duplicate ids are dropped, ids missing from the order are
    /// appended in ascending order. Returns `true` when anything changed.
    pub fn reconcile(&mut self, notes: &NoteCollection) -> bool {
        let before = self.ids.len();
        let mut seen = HashSet::with_capacity(before);
        self.ids.retain(|id| notes.contains(*id) && seen.insert(*id));
        let mut changed = self.ids.len() != before;

        for id in notes.ids() {
            if !seen.contains(&id) {
                self.ids.push(id);
                changed = true;
            }
        }
        changed
    }

    /// Whether this order and `notes` hold exactly the same ids.
    pub fn matches(&self, notes: &NoteCollection) -> bool {
        self.ids.len() == notes.len() && self.ids.iter().all(|id| notes.contains(*id))
    }
}
