//! # tandem-core: causal-tree text engine
//!
//! Every keystroke becomes an immutable [`Event`] that names the event it was
//! typed after (its *cause*). The document is the depth-first flattening of
//! that tree, with backspace events erasing their cause.
//!
//! ```text
//!            origin
//!           /      \
//!         'R'      'x'   (newer siblings come first)
//!          |
//!         'u' ── '\b'    (backspace erases 'u')
//! ```
//!
//! Two engines converge by exchanging their event sets: merging is a set
//! union, so order and repetition of exchanges do not matter.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub mod content;
pub mod editor;

pub use content::Content;
pub use editor::{ChangeListener, Cursor, Editor, EditorChange};

pub type EditorId = i32;
pub type Timestamp = u32;

/// Typed as a character, erases the character before the cursor.
pub const BACKSPACE_CHARACTER: char = '\x08';
pub const ORIGIN_CHARACTER: char = '\t';

const VERY_LARGE_PRIORITY: u32 = 1000;
const BACKSPACE_PRIORITY: u32 = 2;
const CHARACTER_PRIORITY: u32 = 1;

/// Single-letter tag used when printing which editor produced a moment.
pub fn editor_id_to_letter(editor_id: EditorId) -> char {
    match editor_id {
        0 => 'r',
        1 => 'w',
        2 => 'j',
        _ => '.',
    }
}

/// Logical time of an event: who produced it and at which local tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Moment {
    pub editor_id: EditorId,
    pub timestamp: Timestamp,
}

impl Moment {
    pub fn label(&self) -> String {
        format!("{}{}", editor_id_to_letter(self.editor_id), self.timestamp)
    }
}

impl PartialOrd for Moment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Moment {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.timestamp == other.timestamp {
            self.editor_id.cmp(&other.editor_id)
        } else {
            // Newest first
            other.timestamp.cmp(&self.timestamp)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub moment: Moment,
    pub priority: u32,
}

impl EventKey {
    /// Priority a freshly typed `character` gets. Backspaces outrank
    /// characters so they sort right behind the event they erase.
    pub fn priority_for(character: char) -> u32 {
        match character {
            BACKSPACE_CHARACTER => BACKSPACE_PRIORITY,
            _ => CHARACTER_PRIORITY,
        }
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.priority == other.priority {
            self.moment.cmp(&other.moment)
        } else {
            // Highest priority first
            other.priority.cmp(&self.priority)
        }
    }
}

pub const ORIGIN_MOMENT: Moment = Moment {
    editor_id: -1,
    timestamp: 0,
};

pub const ORIGIN_KEY: EventKey = EventKey {
    moment: ORIGIN_MOMENT,
    priority: VERY_LARGE_PRIORITY,
};

/// One keystroke. Identity and ordering come from `key` alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Event {
    pub key: EventKey,
    pub cause: EventKey,
    pub character: char,
}

impl Event {
    pub fn is_backspace(&self) -> bool {
        self.character == BACKSPACE_CHARACTER
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Root of every causal tree. It is its own cause.
pub const ORIGIN_EVENT: Event = Event {
    key: ORIGIN_KEY,
    cause: ORIGIN_KEY,
    character: ORIGIN_CHARACTER,
};

/// Errors raised while moving event histories between engines.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Encode(String),
    Decode(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "Failed to encode event history: {e}"),
            Self::Decode(e) => write!(f, "Failed to decode event history: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
