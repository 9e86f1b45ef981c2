//! One editing replica: a cursor over a [`Content`] plus a Lamport clock.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Content, EditorId, EngineError, Event, EventKey, Moment, Timestamp, BACKSPACE_CHARACTER,
    ORIGIN_KEY,
};

/// Cursor position in the visible text, anchored to the event right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub position: usize,
    pub event_key: EventKey,
}

impl Cursor {
    pub const ORIGIN: Cursor = Cursor {
        position: 0,
        event_key: ORIGIN_KEY,
    };
}

/// State pushed to the listener after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorChange {
    pub editor_id: EditorId,
    pub content: String,
    pub cursor_position: usize,
    pub cursor_moment: Moment,
    pub timestamp: Timestamp,
    pub flat_sequence: Vec<Event>,
    pub final_sequence: Vec<Event>,
}

impl EditorChange {
    /// One-line status, e.g. `timestamp 5 - length 4 - cursor 4 r4`.
    pub fn summary(&self) -> String {
        format!(
            "timestamp {} - length {} - cursor {} {}",
            self.timestamp,
            self.final_sequence.len(),
            self.cursor_position,
            self.cursor_moment.label()
        )
    }
}

/// Receives engine state after each change. Called synchronously.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, change: &EditorChange);
}

pub struct Editor {
    editor_id: EditorId,
    current_timestamp: Timestamp,
    cursor: Cursor,
    content: Content,
    // Needed on every cursor move; recomputed whenever content changes.
    final_events_stream: Vec<Event>,
    listener: Option<Arc<dyn ChangeListener>>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("editor_id", &self.editor_id)
            .field("current_timestamp", &self.current_timestamp)
            .field("cursor", &self.cursor)
            .field("length", &self.final_events_stream.len())
            .finish()
    }
}

impl Editor {
    /// An editor nobody observes.
    pub fn new(editor_id: EditorId) -> Self {
        let content = Content::new();
        let final_events_stream = content.final_events();
        Self {
            editor_id,
            current_timestamp: 1,
            cursor: Cursor::ORIGIN,
            content,
            final_events_stream,
            listener: None,
        }
    }

    pub fn with_listener(editor_id: EditorId, listener: Arc<dyn ChangeListener>) -> Self {
        let mut editor = Self::new(editor_id);
        editor.listener = Some(listener);
        editor
    }

    pub fn editor_id(&self) -> EditorId {
        self.editor_id
    }

    pub fn current_timestamp(&self) -> Timestamp {
        self.current_timestamp
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn characters(&self) -> String {
        self.content.characters()
    }

    /// Length of the visible text.
    pub fn len(&self) -> usize {
        self.final_events_stream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.final_events_stream.is_empty()
    }

    fn next_event_key(&mut self, character: char) -> EventKey {
        let timestamp = self.current_timestamp;
        self.current_timestamp += 1;
        EventKey {
            moment: Moment {
                editor_id: self.editor_id,
                timestamp,
            },
            priority: EventKey::priority_for(character),
        }
    }

    fn add_to_content(&mut self, character: char) {
        let key = self.next_event_key(character);
        self.content.add_event(&Event {
            key,
            cause: self.cursor.event_key,
            character,
        });
        self.final_events_stream = self.content.final_events();
        self.notify_change();
    }

    /// Type `character` at the cursor. A backspace erases the character
    /// before the cursor instead.
    pub fn insert_character(&mut self, character: char) {
        self.add_to_content(character);
        if character == BACKSPACE_CHARACTER {
            self.move_cursor_left();
        } else {
            self.move_cursor_right();
        }
    }

    pub fn remove_previous_character(&mut self) {
        self.insert_character(BACKSPACE_CHARACTER);
    }

    fn update_cursor_event_key(&mut self) {
        self.cursor.event_key = match self.cursor.position {
            0 => ORIGIN_KEY,
            position => match self.final_events_stream.get(position - 1) {
                Some(event) => event.key,
                None => self.cursor.event_key,
            },
        };
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor.position = (self.cursor.position + 1).min(self.final_events_stream.len());
        self.update_cursor_event_key();
        self.notify_change();
    }

    /// No-op at the start of the text.
    pub fn move_cursor_left(&mut self) {
        if self.cursor.position >= 1 {
            self.cursor.position -= 1;
            self.update_cursor_event_key();
            self.notify_change();
        }
    }

    /// Drop all content. The clock keeps running.
    pub fn clear(&mut self) {
        self.content = Content::new();
        self.final_events_stream = self.content.final_events();
        self.cursor = Cursor::ORIGIN;
        self.notify_change();
    }

    // The anchor may have moved after a merge; the position follows it.
    fn relocate_cursor(&mut self) {
        if let Some(index) = self
            .final_events_stream
            .iter()
            .position(|event| event.key == self.cursor.event_key)
        {
            self.cursor.position = index + 1;
        }
    }

    /// Merge the full event history of `sender` into this editor.
    pub fn receive_events_from(&mut self, sender: &Editor) -> Result<(), EngineError> {
        let history = sender.content.encode_events()?;
        let added = self.content.apply_encoded_events(&history)?;
        self.final_events_stream = self.content.final_events();
        self.relocate_cursor();
        self.current_timestamp = 1 + sender.current_timestamp.max(self.current_timestamp);
        log::trace!(
            "Editor {} received {added} new events from editor {}",
            self.editor_id,
            sender.editor_id
        );
        self.notify_change();
        Ok(())
    }

    pub fn send_events_to(&self, recipient: &mut Editor) -> Result<(), EngineError> {
        recipient.receive_events_from(self)
    }

    /// Snapshot of the state a listener would receive.
    pub fn change(&self) -> EditorChange {
        EditorChange {
            editor_id: self.editor_id,
            content: self.content.characters(),
            cursor_position: self.cursor.position,
            cursor_moment: self.cursor.event_key.moment,
            timestamp: self.current_timestamp,
            flat_sequence: self.content.flatten_all().into_iter().copied().collect(),
            final_sequence: self.final_events_stream.clone(),
        }
    }

    fn notify_change(&self) {
        let Some(listener) = &self.listener else {
            return;
        };
        let change = self.change();
        log::trace!("Editor {}: {}", self.editor_id, change.summary());
        listener.on_change(&change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<EditorChange>>);

    impl ChangeListener for Collect {
        fn on_change(&self, change: &EditorChange) {
            self.0.lock().unwrap().push(change.clone());
        }
    }

    fn type_text(editor: &mut Editor, text: &str) {
        for character in text.chars() {
            editor.insert_character(character);
        }
    }

    #[test]
    fn test_typing_advances_cursor() {
        let mut editor = Editor::new(0);
        type_text(&mut editor, "Rust");
        assert_eq!(editor.characters(), "Rust");
        assert_eq!(editor.cursor().position, 4);
        assert_eq!(editor.current_timestamp(), 5);
    }

    #[test]
    fn test_insert_in_the_middle() {
        let mut editor = Editor::new(0);
        type_text(&mut editor, "abc");
        editor.move_cursor_left();
        editor.move_cursor_left();
        editor.insert_character('X');
        assert_eq!(editor.characters(), "aXbc");
        assert_eq!(editor.cursor().position, 2);
    }

    #[test]
    fn test_backspace_removes_previous_character() {
        let mut editor = Editor::new(0);
        type_text(&mut editor, "ab");
        editor.remove_previous_character();
        editor.insert_character('c');
        assert_eq!(editor.characters(), "ac");
        assert_eq!(editor.cursor().position, 2);
    }

    #[test]
    fn test_backspace_at_start_is_harmless() {
        let mut editor = Editor::new(0);
        editor.remove_previous_character();
        editor.insert_character('a');
        assert_eq!(editor.characters(), "a");
        assert_eq!(editor.cursor().position, 1);
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut editor = Editor::new(0);
        editor.move_cursor_left();
        assert_eq!(editor.cursor(), Cursor::ORIGIN);
        type_text(&mut editor, "ab");
        editor.move_cursor_right();
        editor.move_cursor_right();
        assert_eq!(editor.cursor().position, 2);
    }

    #[test]
    fn test_clear_resets_content_but_not_clock() {
        let mut editor = Editor::new(0);
        type_text(&mut editor, "abc");
        editor.clear();
        assert!(editor.is_empty());
        assert_eq!(editor.cursor(), Cursor::ORIGIN);
        assert_eq!(editor.current_timestamp(), 4);
    }

    #[test]
    fn test_concurrent_edits_converge() {
        let mut alice = Editor::new(0);
        let mut bob = Editor::new(1);
        type_text(&mut alice, "hi");
        type_text(&mut bob, "yo");

        alice.send_events_to(&mut bob).unwrap();
        bob.send_events_to(&mut alice).unwrap();

        assert_eq!(alice.characters(), "hiyo");
        assert_eq!(bob.characters(), "hiyo");
        // Each cursor stays after the text its owner typed.
        assert_eq!(alice.cursor().position, 2);
        assert_eq!(bob.cursor().position, 4);
    }

    fn three_typed_editors() -> [Editor; 3] {
        let mut editors = [Editor::new(0), Editor::new(1), Editor::new(2)];
        for (editor, text) in editors.iter_mut().zip(["hi", "yo", "zz"]) {
            type_text(editor, text);
        }
        editors
    }

    fn exchange(editors: &mut [Editor; 3], order: &[(usize, usize)]) {
        for &(from, to) in order {
            let sender = std::mem::replace(&mut editors[from], Editor::new(EditorId::MAX));
            sender.send_events_to(&mut editors[to]).unwrap();
            editors[from] = sender;
        }
    }

    #[test]
    fn test_exchange_order_does_not_matter() {
        let mut forward = three_typed_editors();
        exchange(&mut forward, &[(0, 1), (1, 2), (2, 0), (0, 1)]);

        let mut backward = three_typed_editors();
        exchange(&mut backward, &[(2, 1), (1, 0), (0, 2), (2, 1)]);

        for editor in forward.iter().chain(backward.iter()) {
            assert_eq!(editor.characters(), "hiyozz");
        }
    }

    #[test]
    fn test_receive_advances_clock() {
        let mut sender = Editor::new(0);
        let mut recipient = Editor::new(1);
        type_text(&mut sender, "abcdef");
        recipient.receive_events_from(&sender).unwrap();
        assert_eq!(recipient.current_timestamp(), 8);
    }

    #[test]
    fn test_empty_sender_leaves_content_alone() {
        let empty = Editor::new(5);
        let mut recipient = Editor::new(6);
        type_text(&mut recipient, "xyz");
        empty.send_events_to(&mut recipient).unwrap();
        assert_eq!(recipient.characters(), "xyz");
        assert_eq!(recipient.cursor().position, 3);
        assert_eq!(recipient.current_timestamp(), 5);
    }

    #[test]
    fn test_listener_sees_every_change() {
        let listener = Arc::new(Collect::default());
        let mut editor = Editor::with_listener(2, listener.clone());
        editor.insert_character('J');

        let changes = listener.0.lock().unwrap();
        // One for the new event, one for the cursor move.
        assert_eq!(changes.len(), 2);
        let last = changes.last().unwrap();
        assert_eq!(last.content, "J");
        assert_eq!(last.cursor_position, 1);
        let anchor = Moment {
            editor_id: 2,
            timestamp: 1,
        };
        assert_eq!(last.cursor_moment, anchor);
        assert_eq!(last.summary(), "timestamp 2 - length 1 - cursor 1 j1");
    }
}
