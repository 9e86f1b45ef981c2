//! Editor proxy: a small command surface over an editing engine.
//!
//! The proxy owns one engine instance and a mirror of the display state.
//! It never writes the mirror itself; the engine pushes every change through
//! the [`ChangeListener`] the proxy registers at construction.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;
use tandem_core::{
    ChangeListener, Editor, EditorChange, EditorId, Event, Moment, Timestamp,
    BACKSPACE_CHARACTER, ORIGIN_MOMENT,
};

use crate::error::CollabError;
use crate::ids::IdAllocator;

/// Commands an editing engine has to accept.
pub trait EditingEngine: Send {
    fn insert_character(&mut self, character: char) -> Result<(), CollabError>;

    fn remove_previous_character(&mut self) -> Result<(), CollabError> {
        self.insert_character(BACKSPACE_CHARACTER)
    }

    fn move_cursor_right(&mut self) -> Result<(), CollabError>;
    fn move_cursor_left(&mut self) -> Result<(), CollabError>;
    fn clear(&mut self) -> Result<(), CollabError>;

    /// Replicate this engine's history into `recipient`.
    fn send_events_to(&self, recipient: &mut Self) -> Result<(), CollabError>;
}

/// Builds engine instances bound to a proxy's listener.
pub trait EngineFactory {
    type Engine: EditingEngine;

    fn create(
        &self,
        editor_id: EditorId,
        listener: Arc<dyn ChangeListener>,
    ) -> Result<Self::Engine, CollabError>;
}

/// Factory for the causal-tree engine from `tandem-core`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CausalTreeFactory;

impl EngineFactory for CausalTreeFactory {
    type Engine = Editor;

    fn create(
        &self,
        editor_id: EditorId,
        listener: Arc<dyn ChangeListener>,
    ) -> Result<Editor, CollabError> {
        Ok(Editor::with_listener(editor_id, listener))
    }
}

impl EditingEngine for Editor {
    fn insert_character(&mut self, character: char) -> Result<(), CollabError> {
        Editor::insert_character(self, character);
        Ok(())
    }

    fn remove_previous_character(&mut self) -> Result<(), CollabError> {
        Editor::remove_previous_character(self);
        Ok(())
    }

    fn move_cursor_right(&mut self) -> Result<(), CollabError> {
        Editor::move_cursor_right(self);
        Ok(())
    }

    fn move_cursor_left(&mut self) -> Result<(), CollabError> {
        Editor::move_cursor_left(self);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CollabError> {
        Editor::clear(self);
        Ok(())
    }

    fn send_events_to(&self, recipient: &mut Self) -> Result<(), CollabError> {
        Ok(Editor::send_events_to(self, recipient)?)
    }
}

/// Display state mirrored from the engine. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirroredState {
    pub content: String,
    pub cursor_position: usize,
    /// Who produced the event the cursor sits after, and when.
    pub cursor_moment: Moment,
    pub timestamp: Timestamp,
    pub flat_sequence: Vec<Event>,
    pub final_sequence: Vec<Event>,
    /// Number of changes received so far.
    pub version: u64,
}

impl Default for MirroredState {
    fn default() -> Self {
        Self {
            content: String::new(),
            cursor_position: 0,
            cursor_moment: ORIGIN_MOMENT,
            timestamp: 0,
            flat_sequence: Vec::new(),
            final_sequence: Vec::new(),
            version: 0,
        }
    }
}

struct MirrorListener {
    state: Arc<RwLock<MirroredState>>,
}

impl ChangeListener for MirrorListener {
    fn on_change(&self, change: &EditorChange) {
        // A writer that panicked mid-update still leaves a usable state; the
        // next change overwrites every field.
        let mut state = self.state.write().unwrap_or_else(|poisoned| {
            log::warn!("Mirror for editor {} was poisoned, recovering", change.editor_id);
            poisoned.into_inner()
        });
        state.content.clone_from(&change.content);
        state.cursor_position = change.cursor_position;
        state.cursor_moment = change.cursor_moment;
        state.timestamp = change.timestamp;
        state.flat_sequence.clone_from(&change.flat_sequence);
        state.final_sequence.clone_from(&change.final_sequence);
        state.version += 1;
    }
}

/// A proxy shared between a group and whoever drives it.
pub type EditorHandle<E> = Arc<Mutex<EditorProxy<E>>>;

/// Lock a shared proxy, turning poisoning into an error.
pub fn lock_editor<E: EditingEngine>(
    handle: &EditorHandle<E>,
) -> Result<MutexGuard<'_, EditorProxy<E>>, CollabError> {
    handle
        .lock()
        .map_err(|e| CollabError::LockPoisoned(e.to_string()))
}

pub struct EditorProxy<E: EditingEngine> {
    editor_id: Option<EditorId>,
    engine: Option<E>,
    mirror: Arc<RwLock<MirroredState>>,
}

impl<E: EditingEngine> Default for EditorProxy<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EditingEngine> std::fmt::Debug for EditorProxy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorProxy")
            .field("editor_id", &self.editor_id)
            .field("initialized", &self.engine.is_some())
            .field("content", &self.content())
            .finish()
    }
}

impl<E: EditingEngine> EditorProxy<E> {
    /// An unbound proxy. Commands fail until [`EditorProxy::initialize`].
    pub fn new() -> Self {
        Self {
            editor_id: None,
            engine: None,
            mirror: Arc::new(RwLock::new(MirroredState::default())),
        }
    }

    /// Shorthand for `new` + `initialize`.
    pub fn create<F>(factory: &F, ids: &IdAllocator) -> Result<Self, CollabError>
    where
        F: EngineFactory<Engine = E>,
    {
        let mut proxy = Self::new();
        proxy.initialize(factory, ids)?;
        Ok(proxy)
    }

    /// Bind a fresh engine under the next identifier from `ids`.
    ///
    /// If the factory fails the error is returned as is and no identifier
    /// is used up.
    pub fn initialize<F>(&mut self, factory: &F, ids: &IdAllocator) -> Result<EditorId, CollabError>
    where
        F: EngineFactory<Engine = E>,
    {
        let listener: Arc<dyn ChangeListener> = Arc::new(MirrorListener {
            state: self.mirror.clone(),
        });
        let (editor_id, engine) =
            ids.allocate_with(|editor_id| factory.create(editor_id, listener))?;
        self.editor_id = Some(editor_id);
        self.engine = Some(engine);
        log::debug!("Editor proxy bound to engine {editor_id}");
        Ok(editor_id)
    }

    /// Wrap into a shareable handle.
    pub fn into_handle(self) -> EditorHandle<E> {
        Arc::new(Mutex::new(self))
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    pub fn editor_id(&self) -> Option<EditorId> {
        self.editor_id
    }

    pub fn engine(&self) -> Result<&E, CollabError> {
        self.engine.as_ref().ok_or(CollabError::NotInitialized)
    }

    fn engine_mut(&mut self) -> Result<&mut E, CollabError> {
        self.engine.as_mut().ok_or(CollabError::NotInitialized)
    }

    pub fn insert_character(&mut self, character: char) -> Result<(), CollabError> {
        self.engine_mut()?.insert_character(character)
    }

    pub fn remove_previous_character(&mut self) -> Result<(), CollabError> {
        self.engine_mut()?.remove_previous_character()
    }

    pub fn move_cursor_right(&mut self) -> Result<(), CollabError> {
        self.engine_mut()?.move_cursor_right()
    }

    pub fn move_cursor_left(&mut self) -> Result<(), CollabError> {
        self.engine_mut()?.move_cursor_left()
    }

    pub fn clear(&mut self) -> Result<(), CollabError> {
        self.engine_mut()?.clear()
    }

    /// Ask the engine to replicate this editor's history into `recipient`.
    pub fn send(&self, recipient: &mut EditorProxy<E>) -> Result<(), CollabError> {
        let engine = self.engine()?;
        engine.send_events_to(recipient.engine_mut()?)
    }

    /// Copy of the mirrored state.
    pub fn state(&self) -> MirroredState {
        match self.mirror.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn content(&self) -> String {
        self.state().content
    }

    pub fn cursor_position(&self) -> usize {
        self.state().cursor_position
    }

    pub fn cursor_moment(&self) -> Moment {
        self.state().cursor_moment
    }

    /// Mirrored state as JSON.
    pub fn to_json(&self) -> Result<String, CollabError> {
        serde_json::to_string(&self.state()).map_err(|e| CollabError::Serialization(e.to_string()))
    }
}
