//! Sequential editor identifiers.

use std::sync::Mutex;

use tandem_core::EditorId;

use crate::error::CollabError;

/// Hands out unique, strictly increasing editor identifiers.
///
/// Whoever builds proxies owns one of these; there is no global counter.
/// `EditorId::MAX` is never handed out, so the counter cannot wrap.
#[derive(Debug)]
pub struct IdAllocator {
    next: Mutex<EditorId>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(first: EditorId) -> Self {
        Self {
            next: Mutex::new(first),
        }
    }

    /// Identifier the next successful allocation will return.
    pub fn peek(&self) -> Result<EditorId, CollabError> {
        let next = self
            .next
            .lock()
            .map_err(|e| CollabError::LockPoisoned(e.to_string()))?;
        Ok(*next)
    }

    /// Run `build` with the next identifier and keep the identifier only if
    /// `build` succeeds. The allocator stays locked while `build` runs.
    pub fn allocate_with<T, F>(&self, build: F) -> Result<(EditorId, T), CollabError>
    where
        F: FnOnce(EditorId) -> Result<T, CollabError>,
    {
        let mut next = self
            .next
            .lock()
            .map_err(|e| CollabError::LockPoisoned(e.to_string()))?;
        let editor_id = *next;
        let following = editor_id
            .checked_add(1)
            .ok_or(CollabError::IdsExhausted)?;
        let built = build(editor_id)?;
        *next = following;
        Ok((editor_id, built))
    }
}
