//! All-to-all propagation across a group of editors.
//!
//! `broadcast_contents` sends from every member to every other member, so a
//! group of n editors costs n×(n−1) sends. Pairs run one after another in
//! enumeration order. A member is skipped only when paired with the very same
//! handle; two distinct proxies holding equal content still exchange.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::CollabError;
use crate::ids::IdAllocator;
use crate::proxy::{lock_editor, EditingEngine, EditorHandle, EditorProxy, EngineFactory};

/// Counts of operations one pass issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    pub sends: usize,
    pub clears: usize,
    pub members: usize,
}

/// Send from every editor to every other editor.
pub fn broadcast_contents<E: EditingEngine>(
    editors: &[EditorHandle<E>],
) -> Result<BroadcastStats, CollabError> {
    let mut stats = BroadcastStats {
        members: editors.len(),
        ..Default::default()
    };
    for sender in editors {
        for recipient in editors {
            if Arc::ptr_eq(sender, recipient) {
                continue;
            }
            let source = lock_editor(sender)?;
            let mut target = lock_editor(recipient)?;
            source.send(&mut target)?;
            stats.sends += 1;
        }
    }
    Ok(stats)
}

/// Clear every editor, in order.
pub fn clear_contents<E: EditingEngine>(
    editors: &[EditorHandle<E>],
) -> Result<BroadcastStats, CollabError> {
    let mut stats = BroadcastStats {
        members: editors.len(),
        ..Default::default()
    };
    for editor in editors {
        lock_editor(editor)?.clear()?;
        stats.clears += 1;
    }
    Ok(stats)
}

/// Editors working on one shared document.
pub struct EditorGroup<E: EditingEngine> {
    doc_id: Uuid,
    editors: Vec<EditorHandle<E>>,
}

impl<E: EditingEngine> Default for EditorGroup<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EditingEngine> EditorGroup<E> {
    pub fn new() -> Self {
        Self {
            doc_id: Uuid::new_v4(),
            editors: Vec::new(),
        }
    }

    /// Build a group of `count` freshly initialized editors.
    pub fn spawn<F>(factory: &F, ids: &IdAllocator, count: usize) -> Result<Self, CollabError>
    where
        F: EngineFactory<Engine = E>,
    {
        let mut group = Self::new();
        for _ in 0..count {
            group.push(EditorProxy::create(factory, ids)?.into_handle());
        }
        log::info!("Spawned {count} editors for document {}", group.doc_id);
        Ok(group)
    }

    pub fn doc_id(&self) -> Uuid {
        self.doc_id
    }

    pub fn push(&mut self, editor: EditorHandle<E>) {
        self.editors.push(editor);
    }

    pub fn editors(&self) -> &[EditorHandle<E>] {
        &self.editors
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    pub fn broadcast_contents(&self) -> Result<BroadcastStats, CollabError> {
        let stats = broadcast_contents(&self.editors)?;
        log::debug!(
            "Broadcast in document {}: {} sends across {} editors",
            self.doc_id,
            stats.sends,
            stats.members
        );
        Ok(stats)
    }

    pub fn clear_contents(&self) -> Result<BroadcastStats, CollabError> {
        let stats = clear_contents(&self.editors)?;
        log::debug!("Cleared {} editors in document {}", stats.clears, self.doc_id);
        Ok(stats)
    }

    /// Mirrored content of every member, in order.
    pub fn contents(&self) -> Result<Vec<String>, CollabError> {
        self.editors
            .iter()
            .map(|editor| lock_editor(editor).map(|proxy| proxy.content()))
            .collect()
    }

    /// True when every member shows the same text.
    pub fn is_converged(&self) -> Result<bool, CollabError> {
        let contents = self.contents()?;
        Ok(contents.windows(2).all(|pair| pair[0] == pair[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::CausalTreeFactory;
    use tandem_core::Editor;

    fn group(count: usize) -> EditorGroup<Editor> {
        EditorGroup::spawn(&CausalTreeFactory, &IdAllocator::new(), count).unwrap()
    }

    fn type_into(editor: &EditorHandle<Editor>, text: &str) {
        let mut proxy = lock_editor(editor).unwrap();
        for character in text.chars() {
            proxy.insert_character(character).unwrap();
        }
    }

    #[test]
    fn test_broadcast_converges_group() {
        let group = group(3);
        type_into(&group.editors()[0], "ab");
        type_into(&group.editors()[2], "z");

        let stats = group.broadcast_contents().unwrap();
        assert_eq!(stats.sends, 6);
        assert_eq!(stats.members, 3);
        assert!(group.is_converged().unwrap());
    }

    #[test]
    fn test_same_handle_twice_is_not_paired() {
        let group = group(2);
        let first = group.editors()[0].clone();
        let editors = vec![first.clone(), first, group.editors()[1].clone()];

        // Only (first, second) and (second, first), each counted per occurrence.
        let stats = broadcast_contents(&editors).unwrap();
        assert_eq!(stats.sends, 4);
    }

    #[test]
    fn test_empty_and_single_groups_send_nothing() {
        assert_eq!(broadcast_contents::<Editor>(&[]).unwrap().sends, 0);
        assert_eq!(group(1).broadcast_contents().unwrap().sends, 0);
    }

    #[test]
    fn test_clear_contents_empties_everyone() {
        let group = group(3);
        type_into(&group.editors()[1], "text");
        group.broadcast_contents().unwrap();

        let stats = group.clear_contents().unwrap();
        assert_eq!(stats.clears, 3);
        assert_eq!(group.contents().unwrap(), vec!["", "", ""]);
    }

    #[test]
    fn test_groups_get_distinct_documents() {
        assert_ne!(group(0).doc_id(), group(0).doc_id());
        assert!(group(0).is_empty());
    }
}
