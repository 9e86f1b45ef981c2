//! Event storage and flattening of the causal tree.

use std::collections::{BTreeMap, BTreeSet};

use crate::{EngineError, Event, EventKey, ORIGIN_EVENT, ORIGIN_KEY};

type CausalSet = BTreeSet<Event>;

#[derive(Debug, Clone)]
pub struct Content {
    // Every known event, ordered by key.
    sequence: BTreeMap<EventKey, Event>,

    // cause -> events typed right after it. The reverse link is `Event::cause`.
    causal_sets: BTreeMap<EventKey, CausalSet>,
}

impl Default for Content {
    fn default() -> Self {
        Self::new()
    }
}

impl Content {
    pub fn new() -> Self {
        let mut sequence = BTreeMap::new();
        sequence.insert(ORIGIN_EVENT.key, ORIGIN_EVENT);
        Self {
            sequence,
            causal_sets: BTreeMap::new(),
        }
    }

    /// Record an event. Returns `false` when the key was already known;
    /// events never change once created.
    pub fn add_event(&mut self, event: &Event) -> bool {
        if self.sequence.contains_key(&event.key) {
            return false;
        }
        self.sequence.insert(event.key, *event);
        self.causal_sets.entry(event.cause).or_default().insert(*event);
        true
    }

    /// Number of events held, origin included.
    pub fn event_count(&self) -> usize {
        self.sequence.len()
    }

    /// Depth-first pre-order walk of the subtree rooted at `root`.
    fn flatten(&self, root: &EventKey) -> Vec<&Event> {
        let mut flat = Vec::new();
        let mut pending = vec![*root];
        while let Some(key) = pending.pop() {
            if let Some(event) = self.sequence.get(&key) {
                flat.push(event);
            }
            if let Some(children) = self.causal_sets.get(&key) {
                // Reversed so the first child is popped first.
                for child in children.iter().rev() {
                    // The origin is its own cause.
                    if child.key != ORIGIN_KEY {
                        pending.push(child.key);
                    }
                }
            }
        }
        flat
    }

    /// Flattening of the whole tree, starting from its smallest key.
    pub fn flatten_all(&self) -> Vec<&Event> {
        match self.sequence.keys().next() {
            Some(root) => self.flatten(root),
            None => Vec::new(),
        }
    }

    /// Events that still produce output: walk the flattening and let each
    /// backspace drop the kept event right before it when that is its cause.
    pub fn final_events(&self) -> Vec<Event> {
        let mut events: Vec<Event> = Vec::new();
        for event in self.flatten_all() {
            if event.key == ORIGIN_KEY {
                continue;
            }
            if event.is_backspace() {
                if events.last().is_some_and(|previous| previous.key == event.cause) {
                    events.pop();
                }
            } else {
                events.push(*event);
            }
        }
        events
    }

    /// Current text of the document.
    pub fn characters(&self) -> String {
        self.final_events().iter().map(|event| event.character).collect()
    }

    /// Copy every event into `recipient`.
    pub fn send(&self, recipient: &mut Content) {
        for event in self.sequence.values() {
            recipient.add_event(event);
        }
    }

    /// Serialize the whole event history.
    pub fn encode_events(&self) -> Result<Vec<u8>, EngineError> {
        let events: Vec<&Event> = self.sequence.values().collect();
        bincode::serde::encode_to_vec(&events, bincode::config::standard())
            .map_err(|e| EngineError::Encode(e.to_string()))
    }

    /// Merge a history produced by [`Content::encode_events`].
    /// Returns how many events were new.
    pub fn apply_encoded_events(&mut self, bytes: &[u8]) -> Result<usize, EngineError> {
        let (events, _): (Vec<Event>, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| EngineError::Decode(e.to_string()))?;
        Ok(events.iter().filter(|event| self.add_event(event)).count())
    }
}
