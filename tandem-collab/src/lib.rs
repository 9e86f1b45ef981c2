//! # tandem-collab: proxies, broadcast and scripted playback
//!
//! Orchestration around editing engines. The layer never edits text itself:
//! every command is forwarded to an [`EditingEngine`], which reports back
//! through a change listener.
//!
//! ```text
//! ScenarioPlayer ──keystrokes──► EditorProxy ──► EditingEngine
//!       │                            ▲                │
//!       │ checkpoints                │ send           │ on_change
//!       ▼                            │                ▼
//! broadcast_contents ────────────────┘          MirroredState
//! ```
//!
//! ## Modules
//!
//! - [`ids`]: sequential editor identifiers
//! - [`proxy`]: engine seam and the proxy that forwards to it
//! - [`broadcast`]: all-to-all send and group clear
//! - [`player`]: timed keystroke playback and the demo scenario

pub mod broadcast;
pub mod error;
pub mod ids;
pub mod player;
pub mod proxy;

pub use broadcast::{broadcast_contents, clear_contents, BroadcastStats, EditorGroup};
pub use error::CollabError;
pub use ids::IdAllocator;
pub use player::{
    Keystroke, Phase, Playback, PlayerConfig, ScenarioPlayer, ScenarioReport, DEMO_SCENARIO,
};
pub use proxy::{
    lock_editor, CausalTreeFactory, EditingEngine, EditorHandle, EditorProxy, EngineFactory,
    MirroredState,
};
