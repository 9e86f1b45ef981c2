//! Scripted keystroke playback.
//!
//! A scenario is a list of phases. Each phase plays keyboard sequences into
//! fixed editor slots, waits one replay step, then broadcasts across the
//! whole group. Everything runs in order on the caller's task.

use std::time::Duration;

use crate::broadcast::broadcast_contents;
use crate::error::CollabError;
use crate::proxy::{lock_editor, EditingEngine, EditorHandle, EditorProxy};

pub const CURSOR_RIGHT_KEY: char = '→';
pub const CURSOR_LEFT_KEY: char = '←';

/// Keystrokes per second when nothing else is configured.
pub const DEFAULT_REPLAY_SPEED: u32 = 4;
pub const REPLAY_SPEED_ENV: &str = "TANDEM_REPLAY_SPEED";

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Delay before each keystroke and before each broadcast.
    pub replay_step: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::from_speed(DEFAULT_REPLAY_SPEED)
    }
}

impl PlayerConfig {
    /// `speed` keystrokes per second. Zero is treated as one.
    pub fn from_speed(speed: u32) -> Self {
        Self {
            replay_step: Duration::from_millis(1000 / u64::from(speed.max(1))),
        }
    }

    /// No delays at all.
    pub fn instant() -> Self {
        Self {
            replay_step: Duration::ZERO,
        }
    }

    /// Speed from `TANDEM_REPLAY_SPEED`, falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var(REPLAY_SPEED_ENV) {
            Ok(raw) => match parse_speed(&raw) {
                Some(speed) => Self::from_speed(speed),
                None => {
                    log::warn!(
                        "Ignoring {REPLAY_SPEED_ENV}={raw:?}, expected a positive integer"
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

fn parse_speed(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|speed| *speed > 0)
}

/// What one character of a keyboard sequence does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Insert(char),
    Backspace,
    CursorRight,
    CursorLeft,
}

impl From<char> for Keystroke {
    fn from(character: char) -> Self {
        match character {
            CURSOR_RIGHT_KEY => Keystroke::CursorRight,
            CURSOR_LEFT_KEY => Keystroke::CursorLeft,
            tandem_core::BACKSPACE_CHARACTER => Keystroke::Backspace,
            other => Keystroke::Insert(other),
        }
    }
}

impl Keystroke {
    pub fn parse(sequence: &str) -> Vec<Keystroke> {
        sequence.chars().map(Keystroke::from).collect()
    }

    pub fn apply<E: EditingEngine>(self, editor: &mut EditorProxy<E>) -> Result<(), CollabError> {
        match self {
            Keystroke::Insert(character) => editor.insert_character(character),
            Keystroke::Backspace => editor.remove_previous_character(),
            Keystroke::CursorRight => editor.move_cursor_right(),
            Keystroke::CursorLeft => editor.move_cursor_left(),
        }
    }
}

/// A keyboard sequence typed into one editor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    pub slot: usize,
    pub sequence: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub playbacks: &'static [Playback],
}

/// Three users: one types a word, two append to it concurrently, then all
/// three fix a letter at once.
pub const DEMO_SCENARIO: &[Phase] = &[
    Phase {
        playbacks: &[Playback {
            slot: 0,
            sequence: "Rust",
        }],
    },
    Phase {
        playbacks: &[
            Playback {
                slot: 1,
                sequence: "→→→→ wasm",
            },
            Playback {
                slot: 2,
                sequence: "→→→→ Js",
            },
        ],
    },
    Phase {
        playbacks: &[
            Playback {
                slot: 0,
                sequence: "→→\x08W",
            },
            Playback {
                slot: 1,
                sequence: "→→→\x08S",
            },
            Playback {
                slot: 2,
                sequence: "←←\x08\n",
            },
        ],
    },
];

/// Number of editors a scenario addresses.
pub fn required_editors(phases: &[Phase]) -> usize {
    phases
        .iter()
        .flat_map(|phase| phase.playbacks)
        .map(|playback| playback.slot + 1)
        .max()
        .unwrap_or(0)
}

/// Totals for a finished scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    pub phases: usize,
    pub keystrokes: usize,
    pub sends: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioPlayer {
    config: PlayerConfig,
}

impl ScenarioPlayer {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    async fn pause(&self) {
        if !self.config.replay_step.is_zero() {
            tokio::time::sleep(self.config.replay_step).await;
        }
    }

    /// Type `sequence` into `editor`, one keystroke per replay step.
    /// Returns the number of keystrokes issued.
    pub async fn play_keyboard_sequence<E: EditingEngine>(
        &self,
        editor: &EditorHandle<E>,
        sequence: &str,
    ) -> Result<usize, CollabError> {
        let mut issued = 0;
        for keystroke in Keystroke::parse(sequence) {
            self.pause().await;
            let mut proxy = lock_editor(editor)?;
            keystroke.apply(&mut proxy)?;
            drop(proxy);
            issued += 1;
        }
        Ok(issued)
    }

    pub async fn play_phases<E: EditingEngine>(
        &self,
        editors: &[EditorHandle<E>],
        phases: &[Phase],
    ) -> Result<ScenarioReport, CollabError> {
        let required = required_editors(phases);
        if editors.len() < required {
            return Err(CollabError::NotEnoughEditors {
                required,
                found: editors.len(),
            });
        }

        let mut report = ScenarioReport::default();
        for (index, phase) in phases.iter().enumerate() {
            for playback in phase.playbacks {
                report.keystrokes += self
                    .play_keyboard_sequence(&editors[playback.slot], playback.sequence)
                    .await?;
            }
            self.pause().await;
            report.sends += broadcast_contents(editors)?.sends;
            report.phases += 1;
            log::info!(
                "Phase {} done: {} keystrokes, {} sends so far",
                index + 1,
                report.keystrokes,
                report.sends
            );
        }
        Ok(report)
    }

    /// Play [`DEMO_SCENARIO`].
    pub async fn play_scenario<E: EditingEngine>(
        &self,
        editors: &[EditorHandle<E>],
    ) -> Result<ScenarioReport, CollabError> {
        self.play_phases(editors, DEMO_SCENARIO).await
    }
}
