use tandem_core::EngineError;

/// Errors surfaced by the orchestration layer.
///
/// Engine failures are passed through untouched inside [`CollabError::Engine`].
#[derive(Debug, Clone, PartialEq)]
pub enum CollabError {
    NotInitialized,
    IdsExhausted,
    EngineConstruction(String),
    Engine(EngineError),
    LockPoisoned(String),
    NotEnoughEditors { required: usize, found: usize },
    Serialization(String),
}

impl std::fmt::Display for CollabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "Editor proxy used before initialization"),
            Self::IdsExhausted => write!(f, "No editor identifiers left"),
            Self::EngineConstruction(e) => write!(f, "Failed to construct editing engine: {e}"),
            Self::Engine(e) => write!(f, "Editing engine error: {e}"),
            Self::LockPoisoned(e) => write!(f, "Editor lock poisoned: {e}"),
            Self::NotEnoughEditors { required, found } => {
                write!(f, "Scenario needs {required} editors, got {found}")
            }
            Self::Serialization(e) => write!(f, "Serialization error: {e}"),
        }
    }
}

impl std::error::Error for CollabError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for CollabError {
    fn from(e: EngineError) -> Self {
        CollabError::Engine(e)
    }
}
