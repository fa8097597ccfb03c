use crate::bridge::HandleId;

/// Failure codes reported by the synthesis engine.
///
/// eSpeak reports `EE_OK` (0) on success and one of three error codes
/// otherwise. Anything else is kept verbatim in [`EngineError::Unrecognized`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("internal error")]
    InternalError,
    #[error("buffer full")]
    BufferFull,
    #[error("not found")]
    NotFound,
    #[error("unrecognized result code {0}")]
    Unrecognized(i32),
}

impl EngineError {
    pub const OK: i32 = 0;
    pub const INTERNAL_ERROR: i32 = -1;
    pub const BUFFER_FULL: i32 = 1;
    pub const NOT_FOUND: i32 = 2;

    /// Translate a raw engine result code.
    pub fn check(code: i32) -> Result<(), EngineError> {
        match code {
            Self::OK => Ok(()),
            Self::INTERNAL_ERROR => Err(EngineError::InternalError),
            Self::BUFFER_FULL => Err(EngineError::BufferFull),
            Self::NOT_FOUND => Err(EngineError::NotFound),
            other => Err(EngineError::Unrecognized(other)),
        }
    }

    /// The raw code this error was built from.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::InternalError => Self::INTERNAL_ERROR,
            EngineError::BufferFull => Self::BUFFER_FULL,
            EngineError::NotFound => Self::NOT_FOUND,
            EngineError::Unrecognized(code) => *code,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("native handle table is full ({0} handles)")]
    Allocation(usize),
    #[error("engine initialization failed for handle {handle} (sample rate {sample_rate})")]
    EngineInit { handle: HandleId, sample_rate: i32 },
    #[error("no native handle registered for id {0}")]
    StaleHandle(i32),
    #[error("native handle {0} is busy synthesizing")]
    HandleBusy(HandleId),
    #[error("the engine is busy synthesizing for another handle")]
    EngineBusy,
    #[error("text contains an interior NUL byte at offset {0}")]
    InvalidText(usize),
    #[error("required argument `{0}` was null")]
    NullArgument(&'static str),
    #[error("owner of native handle {0} is no longer reachable")]
    OwnerReleased(HandleId),
    #[error("class metadata not initialized. Call nativeClassInit() first.")]
    NotInitialized,
    #[cfg(feature = "jni")]
    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),
}
