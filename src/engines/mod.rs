//! Speech synthesis engines.
//!
//! This module contains implementations of [`SpeechEngine`](crate::SpeechEngine).
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `espeak` - eSpeak via its C API (links `libespeak`)

#[cfg(feature = "espeak")]
pub mod espeak;
