//! eSpeak engine implementation.
//!
//! Binds the eSpeak C library (`speak_lib.h`) and drives it in synchronous
//! output mode: `espeak_Synth` does not return until the text has been
//! rendered, and generated audio reaches the caller through a callback that
//! eSpeak invokes from inside that call.
//!
//! # System Requirements
//!
//! `libespeak` (or `libespeak-ng` built with the legacy API) must be
//! available to the linker. On Android it is built alongside this crate by
//! the application's NDK build; on desktop:
//! - **Linux**: `sudo apt-get install libespeak-dev`
//! - **macOS**: `brew install espeak`
//!
//! # Data Directory
//!
//! `espeak_Initialize` looks for `espeak-data/` inside the resource path
//! given to [`Bridge::create`](crate::Bridge::create), or in the library's
//! compiled-in default when no path is given.
//!
//! # Examples
//!
//! ```rust,no_run
//! use espeak_bridge::{Bridge, SynthesisResult, engines::espeak::EspeakEngine};
//! use std::path::PathBuf;
//!
//! let bridge: Bridge<EspeakEngine> = Bridge::new(EspeakEngine::new());
//! let handle = bridge.create((), None)?;
//! bridge.set_voice_by_name("en")?;
//!
//! let mut result = SynthesisResult::new(bridge.sample_rate(handle)? as u32);
//! bridge.synthesize(handle, "Hello from eSpeak!", false, &mut result)?;
//! result.write_wav(&PathBuf::from("hello.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
mod ffi;

pub use engine::EspeakEngine;
