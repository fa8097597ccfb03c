//! # espeak-bridge
//!
//! A JNI bridge exposing the eSpeak text-to-speech engine to Android
//! applications (`com.reecedunn.espeak.SpeechSynthesis`).
//!
//! ## Features
//!
//! - **Handle registry**: one native handle per managed synthesizer, looked up
//!   by id instead of a pointer stored in a Java `int`
//! - **Synchronous audio relay**: PCM chunks are delivered to the caller from
//!   inside the synthesis call, in generation order
//! - **Engine seam**: every engine call goes through [`SpeechEngine`], so the
//!   bridge logic runs without the C library
//!
//! Enable `espeak` to link libespeak, and `jni` to export the native methods.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! espeak-bridge = { version = "2026.2", features = ["espeak"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use espeak_bridge::{bridge::Bridge, engines::espeak::EspeakEngine, SynthesisResult};
//!
//! let bridge = Bridge::new(EspeakEngine::new());
//! let handle = bridge.create((), None)?;
//!
//! let mut result = SynthesisResult::new(bridge.sample_rate(handle)? as u32);
//! bridge.synthesize(handle, "Hello, world!", false, &mut result)?;
//! result.write_wav(&PathBuf::from("output.wav"))?;
//! bridge.destroy(handle)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bridge;
pub mod config;
pub mod engines;
pub mod error;
#[cfg(feature = "jni")]
pub mod java;
pub mod logging;
pub mod voice;

#[cfg(test)]
mod testing;

pub use bridge::{Bridge, HandleId};
pub use config::BridgeConfig;
pub use error::{BridgeError, EngineError};
pub use voice::{VoiceDescriptor, VoiceSelection};

use std::io::{Seek, Write};
use std::path::Path;

/// What the engine should do after a chunk has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkAction {
    Continue,
    Abort,
}

/// How the engine should interpret synthesis input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Plain UTF-8 text.
    Utf8,
    /// UTF-8 text with embedded SSML markup.
    Utf8Ssml,
}

impl TextEncoding {
    pub fn for_markup(is_markup: bool) -> Self {
        if is_markup {
            TextEncoding::Utf8Ssml
        } else {
            TextEncoding::Utf8
        }
    }
}

/// Engine parameter ids (eSpeak's `espeak_PARAMETER`).
///
/// The managed side sends raw integers, so ids outside the named set are
/// carried through as [`Parameter::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Silence,
    /// Words per minute.
    Rate,
    /// Volume in the range 0-200 (100 is normal).
    Volume,
    /// Base pitch in the range 0-100.
    Pitch,
    /// Pitch range in the range 0-100.
    Range,
    Punctuation,
    Capitals,
    WordGap,
    Options,
    Intonation,
    Other(i32),
}

impl Parameter {
    pub fn code(self) -> i32 {
        match self {
            Parameter::Silence => 0,
            Parameter::Rate => 1,
            Parameter::Volume => 2,
            Parameter::Pitch => 3,
            Parameter::Range => 4,
            Parameter::Punctuation => 5,
            Parameter::Capitals => 6,
            Parameter::WordGap => 7,
            Parameter::Options => 8,
            Parameter::Intonation => 9,
            Parameter::Other(code) => code,
        }
    }
}

impl From<i32> for Parameter {
    fn from(code: i32) -> Self {
        match code {
            0 => Parameter::Silence,
            1 => Parameter::Rate,
            2 => Parameter::Volume,
            3 => Parameter::Pitch,
            4 => Parameter::Range,
            5 => Parameter::Punctuation,
            6 => Parameter::Capitals,
            7 => Parameter::WordGap,
            8 => Parameter::Options,
            9 => Parameter::Intonation,
            other => Parameter::Other(other),
        }
    }
}

/// Receives synthesized audio, one chunk per engine callback.
///
/// `Some(bytes)` carries 16-bit samples in native byte order. `None` marks the
/// end of the stream (the engine produced no more samples or was aborted).
pub trait AudioSink {
    fn on_audio_chunk(&mut self, chunk: Option<&[u8]>) -> ChunkAction;
}

impl<F> AudioSink for F
where
    F: FnMut(Option<&[u8]>) -> ChunkAction,
{
    fn on_audio_chunk(&mut self, chunk: Option<&[u8]>) -> ChunkAction {
        self(chunk)
    }
}

/// Audio collected from a synthesis call.
///
/// Implements [`AudioSink`], so it can be handed straight to
/// [`Bridge::synthesize`].
#[derive(Debug, Default)]
pub struct SynthesisResult {
    /// Raw 16-bit PCM samples
    pub samples: Vec<i16>,
    /// Sample rate reported by the engine at initialization
    pub sample_rate: u32,
    /// Number of non-empty chunks received
    pub chunks: usize,
    /// Whether the end-of-stream marker was received
    pub finished: bool,
}

impl SynthesisResult {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Write the audio to a 16-bit mono WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let writer = hound::WavWriter::create(path, self.wav_spec())?;
        self.write_samples(writer)
    }

    /// Write the audio as WAV into any seekable writer.
    pub fn write_wav_to<W: Write + Seek>(&self, out: W) -> Result<(), hound::Error> {
        let writer = hound::WavWriter::new(out, self.wav_spec())?;
        self.write_samples(writer)
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    fn write_samples<W: Write + Seek>(
        &self,
        mut writer: hound::WavWriter<W>,
    ) -> Result<(), hound::Error> {
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

impl AudioSink for SynthesisResult {
    fn on_audio_chunk(&mut self, chunk: Option<&[u8]>) -> ChunkAction {
        match chunk {
            Some(bytes) => {
                self.samples.extend(
                    bytes
                        .chunks_exact(2)
                        .map(|pair| i16::from_ne_bytes([pair[0], pair[1]])),
                );
                self.chunks += 1;
            }
            None => self.finished = true,
        }
        ChunkAction::Continue
    }
}

/// The synthesis engine as seen by the bridge.
///
/// Mirrors the subset of the eSpeak C API the bridge consumes. The engine is
/// process-global state, so methods take `&self`; implementations are
/// responsible for their own interior mutability.
pub trait SpeechEngine {
    /// Initialize in synchronous output mode. Returns the output sample rate,
    /// or a non-positive value on failure.
    fn initialize(&self, buffer_size_millis: i32, resource_path: Option<&str>, options: i32)
        -> i32;

    /// Engine version string.
    fn info(&self) -> String;

    /// All voices the engine currently knows, in the engine's listing order.
    fn list_voices(&self) -> Vec<VoiceDescriptor>;

    fn set_voice_by_name(&self, name: &str) -> Result<(), EngineError>;

    fn set_voice_by_properties(&self, selection: &VoiceSelection) -> Result<(), EngineError>;

    fn set_parameter(&self, parameter: Parameter, value: i32) -> Result<(), EngineError>;

    /// Read a parameter. `current` selects the current (non-zero) or default
    /// (zero) value.
    fn get_parameter(&self, parameter: Parameter, current: i32) -> i32;

    /// Synthesize `text`, calling `on_samples` synchronously for every block of
    /// generated audio. An empty slice is the engine's end-of-data signal.
    fn synth(
        &self,
        text: &str,
        encoding: TextEncoding,
        on_samples: &mut dyn FnMut(&[i16]) -> ChunkAction,
    ) -> Result<(), EngineError>;

    /// Block until all queued audio has been generated.
    fn synchronize(&self) -> Result<(), EngineError>;

    /// Ask the engine to stop the current synthesis.
    fn cancel(&self) -> Result<(), EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn collects_native_endian_chunks() {
        let mut result = SynthesisResult::new(22050);
        let bytes: Vec<u8> = [1i16, -2, 300].iter().flat_map(|s| s.to_ne_bytes()).collect();

        assert_eq!(result.on_audio_chunk(Some(&bytes)), ChunkAction::Continue);
        result.on_audio_chunk(None);

        assert_eq!(result.samples, vec![1, -2, 300]);
        assert_eq!(result.chunks, 1);
        assert!(result.finished);
    }

    #[test]
    fn writes_sixteen_bit_wav() {
        let mut result = SynthesisResult::new(16000);
        result.samples = vec![0, 1000, -1000, i16::MAX];

        let mut buf = Cursor::new(Vec::new());
        result.write_wav_to(&mut buf).unwrap();
        buf.set_position(0);

        let reader = hound::WavReader::new(buf).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, i16::MAX]);
    }

    #[test]
    fn duration_uses_sample_rate() {
        let mut result = SynthesisResult::new(8000);
        result.samples = vec![0; 4000];
        assert!((result.duration_secs() - 0.5).abs() < f64::EPSILON);
        assert_eq!(SynthesisResult::default().duration_secs(), 0.0);
    }

    #[test]
    fn parameter_codes_round_trip() {
        for code in -1..12 {
            assert_eq!(Parameter::from(code).code(), code);
        }
        assert_eq!(Parameter::from(3), Parameter::Pitch);
    }

    #[test]
    fn markup_flag_selects_encoding() {
        assert_eq!(TextEncoding::for_markup(true), TextEncoding::Utf8Ssml);
        assert_eq!(TextEncoding::for_markup(false), TextEncoding::Utf8);
    }
}
