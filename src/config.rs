use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Channel layout of the PCM delivered to the managed side.
///
/// Values match `android.media.AudioFormat` channel counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelCount {
    Mono,
    Stereo,
}

impl ChannelCount {
    pub fn count(self) -> i32 {
        match self {
            ChannelCount::Mono => 1,
            ChannelCount::Stereo => 2,
        }
    }
}

/// Sample encoding of the delivered PCM.
///
/// Values match the `android.media.AudioFormat.ENCODING_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    Invalid,
    Default,
    Pcm16Bit,
    Pcm8Bit,
}

impl AudioEncoding {
    pub fn code(self) -> i32 {
        match self {
            AudioEncoding::Invalid => 0x00,
            AudioEncoding::Default => 0x01,
            AudioEncoding::Pcm16Bit => 0x02,
            AudioEncoding::Pcm8Bit => 0x03,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid bridge config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings copied into every native handle when it is created.
///
/// ```
/// use espeak_bridge::config::{BridgeConfigBuilder, ChannelCount};
///
/// let config = BridgeConfigBuilder::default()
///     .buffer_size_millis(500)
///     .build()
///     .unwrap();
/// assert_eq!(config.channel_count, ChannelCount::Mono);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Length of the engine's output buffer, and so of each audio chunk.
    pub buffer_size_millis: i32,
    pub channel_count: ChannelCount,
    pub audio_format: AudioEncoding,
    /// Raw option flags passed to engine initialization.
    pub engine_options: i32,
    /// Upper bound on simultaneously live handles.
    pub max_handles: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buffer_size_millis: 1000,
            channel_count: ChannelCount::Mono,
            audio_format: AudioEncoding::Pcm16Bit,
            engine_options: 0,
            max_handles: 16,
        }
    }
}

impl BridgeConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::info!("Loaded bridge config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_android_playback_expectations() {
        let config = BridgeConfig::default();
        assert_eq!(config.buffer_size_millis, 1000);
        assert_eq!(config.channel_count.count(), 1);
        assert_eq!(config.audio_format.code(), 2);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{ "buffer_size_millis": 250, "channel_count": "stereo" }"#)
                .unwrap();
        assert_eq!(config.buffer_size_millis, 250);
        assert_eq!(config.channel_count, ChannelCount::Stereo);
        assert_eq!(config.audio_format, AudioEncoding::Pcm16Bit);
        assert_eq!(config.max_handles, 16);
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "espeak-bridge-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "audio_format": "pcm8_bit", "max_handles": 2 }"#).unwrap();
        let config = BridgeConfig::from_json_file(&path);
        std::fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.audio_format.code(), 3);
        assert_eq!(config.max_handles, 2);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = serde_json::from_str::<BridgeConfig>("{ not json").unwrap_err();
        assert!(ConfigError::from(err).to_string().starts_with("Invalid bridge config"));
    }

    #[test]
    fn builder_overrides_single_fields() {
        let config = BridgeConfigBuilder::default()
            .engine_options(1)
            .build()
            .unwrap();
        assert_eq!(config.engine_options, 1);
        assert_eq!(config.buffer_size_millis, 1000);
    }
}
