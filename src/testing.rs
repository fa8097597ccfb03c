//! A scripted stand-in for the eSpeak engine.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::EngineError;
use crate::voice::{VoiceDescriptor, VoiceSelection};
use crate::{ChunkAction, Parameter, SpeechEngine, TextEncoding};

pub(crate) struct Script {
    pub sample_rate: i32,
    pub voices: Vec<VoiceDescriptor>,
    pub current_voice: Option<String>,
    pub params: HashMap<Parameter, i32>,
    /// Error returned by `synth` instead of generating audio.
    pub synth_error: Option<EngineError>,
    pub samples_per_char: usize,
    pub init_calls: Vec<(i32, Option<String>, i32)>,
    pub synth_calls: Vec<(String, TextEncoding)>,
    pub cancel_requested: bool,
    pub cancels: usize,
    pub synchronizes: usize,
}

/// Generates one block per whitespace-separated word. Every sample of block
/// `n` has the value `n + 1`, and the engine finishes with an empty block.
pub(crate) struct ScriptedEngine {
    pub script: Mutex<Script>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                sample_rate: 22050,
                voices: vec![
                    voice("en", "gmw/en", 1, 0),
                    voice("en-us", "gmw/en-US", 2, 0),
                    voice("fr-fr", "roa/fr", 1, 40),
                ],
                current_voice: None,
                params: HashMap::new(),
                synth_error: None,
                samples_per_char: 4,
                init_calls: Vec::new(),
                synth_calls: Vec::new(),
                cancel_requested: false,
                cancels: 0,
                synchronizes: 0,
            }),
        }
    }

    pub fn with_sample_rate(sample_rate: i32) -> Self {
        let engine = Self::new();
        engine.script.lock().sample_rate = sample_rate;
        engine
    }
}

fn voice(language: &str, identifier: &str, gender: u8, age: u8) -> VoiceDescriptor {
    VoiceDescriptor {
        language: language.to_string(),
        identifier: identifier.to_string(),
        gender,
        age,
    }
}

fn default_value(parameter: Parameter) -> i32 {
    match parameter {
        Parameter::Rate => 175,
        Parameter::Volume => 100,
        Parameter::Pitch | Parameter::Range => 50,
        _ => 0,
    }
}

fn clamp(parameter: Parameter, value: i32) -> i32 {
    match parameter {
        Parameter::Rate => value.clamp(80, 450),
        Parameter::Volume => value.clamp(0, 200),
        Parameter::Pitch | Parameter::Range => value.clamp(0, 100),
        _ => value,
    }
}

impl SpeechEngine for ScriptedEngine {
    fn initialize(
        &self,
        buffer_size_millis: i32,
        resource_path: Option<&str>,
        options: i32,
    ) -> i32 {
        let mut script = self.script.lock();
        script
            .init_calls
            .push((buffer_size_millis, resource_path.map(str::to_string), options));
        script.sample_rate
    }

    fn info(&self) -> String {
        "1.48.15  16.Apr.15".to_string()
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        self.script.lock().voices.clone()
    }

    fn set_voice_by_name(&self, name: &str) -> Result<(), EngineError> {
        let mut script = self.script.lock();
        if !script.voices.iter().any(|v| v.identifier == name) {
            return Err(EngineError::NotFound);
        }
        script.current_voice = Some(name.to_string());
        Ok(())
    }

    fn set_voice_by_properties(&self, selection: &VoiceSelection) -> Result<(), EngineError> {
        let mut script = self.script.lock();
        let found = script
            .voices
            .iter()
            .find(|v| {
                selection
                    .language
                    .as_deref()
                    .map_or(true, |lang| v.language.starts_with(lang))
                    && (selection.gender == 0 || selection.gender == v.gender)
            })
            .map(|v| v.identifier.clone())
            .ok_or(EngineError::NotFound)?;
        script.current_voice = Some(found);
        Ok(())
    }

    fn set_parameter(&self, parameter: Parameter, value: i32) -> Result<(), EngineError> {
        if let Parameter::Other(_) = parameter {
            return Err(EngineError::InternalError);
        }
        self.script
            .lock()
            .params
            .insert(parameter, clamp(parameter, value));
        Ok(())
    }

    fn get_parameter(&self, parameter: Parameter, current: i32) -> i32 {
        let script = self.script.lock();
        match script.params.get(&parameter) {
            Some(&value) if current != 0 => value,
            _ => default_value(parameter),
        }
    }

    fn synth(
        &self,
        text: &str,
        encoding: TextEncoding,
        on_samples: &mut dyn FnMut(&[i16]) -> ChunkAction,
    ) -> Result<(), EngineError> {
        let samples_per_char = {
            let mut script = self.script.lock();
            script.synth_calls.push((text.to_string(), encoding));
            script.cancel_requested = false;
            if let Some(err) = script.synth_error {
                return Err(err);
            }
            script.samples_per_char
        };

        for (index, word) in text.split_whitespace().enumerate() {
            if self.script.lock().cancel_requested {
                break;
            }
            let block = vec![(index + 1) as i16; word.chars().count() * samples_per_char];
            if on_samples(&block) == ChunkAction::Abort {
                return Ok(());
            }
        }

        on_samples(&[]);
        Ok(())
    }

    fn synchronize(&self) -> Result<(), EngineError> {
        self.script.lock().synchronizes += 1;
        Ok(())
    }

    fn cancel(&self) -> Result<(), EngineError> {
        let mut script = self.script.lock();
        script.cancel_requested = true;
        script.cancels += 1;
        Ok(())
    }
}
