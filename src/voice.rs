/// Voice gender codes as used by eSpeak voice files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Unspecified,
    Male,
    Female,
}

impl Gender {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Gender::Unspecified),
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            _ => None,
        }
    }
}

/// One entry of the engine's voice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// Highest priority language of the voice (e.g. `"en-us"`).
    pub language: String,
    /// Path of the voice file relative to the voices directory.
    pub identifier: String,
    pub gender: u8,
    pub age: u8,
}

impl VoiceDescriptor {
    /// The gender code decoded, or `None` for codes eSpeak does not define.
    pub fn gender(&self) -> Option<Gender> {
        Gender::from_code(self.gender)
    }

    /// The four string fields handed to the managed side, in order.
    pub fn to_fields(&self) -> [String; 4] {
        [
            self.language.clone(),
            self.identifier.clone(),
            self.gender.to_string(),
            self.age.to_string(),
        ]
    }
}

/// Flatten voices into `language, identifier, gender, age` quadruples.
pub fn flatten_voices(voices: &[VoiceDescriptor]) -> Vec<String> {
    voices.iter().flat_map(VoiceDescriptor::to_fields).collect()
}

/// Criteria for `SetVoiceByProperties`. Zero / `None` leaves a criterion open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceSelection {
    pub language: Option<String>,
    pub gender: u8,
    pub age: u8,
}

impl VoiceSelection {
    /// Build a selection from managed-side integers.
    ///
    /// The engine stores gender and age in single bytes, so larger values are
    /// truncated the same way the C struct assignment would.
    pub fn from_managed(language: Option<String>, gender: i32, age: i32) -> Self {
        Self {
            language,
            gender: gender as u8,
            age: age as u8,
        }
    }
}
