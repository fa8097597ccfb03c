use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_short, c_uint, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use crate::error::EngineError;
use crate::voice::{VoiceDescriptor, VoiceSelection};
use crate::{ChunkAction, Parameter, SpeechEngine, TextEncoding};

use super::ffi;

/// The eSpeak engine, driven in synchronous output mode.
///
/// eSpeak keeps its state in process-wide globals, so this type carries no
/// data of its own; every instance talks to the same engine.
///
/// ```rust,no_run
/// use espeak_bridge::{engines::espeak::EspeakEngine, SpeechEngine};
///
/// let engine = EspeakEngine::new();
/// let sample_rate = engine.initialize(1000, None, 0);
/// assert!(sample_rate > 0);
/// println!("eSpeak {}", engine.info());
/// ```
#[derive(Debug, Default)]
pub struct EspeakEngine {
    _private: (),
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

/// State handed to [`synth_callback`] through the engine's `user_data`.
///
/// Lives on the stack of [`EspeakEngine::synth`]; the engine only calls back
/// while that frame is active.
struct SynthContext<'a> {
    on_samples: &'a mut dyn FnMut(&[i16]) -> ChunkAction,
}

/// Trampoline registered with `espeak_SetSynthCallback`.
unsafe extern "C" fn synth_callback(
    wav: *mut c_short,
    numsamples: c_int,
    events: *mut ffi::espeak_EVENT,
) -> c_int {
    if events.is_null() || (*events).user_data.is_null() {
        log::error!("synth callback invoked without a synthesis context");
        return ffi::SYNTH_ABORT;
    }
    let context = &mut *((*events).user_data as *mut SynthContext<'_>);

    let samples: &[i16] = if wav.is_null() || numsamples < 1 {
        &[]
    } else {
        std::slice::from_raw_parts(wav, numsamples as usize)
    };

    match panic::catch_unwind(AssertUnwindSafe(|| (context.on_samples)(samples))) {
        Ok(ChunkAction::Continue) => ffi::SYNTH_CONTINUE,
        Ok(ChunkAction::Abort) => ffi::SYNTH_ABORT,
        Err(_) => {
            log::error!("audio sink panicked, aborting synthesis");
            ffi::SYNTH_ABORT
        }
    }
}

fn encoding_flags(encoding: TextEncoding) -> c_uint {
    match encoding {
        TextEncoding::Utf8 => ffi::espeakCHARS_UTF8,
        TextEncoding::Utf8Ssml => ffi::espeakCHARS_UTF8 | ffi::espeakSSML,
    }
}

unsafe fn c_string_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Convert one engine voice record.
///
/// # Safety
/// `voice` must point to a record whose string fields are null or valid
/// NUL-terminated strings.
unsafe fn voice_from_raw(voice: &ffi::espeak_VOICE) -> VoiceDescriptor {
    // The first byte of `languages` is the priority of the first language.
    let language = if voice.languages.is_null() || *voice.languages == 0 {
        String::new()
    } else {
        c_string_lossy(voice.languages.add(1))
    };

    VoiceDescriptor {
        language,
        identifier: c_string_lossy(voice.identifier),
        gender: voice.gender,
        age: voice.age,
    }
}

/// Walk a NULL-terminated voice list.
///
/// # Safety
/// `list` must be null or point to a NULL-terminated array of valid records.
unsafe fn voices_from_list(list: *const *const ffi::espeak_VOICE) -> Vec<VoiceDescriptor> {
    let mut voices = Vec::new();
    if list.is_null() {
        return voices;
    }

    let mut cursor = list;
    while !(*cursor).is_null() {
        voices.push(voice_from_raw(&**cursor));
        cursor = cursor.add(1);
    }
    voices
}

impl SpeechEngine for EspeakEngine {
    fn initialize(
        &self,
        buffer_size_millis: i32,
        resource_path: Option<&str>,
        options: i32,
    ) -> i32 {
        let c_path = match resource_path.map(CString::new).transpose() {
            Ok(path) => path,
            Err(err) => {
                log::error!("espeak_Initialize: invalid resource path: {err}");
                return EngineError::INTERNAL_ERROR;
            }
        };

        unsafe {
            ffi::espeak_Initialize(
                ffi::AUDIO_OUTPUT_SYNCHRONOUS,
                buffer_size_millis,
                c_path.as_ref().map_or(ptr::null(), |p| p.as_ptr()),
                options,
            )
        }
    }

    fn info(&self) -> String {
        unsafe { c_string_lossy(ffi::espeak_Info(ptr::null_mut())) }
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        unsafe { voices_from_list(ffi::espeak_ListVoices(ptr::null_mut())) }
    }

    fn set_voice_by_name(&self, name: &str) -> Result<(), EngineError> {
        let c_name = CString::new(name).map_err(|_| EngineError::NotFound)?;
        EngineError::check(unsafe { ffi::espeak_SetVoiceByName(c_name.as_ptr()) })
    }

    fn set_voice_by_properties(&self, selection: &VoiceSelection) -> Result<(), EngineError> {
        let c_language = selection
            .language
            .as_deref()
            .map(CString::new)
            .transpose()
            .map_err(|_| EngineError::NotFound)?;

        let mut voice_select = ffi::espeak_VOICE {
            name: ptr::null(),
            languages: c_language.as_ref().map_or(ptr::null(), |l| l.as_ptr()),
            identifier: ptr::null(),
            gender: selection.gender,
            age: selection.age,
            variant: 0,
            xx1: 0,
            score: 0,
            spare: ptr::null_mut(),
        };

        EngineError::check(unsafe { ffi::espeak_SetVoiceByProperties(&mut voice_select) })
    }

    fn set_parameter(&self, parameter: Parameter, value: i32) -> Result<(), EngineError> {
        EngineError::check(unsafe { ffi::espeak_SetParameter(parameter.code(), value, 0) })
    }

    fn get_parameter(&self, parameter: Parameter, current: i32) -> i32 {
        unsafe { ffi::espeak_GetParameter(parameter.code(), current) }
    }

    fn synth(
        &self,
        text: &str,
        encoding: TextEncoding,
        on_samples: &mut dyn FnMut(&[i16]) -> ChunkAction,
    ) -> Result<(), EngineError> {
        let c_text = CString::new(text).map_err(|_| EngineError::InternalError)?;
        let mut context = SynthContext { on_samples };
        let mut unique_identifier: c_uint = 0;

        let code = unsafe {
            ffi::espeak_SetSynthCallback(synth_callback);
            ffi::espeak_Synth(
                c_text.as_ptr() as *const c_void,
                text.len(),
                0,
                ffi::POS_CHARACTER,
                0, // no end position
                encoding_flags(encoding),
                &mut unique_identifier,
                &mut context as *mut SynthContext<'_> as *mut c_void,
            )
        };
        EngineError::check(code)
    }

    fn synchronize(&self) -> Result<(), EngineError> {
        EngineError::check(unsafe { ffi::espeak_Synchronize() })
    }

    fn cancel(&self) -> Result<(), EngineError> {
        EngineError::check(unsafe { ffi::espeak_Cancel() })
    }
}
