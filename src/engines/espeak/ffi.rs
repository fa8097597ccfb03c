//! Manual FFI bindings to the eSpeak C API (`speak_lib.h`).
//!
//! Only the calls the bridge uses are declared.

#![allow(non_camel_case_types, non_upper_case_globals, dead_code)]

use std::os::raw::{c_char, c_int, c_short, c_uchar, c_uint, c_void};

pub type espeak_AUDIO_OUTPUT = c_int;
pub const AUDIO_OUTPUT_PLAYBACK: espeak_AUDIO_OUTPUT = 0;
pub const AUDIO_OUTPUT_RETRIEVAL: espeak_AUDIO_OUTPUT = 1;
pub const AUDIO_OUTPUT_SYNCHRONOUS: espeak_AUDIO_OUTPUT = 2;
pub const AUDIO_OUTPUT_SYNCH_PLAYBACK: espeak_AUDIO_OUTPUT = 3;

pub type espeak_ERROR = c_int;

pub type espeak_POSITION_TYPE = c_int;
pub const POS_CHARACTER: espeak_POSITION_TYPE = 1;
pub const POS_WORD: espeak_POSITION_TYPE = 2;
pub const POS_SENTENCE: espeak_POSITION_TYPE = 3;

pub type espeak_PARAMETER = c_int;

pub const espeakCHARS_AUTO: c_uint = 0;
pub const espeakCHARS_UTF8: c_uint = 1;
pub const espeakSSML: c_uint = 0x10;

/// Synth callback return values.
pub const SYNTH_CONTINUE: c_int = 0;
pub const SYNTH_ABORT: c_int = 1;

/// Voice record (`espeak_VOICE`).
///
/// `languages` is a sequence of (priority byte, NUL-terminated name) pairs,
/// ending with a zero priority byte.
#[repr(C)]
pub struct espeak_VOICE {
    pub name: *const c_char,
    pub languages: *const c_char,
    pub identifier: *const c_char,
    pub gender: c_uchar,
    pub age: c_uchar,
    pub variant: c_uchar,
    pub xx1: c_uchar,
    pub score: c_int,
    pub spare: *mut c_void,
}

#[repr(C)]
pub union espeak_EVENT_id {
    pub number: c_int,
    pub name: *const c_char,
    pub string: [c_char; 8],
}

/// Event record handed to the synth callback alongside each audio block.
#[repr(C)]
pub struct espeak_EVENT {
    pub type_: c_int,
    pub unique_identifier: c_uint,
    pub text_position: c_int,
    pub length: c_int,
    pub audio_position: c_int,
    pub sample: c_int,
    pub user_data: *mut c_void,
    pub id: espeak_EVENT_id,
}

pub type t_espeak_callback =
    unsafe extern "C" fn(wav: *mut c_short, numsamples: c_int, events: *mut espeak_EVENT) -> c_int;

#[link(name = "espeak")]
extern "C" {
    pub fn espeak_Initialize(
        output: espeak_AUDIO_OUTPUT,
        buflength: c_int,
        path: *const c_char,
        options: c_int,
    ) -> c_int;

    pub fn espeak_SetSynthCallback(callback: t_espeak_callback);

    pub fn espeak_Synth(
        text: *const c_void,
        size: usize,
        position: c_uint,
        position_type: espeak_POSITION_TYPE,
        end_position: c_uint,
        flags: c_uint,
        unique_identifier: *mut c_uint,
        user_data: *mut c_void,
    ) -> espeak_ERROR;

    pub fn espeak_SetParameter(
        parameter: espeak_PARAMETER,
        value: c_int,
        relative: c_int,
    ) -> espeak_ERROR;

    pub fn espeak_GetParameter(parameter: espeak_PARAMETER, current: c_int) -> c_int;

    pub fn espeak_ListVoices(voice_spec: *mut espeak_VOICE) -> *mut *const espeak_VOICE;

    pub fn espeak_SetVoiceByName(name: *const c_char) -> espeak_ERROR;

    pub fn espeak_SetVoiceByProperties(voice_spec: *mut espeak_VOICE) -> espeak_ERROR;

    pub fn espeak_Cancel() -> espeak_ERROR;

    pub fn espeak_Synchronize() -> espeak_ERROR;

    pub fn espeak_Info(path_data: *mut *const c_char) -> *const c_char;
}
