//! Native methods of `com.reecedunn.espeak.SpeechSynthesis`.
//!
//! Each export resolves the handle id stored in the managed object's
//! `int mNativeData` field, forwards to the process-wide [`Bridge`], and
//! collapses the outcome to what the Java signature expects. Failures are
//! logged, never thrown.
//!
//! Using a handle after `nativeDestroy` is a contract violation by the
//! managed side; it is logged, and panics in debug builds.
//!
//! # Threading
//!
//! A synthesizer instance is expected to be driven from one thread, with
//! `nativeStop` as the only call that may arrive from elsewhere while
//! `nativeSynthesize` is running. `nativeSynthesize` and `nativeDestroy` on a
//! handle that is still synthesizing are refused, and so is `nativeSynthesize`
//! on any handle while another one holds the engine.

use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr;
use std::sync::OnceLock;

use jni::objects::{JClass, JFieldID, JMethodID, JObject, JObjectArray, JString, JValue, WeakRef};
use jni::signature::{Primitive, ReturnType};
use jni::sys::{jboolean, jint, jobjectArray, jstring, JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};

use crate::bridge::{report, Bridge, ChunkDelivery, DeliveryRelay, HandleId};
use crate::config::BridgeConfig;
use crate::engines::espeak::EspeakEngine;
use crate::error::BridgeError;
use crate::voice::{flatten_voices, VoiceSelection};
use crate::{logging, Parameter};

/// Path of an optional JSON [`BridgeConfig`] read when the bridge is first used.
pub const CONFIG_ENV: &str = "ESPEAK_BRIDGE_CONFIG";

type JavaBridge = Bridge<EspeakEngine, WeakRef>;

/// Method and field ids resolved once by `nativeClassInit`.
struct ClassIds {
    synth_callback: JMethodID,
    native_data: JFieldID,
}

static CLASS_IDS: OnceLock<ClassIds> = OnceLock::new();
static BRIDGE: OnceLock<JavaBridge> = OnceLock::new();

fn bridge() -> &'static JavaBridge {
    BRIDGE.get_or_init(|| Bridge::with_config(EspeakEngine::new(), load_config()))
}

fn load_config() -> BridgeConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) else {
        return BridgeConfig::default();
    };
    BridgeConfig::from_json_file(&path).unwrap_or_else(|err| {
        log::warn!("Ignoring {}: {err}", path.display());
        BridgeConfig::default()
    })
}

fn class_ids() -> Result<&'static ClassIds, BridgeError> {
    CLASS_IDS.get().ok_or(BridgeError::NotInitialized)
}

fn resolve_class_ids(env: &mut JNIEnv, class: &JClass) -> Result<ClassIds, BridgeError> {
    Ok(ClassIds {
        synth_callback: env.get_method_id(class, "nativeSynthCallback", "([B)V")?,
        native_data: env.get_field_id(class, "mNativeData", "I")?,
    })
}

fn handle_of(env: &mut JNIEnv, object: &JObject) -> Result<HandleId, BridgeError> {
    let ids = class_ids()?;
    let raw = env
        .get_field_unchecked(object, ids.native_data, ReturnType::Primitive(Primitive::Int))?
        .i()?;
    HandleId::from_raw(raw).ok_or(BridgeError::StaleHandle(raw))
}

fn attach_handle(env: &mut JNIEnv, object: &JObject, id: Option<HandleId>) -> Result<(), BridgeError> {
    let ids = class_ids()?;
    let raw = id.map_or(0, HandleId::as_raw);
    env.set_field_unchecked(object, ids.native_data, JValue::Int(raw))?;
    Ok(())
}

fn optional_string(env: &mut JNIEnv, value: &JString) -> Result<Option<String>, BridgeError> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(env.get_string(value)?.into()))
}

fn required_string(
    env: &mut JNIEnv,
    value: &JString,
    name: &'static str,
) -> Result<String, BridgeError> {
    optional_string(env, value)?.ok_or(BridgeError::NullArgument(name))
}

fn check_precondition<T>(operation: &str, result: &Result<T, BridgeError>) {
    if let Err(BridgeError::StaleHandle(raw)) = result {
        log::error!("{operation}: called on destroyed or unknown handle {raw}");
        if cfg!(debug_assertions) {
            panic!("{operation}: native handle {raw} used after destroy");
        }
    }
}

fn to_jboolean<T>(operation: &str, result: Result<T, BridgeError>) -> jboolean {
    check_precondition(operation, &result);
    if report(operation, result) {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

fn to_jint(operation: &str, result: Result<i32, BridgeError>) -> jint {
    check_precondition(operation, &result);
    result.unwrap_or_else(|err| {
        log::error!("{operation}: {err}.");
        0
    })
}

/// Calls `nativeSynthCallback(byte[])` on the owner; end-of-stream is `null`.
struct JavaCallback<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    target: &'a JObject<'local>,
    method: JMethodID,
}

impl ChunkDelivery for JavaCallback<'_, '_> {
    type Error = jni::errors::Error;

    // An exception thrown by the callback is left pending for the caller of
    // nativeSynthesize.
    fn deliver(&mut self, chunk: Option<&[u8]>) -> jni::errors::Result<()> {
        let array = chunk
            .map(|bytes| self.env.byte_array_from_slice(bytes))
            .transpose()?;
        let null = JObject::null();
        let arg: &JObject = array.as_deref().unwrap_or(&null);

        let result = unsafe {
            self.env.call_method_unchecked(
                self.target,
                self.method,
                ReturnType::Primitive(Primitive::Void),
                &[JValue::Object(arg).as_jni()],
            )
        };

        // One local reference per chunk would overflow the local table on
        // long utterances.
        if let Some(array) = array {
            self.env.delete_local_ref(array)?;
        }
        result.map(drop)
    }
}

fn synthesize<'local>(
    env: &mut JNIEnv<'local>,
    object: &JObject<'local>,
    text: &JString<'local>,
    is_markup: bool,
) -> Result<(), BridgeError> {
    let ids = class_ids()?;
    let id = handle_of(env, object)?;
    let text = required_string(env, text, "text")?;

    let target = {
        let env: &JNIEnv<'local> = env;
        bridge()
            .with_owner(id, |owner| owner.upgrade_local(env))??
            .ok_or(BridgeError::OwnerReleased(id))?
    };

    let mut relay = DeliveryRelay::new(JavaCallback {
        env,
        target: &target,
        method: ids.synth_callback,
    });
    bridge().synthesize(id, &text, is_markup, &mut relay)
}

fn available_voices<'local>(env: &mut JNIEnv<'local>) -> Result<JObjectArray<'local>, BridgeError> {
    let fields = flatten_voices(&bridge().available_voices());
    let array = env.new_object_array(fields.len() as jint, "java/lang/String", JObject::null())?;
    for (index, field) in fields.iter().enumerate() {
        let value = env.new_string(field)?;
        env.set_object_array_element(&array, index as jint, &value)?;
        env.delete_local_ref(value)?;
    }
    Ok(array)
}

fn create(env: &mut JNIEnv, object: &JObject, path: &JString) -> Result<(), BridgeError> {
    class_ids()?;
    let path = optional_string(env, path)?;
    let owner = env
        .new_weak_ref(object)?
        .ok_or(BridgeError::NullArgument("this"))?;

    bridge()
        .create_attached(owner, path.as_deref(), |id| {
            attach_handle(env, object, Some(id))
        })
        .map(drop)
}

fn destroy(env: &mut JNIEnv, object: &JObject) -> Result<(), BridgeError> {
    let id = handle_of(env, object)?;
    bridge()
        .destroy_attached(id, || attach_handle(env, object, None))
        .map(drop)
}

/// The version `JNI_OnLoad` reports for a VM that supports `reported`.
fn negotiated_version(reported: jint) -> Option<jint> {
    (reported >= JNI_VERSION_1_6).then_some(JNI_VERSION_1_6)
}

#[no_mangle]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _reserved: *mut c_void) -> jint {
    logging::init();
    let reported = match vm.get_env().and_then(|env| env.get_version()) {
        Ok(version) => jint::from(version),
        Err(err) => {
            log::error!("Failed to get the environment using GetEnv(): {err}");
            return -1;
        }
    };
    negotiated_version(reported).unwrap_or_else(|| {
        log::error!("JNI version {reported:#x} is older than 1.6");
        -1
    })
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeClassInit<'local>(
    mut env: JNIEnv<'local>,
    class: JClass<'local>,
) -> jboolean {
    log::trace!("nativeClassInit");
    let result = resolve_class_ids(&mut env, &class).map(|ids| {
        if CLASS_IDS.set(ids).is_err() {
            log::debug!("nativeClassInit: ids already cached");
        }
    });
    to_jboolean("nativeClassInit", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeCreate<'local>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
    path: JString<'local>,
) -> jboolean {
    log::trace!("nativeCreate");
    let result = create(&mut env, &object, &path);
    to_jboolean("nativeCreate", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeDestroy<'local>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
) -> jboolean {
    log::trace!("nativeDestroy");
    let result = destroy(&mut env, &object);
    to_jboolean("nativeDestroy", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetVersion<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    match env.new_string(bridge().version()) {
        Ok(version) => version.into_raw(),
        Err(err) => {
            log::error!("nativeGetVersion: {err}");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetSampleRate<'local>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
) -> jint {
    let result = handle_of(&mut env, &object).and_then(|id| bridge().sample_rate(id));
    to_jint("nativeGetSampleRate", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetChannelCount<'local>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
) -> jint {
    let result = handle_of(&mut env, &object).and_then(|id| bridge().channel_count(id));
    to_jint("nativeGetChannelCount", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetAudioFormat<'local>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
) -> jint {
    let result = handle_of(&mut env, &object).and_then(|id| bridge().audio_format(id));
    to_jint("nativeGetAudioFormat", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetBufferSizeInMillis<
    'local,
>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
) -> jint {
    let result = handle_of(&mut env, &object).and_then(|id| bridge().buffer_size_millis(id));
    to_jint("nativeGetBufferSizeInMillis", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetAvailableVoices<'local>(
    mut env: JNIEnv<'local>,
    _object: JObject<'local>,
) -> jobjectArray {
    match available_voices(&mut env) {
        Ok(array) => array.into_raw(),
        Err(err) => {
            log::error!("nativeGetAvailableVoices: {err}");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeSetVoiceByName<'local>(
    mut env: JNIEnv<'local>,
    _object: JObject<'local>,
    name: JString<'local>,
) -> jboolean {
    let result = required_string(&mut env, &name, "name")
        .and_then(|name| bridge().set_voice_by_name(&name));
    to_jboolean("espeak_SetVoiceByName", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeSetVoiceByProperties<
    'local,
>(
    mut env: JNIEnv<'local>,
    _object: JObject<'local>,
    language: JString<'local>,
    gender: jint,
    age: jint,
) -> jboolean {
    let result = optional_string(&mut env, &language).and_then(|language| {
        bridge().set_voice_by_properties(&VoiceSelection::from_managed(language, gender, age))
    });
    to_jboolean("espeak_SetVoiceByProperties", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeSetParameter<'local>(
    _env: JNIEnv<'local>,
    _object: JObject<'local>,
    parameter: jint,
    value: jint,
) -> jboolean {
    let result = bridge().set_parameter(Parameter::from(parameter), value);
    to_jboolean("espeak_SetParameter", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeGetParameter<'local>(
    _env: JNIEnv<'local>,
    _object: JObject<'local>,
    parameter: jint,
    current: jint,
) -> jint {
    bridge().get_parameter(Parameter::from(parameter), current)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeSynthesize<'local>(
    mut env: JNIEnv<'local>,
    object: JObject<'local>,
    text: JString<'local>,
    is_ssml: jboolean,
) -> jboolean {
    let result = synthesize(&mut env, &object, &text, is_ssml != JNI_FALSE);
    to_jboolean("espeak_Synth", result)
}

#[no_mangle]
pub extern "system" fn Java_com_reecedunn_espeak_SpeechSynthesis_nativeStop<'local>(
    _env: JNIEnv<'local>,
    _object: JObject<'local>,
) -> jboolean {
    bridge().stop();
    JNI_TRUE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_fail_before_class_init() {
        assert!(matches!(class_ids(), Err(BridgeError::NotInitialized)));
        assert_eq!(to_jboolean("nativeDestroy", class_ids().map(drop)), JNI_FALSE);
        assert_eq!(to_jint("nativeGetSampleRate", class_ids().map(|_| 22050)), 0);
    }

    #[test]
    fn results_collapse_to_managed_values() {
        assert_eq!(to_jboolean("op", Ok(())), JNI_TRUE);
        assert_eq!(to_jint("op", Ok(16000)), 16000);
        assert_eq!(to_jint("op", Err(BridgeError::NullArgument("text"))), 0);
    }

    #[test]
    fn requires_jni_1_6() {
        assert_eq!(negotiated_version(JNI_VERSION_1_6), Some(JNI_VERSION_1_6));
        assert_eq!(negotiated_version(0x0001_0008), Some(JNI_VERSION_1_6));
        assert_eq!(negotiated_version(0x0001_0004), None);
    }
}
