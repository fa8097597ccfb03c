//! The native bridge: every managed entry point as a Rust method.
//!
//! A [`Bridge`] owns the engine and the registry of native handles. The
//! exported JNI functions are thin shims over these methods; they resolve the
//! handle id stored on the managed object, call in here, and collapse the
//! `Result` to a boolean with [`report`].
//!
//! # Threading
//!
//! The engine is synchronous: [`Bridge::synthesize`] invokes the sink on the
//! calling thread, from inside the engine call, one chunk at a time. The
//! handle registry lock is only held for lookups and state changes, never
//! across an engine call, so [`Bridge::stop`] may be issued from another
//! thread while a synthesis is running.
//!
//! A handle that is synthesizing refuses a second `synthesize` and refuses
//! `destroy` until the running call returns.
//!
//! The engine itself is process-global, so only one synthesis runs at a time
//! across all handles. A `synthesize` on another handle while one is running
//! is refused with [`BridgeError::EngineBusy`] rather than queued.

mod handle;
mod relay;

pub use handle::{HandleId, HandleState, NativeHandle};
pub use relay::{ChunkDelivery, DeliveryRelay};

use parking_lot::Mutex;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::voice::{VoiceDescriptor, VoiceSelection};
use crate::{AudioSink, ChunkAction, Parameter, SpeechEngine, TextEncoding};

use handle::HandleRegistry;

pub struct Bridge<E, O = ()> {
    engine: E,
    config: BridgeConfig,
    handles: Mutex<HandleRegistry<O>>,
    synthesis: Mutex<()>,
}

impl<E: SpeechEngine, O> Bridge<E, O> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, BridgeConfig::default())
    }

    pub fn with_config(engine: E, config: BridgeConfig) -> Self {
        Self {
            engine,
            handles: Mutex::new(HandleRegistry::new(config.max_handles)),
            config,
            synthesis: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Number of handles that have been created and not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.handles.lock().len()
    }

    /// Allocate a handle for `owner` and initialize the engine.
    ///
    /// When the engine reports a non-positive sample rate the handle stays
    /// registered and its id is carried in [`BridgeError::EngineInit`], so
    /// the caller can still attach it to the owner and destroy it later.
    pub fn create(&self, owner: O, resource_path: Option<&str>) -> Result<HandleId, BridgeError> {
        let id = self
            .handles
            .lock()
            .insert(NativeHandle::new(owner, &self.config))?;

        log::trace!("create {id}: initializing with path {resource_path:?}");
        let sample_rate = self.engine.initialize(
            self.config.buffer_size_millis,
            resource_path,
            self.config.engine_options,
        );
        self.handles.lock().get_mut(id)?.sample_rate = sample_rate;

        if sample_rate > 0 {
            log::info!("Engine initialized at {sample_rate} Hz for handle {id}");
            Ok(id)
        } else {
            Err(BridgeError::EngineInit {
                handle: id,
                sample_rate,
            })
        }
    }

    /// [`create`](Self::create), then record the new id on the owner with
    /// `attach`.
    ///
    /// The id is attached even when engine initialization fails, so the owner
    /// can still destroy it. If attaching a healthy handle fails, the handle
    /// is destroyed again.
    pub fn create_attached(
        &self,
        owner: O,
        resource_path: Option<&str>,
        attach: impl FnOnce(HandleId) -> Result<(), BridgeError>,
    ) -> Result<HandleId, BridgeError> {
        match self.create(owner, resource_path) {
            Ok(id) => {
                if let Err(err) = attach(id) {
                    self.destroy(id).ok();
                    return Err(err);
                }
                Ok(id)
            }
            Err(BridgeError::EngineInit {
                handle,
                sample_rate,
            }) => {
                attach(handle)?;
                Err(BridgeError::EngineInit {
                    handle,
                    sample_rate,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Free a handle, returning its owner reference so the caller can release it.
    pub fn destroy(&self, id: HandleId) -> Result<O, BridgeError> {
        log::trace!("destroy {id}");
        let mut handles = self.handles.lock();
        if handles.get(id)?.state == HandleState::Synthesizing {
            return Err(BridgeError::HandleBusy(id));
        }
        Ok(handles.remove(id)?.owner)
    }

    /// [`destroy`](Self::destroy), then clear the id from the owner with
    /// `detach`. A handle that could not be destroyed stays attached.
    pub fn destroy_attached(
        &self,
        id: HandleId,
        detach: impl FnOnce() -> Result<(), BridgeError>,
    ) -> Result<O, BridgeError> {
        let owner = self.destroy(id)?;
        detach()?;
        Ok(owner)
    }

    /// Run `f` against the owner reference of a live handle.
    pub fn with_owner<R>(&self, id: HandleId, f: impl FnOnce(&O) -> R) -> Result<R, BridgeError> {
        let handles = self.handles.lock();
        Ok(f(&handles.get(id)?.owner))
    }

    pub fn version(&self) -> String {
        log::trace!("version");
        self.engine.info()
    }

    pub fn sample_rate(&self, id: HandleId) -> Result<i32, BridgeError> {
        self.read(id, |h| h.sample_rate)
    }

    pub fn channel_count(&self, id: HandleId) -> Result<i32, BridgeError> {
        self.read(id, |h| h.channel_count)
    }

    pub fn audio_format(&self, id: HandleId) -> Result<i32, BridgeError> {
        self.read(id, |h| h.audio_format)
    }

    pub fn buffer_size_millis(&self, id: HandleId) -> Result<i32, BridgeError> {
        self.read(id, |h| h.buffer_size_millis)
    }

    pub fn state(&self, id: HandleId) -> Result<HandleState, BridgeError> {
        self.read(id, |h| h.state)
    }

    fn read<T>(&self, id: HandleId, f: impl FnOnce(&NativeHandle<O>) -> T) -> Result<T, BridgeError> {
        Ok(f(self.handles.lock().get(id)?))
    }

    pub fn available_voices(&self) -> Vec<VoiceDescriptor> {
        let voices = self.engine.list_voices();
        log::trace!("available_voices: {} voices", voices.len());
        voices
    }

    pub fn set_voice_by_name(&self, name: &str) -> Result<(), BridgeError> {
        log::trace!("set_voice_by_name(name={name})");
        Ok(self.engine.set_voice_by_name(name)?)
    }

    pub fn set_voice_by_properties(&self, selection: &VoiceSelection) -> Result<(), BridgeError> {
        log::trace!(
            "set_voice_by_properties(language={:?}, gender={}, age={})",
            selection.language,
            selection.gender,
            selection.age
        );
        Ok(self.engine.set_voice_by_properties(selection)?)
    }

    pub fn set_parameter(&self, parameter: Parameter, value: i32) -> Result<(), BridgeError> {
        log::trace!("set_parameter(parameter={parameter:?}, value={value})");
        Ok(self.engine.set_parameter(parameter, value)?)
    }

    pub fn get_parameter(&self, parameter: Parameter, current: i32) -> i32 {
        log::trace!("get_parameter(parameter={parameter:?}, current={current})");
        self.engine.get_parameter(parameter, current)
    }

    /// Synthesize `text`, delivering audio to `sink` before returning.
    ///
    /// Each engine block reaches the sink as 16-bit native-endian bytes. The
    /// engine's end-of-data block becomes a single `None` and stops
    /// generation. After the engine call returns the bridge waits for the
    /// engine to drain.
    pub fn synthesize(
        &self,
        id: HandleId,
        text: &str,
        is_markup: bool,
        sink: &mut dyn AudioSink,
    ) -> Result<(), BridgeError> {
        log::trace!("synthesize {id} (markup={is_markup}, {} bytes)", text.len());
        if let Some(offset) = text.find('\0') {
            return Err(BridgeError::InvalidText(offset));
        }

        let _active = self.begin_synthesis(id)?;
        let _engine = self
            .synthesis
            .try_lock()
            .ok_or(BridgeError::EngineBusy)?;

        let mut relay = |samples: &[i16]| relay_chunk(samples, &mut *sink);
        let result = self
            .engine
            .synth(text, TextEncoding::for_markup(is_markup), &mut relay);

        if let Err(err) = self.engine.synchronize() {
            log::error!("synchronize: {err}.");
        }

        Ok(result?)
    }

    fn begin_synthesis(&self, id: HandleId) -> Result<ActiveSynthesis<'_, E, O>, BridgeError> {
        let mut handles = self.handles.lock();
        let handle = handles.get_mut(id)?;
        if handle.state == HandleState::Synthesizing {
            return Err(BridgeError::HandleBusy(id));
        }
        handle.state = HandleState::Synthesizing;
        Ok(ActiveSynthesis { bridge: self, id })
    }

    /// Ask the engine to cancel any running synthesis. Always succeeds.
    pub fn stop(&self) {
        log::trace!("stop");
        if let Err(err) = self.engine.cancel() {
            log::warn!("cancel: {err}.");
        }
    }
}

/// Returns a handle to `Idle` when the synthesis call ends, panics included.
struct ActiveSynthesis<'a, E, O> {
    bridge: &'a Bridge<E, O>,
    id: HandleId,
}

impl<E, O> Drop for ActiveSynthesis<'_, E, O> {
    fn drop(&mut self) {
        if let Ok(handle) = self.bridge.handles.lock().get_mut(self.id) {
            handle.state = HandleState::Idle;
        }
    }
}

fn relay_chunk(samples: &[i16], sink: &mut dyn AudioSink) -> ChunkAction {
    if samples.is_empty() {
        sink.on_audio_chunk(None);
        return ChunkAction::Abort;
    }

    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
    sink.on_audio_chunk(Some(&bytes))
}

/// Collapse a bridge result to the success flag the managed side expects,
/// logging the cause of any failure under `operation`.
pub fn report<T>(operation: &str, result: Result<T, BridgeError>) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            log::error!("{operation}: {err}.");
            false
        }
    }
}
