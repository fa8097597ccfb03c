use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroI32;

use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Identifier of a native handle, stored in the managed object's
/// `int mNativeData` field.
///
/// Only positive values are valid ids; `0` means "no handle".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(NonZeroI32);

impl HandleId {
    pub fn from_raw(raw: i32) -> Option<Self> {
        if raw > 0 {
            NonZeroI32::new(raw).map(Self)
        } else {
            None
        }
    }

    pub fn as_raw(self) -> i32 {
        self.0.get()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Idle,
    Synthesizing,
}

/// Per-instance state bridging one managed synthesizer to the engine.
///
/// `owner` is a non-owning reference to the managed object (a JNI weak
/// global reference in the exported layer); holding it never keeps the
/// managed object alive.
#[derive(Debug)]
pub struct NativeHandle<O> {
    pub(crate) owner: O,
    pub sample_rate: i32,
    pub channel_count: i32,
    pub audio_format: i32,
    pub buffer_size_millis: i32,
    pub state: HandleState,
}

impl<O> NativeHandle<O> {
    pub(crate) fn new(owner: O, config: &BridgeConfig) -> Self {
        Self {
            owner,
            sample_rate: 0,
            channel_count: config.channel_count.count(),
            audio_format: config.audio_format.code(),
            buffer_size_millis: config.buffer_size_millis,
            state: HandleState::Idle,
        }
    }
}

/// Live handles keyed by id.
///
/// Ids are handed out from a counter and are not reused until it wraps, so a
/// stale id held by the managed side is reported rather than aliasing a newer
/// handle.
pub(crate) struct HandleRegistry<O> {
    handles: HashMap<HandleId, NativeHandle<O>>,
    next_id: i32,
    capacity: usize,
}

impl<O> HandleRegistry<O> {
    pub fn new(capacity: usize) -> Self {
        Self {
            handles: HashMap::new(),
            next_id: 1,
            capacity,
        }
    }

    pub fn insert(&mut self, handle: NativeHandle<O>) -> Result<HandleId, BridgeError> {
        if self.handles.len() >= self.capacity {
            return Err(BridgeError::Allocation(self.capacity));
        }

        let id = loop {
            let candidate = HandleId::from_raw(self.next_id);
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            match candidate {
                Some(id) if !self.handles.contains_key(&id) => break id,
                _ => continue,
            }
        };

        self.handles.insert(id, handle);
        Ok(id)
    }

    pub fn get(&self, id: HandleId) -> Result<&NativeHandle<O>, BridgeError> {
        self.handles
            .get(&id)
            .ok_or(BridgeError::StaleHandle(id.as_raw()))
    }

    pub fn get_mut(&mut self, id: HandleId) -> Result<&mut NativeHandle<O>, BridgeError> {
        self.handles
            .get_mut(&id)
            .ok_or(BridgeError::StaleHandle(id.as_raw()))
    }

    pub fn remove(&mut self, id: HandleId) -> Result<NativeHandle<O>, BridgeError> {
        self.handles
            .remove(&id)
            .ok_or(BridgeError::StaleHandle(id.as_raw()))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}
