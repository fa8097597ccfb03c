//! Forwarding audio chunks to a consumer whose delivery can fail.

use std::fmt::Display;

use crate::{AudioSink, ChunkAction};

/// Hands one chunk to the final consumer. `None` is the end-of-stream marker.
pub trait ChunkDelivery {
    type Error: Display;

    fn deliver(&mut self, chunk: Option<&[u8]>) -> Result<(), Self::Error>;
}

/// An [`AudioSink`] that aborts generation at the first failed delivery.
///
/// Once a delivery has failed nothing else reaches the consumer, the
/// end-of-stream marker included.
pub struct DeliveryRelay<D> {
    delivery: D,
    failed: bool,
}

impl<D> DeliveryRelay<D> {
    pub fn new(delivery: D) -> Self {
        Self {
            delivery,
            failed: false,
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> D {
        self.delivery
    }
}

impl<D: ChunkDelivery> AudioSink for DeliveryRelay<D> {
    fn on_audio_chunk(&mut self, chunk: Option<&[u8]>) -> ChunkAction {
        if self.failed {
            return ChunkAction::Abort;
        }
        match self.delivery.deliver(chunk) {
            Ok(()) => ChunkAction::Continue,
            Err(err) => {
                log::error!("audio callback failed: {err}");
                self.failed = true;
                ChunkAction::Abort
            }
        }
    }
}
