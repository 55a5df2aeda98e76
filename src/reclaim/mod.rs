// Purpose: move object teardown off the render thread
// The render loop owns the producer half; a reclaimer thread owns the consumer

#[cfg(feature = "rtrb")]
pub mod queue;

#[cfg(feature = "rtrb")]
pub use queue::{return_queue, Reclaimer, ReturnQueue};

use std::sync::Arc;

use crate::preset::{Instrument, TuningTable};

/*
Deferred Reclamation
====================

Dropping an instrument or the last handle to a tuning table can free
memory, and freeing memory can take a lock inside the allocator. The render
thread must not do either, so it packs the object into a `Reclaim` request
and pushes it onto a bounded queue. Whoever drains the queue does the drop.

  render thread                          reclaimer thread
  ─────────────                          ────────────────
  rebind(new)
    old ──► Reclaim::Instrument(old) ──► [ queue ] ──► drop(old)

The push never blocks and never allocates (the ring buffer is allocated up
front). Once a request is in the queue the render side no longer owns the
object; the consumer releases it exactly once.

Saturation
----------

If the queue is full the request comes straight back and is dropped right
there, on the render thread, so the object is never leaked. The
event is logged, counted by the sink, and reported as `Retire::Inline` so
callers can surface it. A consumer that falls permanently behind turns
every retire into an inline drop: this is a known degradation mode, not a
recoverable state, and hosts should size the queue and drain it promptly.
*/

/// A release request travelling from the render thread to the reclaimer.
pub enum Reclaim {
    /// Drop an instrument binding that is no longer selected.
    Instrument(Box<dyn Instrument>),
    /// Drop one reference to a tuning table.
    Tuning(Arc<TuningTable>),
}

impl Reclaim {
    /// Perform the release. May block; never call on the render thread
    /// except as the saturation fallback.
    pub fn release(self) {
        match self {
            Reclaim::Instrument(instrument) => drop(instrument),
            Reclaim::Tuning(tuning) => drop(tuning),
        }
    }
}

impl core::fmt::Debug for Reclaim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Reclaim::Instrument(instrument) => f
                .debug_tuple("Instrument")
                .field(&instrument.name())
                .finish(),
            Reclaim::Tuning(tuning) => f.debug_tuple("Tuning").field(&tuning.name()).finish(),
        }
    }
}

/// Producer side of a return queue.
///
/// `push` must not block or allocate. On saturation the request is handed
/// back untouched.
pub trait ReclaimSink {
    fn push(&mut self, request: Reclaim) -> Result<(), Reclaim>;

    /// Called after a request had to be released inline.
    ///
    /// Default implementation does nothing.
    fn note_saturated(&mut self) {
        // Default: do nothing
    }
}

#[cfg(feature = "rtrb")]
impl ReclaimSink for rtrb::Producer<Reclaim> {
    fn push(&mut self, request: Reclaim) -> Result<(), Reclaim> {
        rtrb::Producer::push(self, request).map_err(|rtrb::PushError::Full(request)| request)
    }
}

/// How a retired object was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retire {
    /// There was nothing to release.
    Nothing,
    /// Queued for the reclaimer.
    Deferred,
    /// Queue was full; released synchronously on the calling thread.
    Inline,
}

impl Retire {
    /// True if the saturation fallback ran.
    pub fn is_inline(self) -> bool {
        self == Retire::Inline
    }

    /// Combine two outcomes, keeping the most severe.
    pub fn merge(self, other: Retire) -> Retire {
        match (self, other) {
            (Retire::Inline, _) | (_, Retire::Inline) => Retire::Inline,
            (Retire::Deferred, _) | (_, Retire::Deferred) => Retire::Deferred,
            _ => Retire::Nothing,
        }
    }
}

/// Render-thread capability.
///
/// Holding one proves exclusive access to the return queue's producer,
/// which only the render loop has. Operations that may only run in render
/// context (rebinding a channel's instrument, swapping its tuning) take
/// `&mut RenderContext`.
pub struct RenderContext<'a> {
    sink: &'a mut dyn ReclaimSink,
}

impl<'a> RenderContext<'a> {
    pub fn new(sink: &'a mut dyn ReclaimSink) -> Self {
        Self { sink }
    }

    /// Hand a request to the reclaimer, or release it here if the queue
    /// is saturated.
    pub fn retire(&mut self, request: Reclaim) -> Retire {
        match self.sink.push(request) {
            Ok(()) => Retire::Deferred,
            Err(request) => {
                log::error!("Synth return queue full, releasing {:?} on render thread", request);
                request.release();
                self.sink.note_saturated();
                Retire::Inline
            }
        }
    }

    pub fn retire_instrument(&mut self, instrument: Box<dyn Instrument>) -> Retire {
        self.retire(Reclaim::Instrument(instrument))
    }

    pub fn retire_tuning(&mut self, tuning: Arc<TuningTable>) -> Retire {
        self.retire(Reclaim::Tuning(tuning))
    }
}
