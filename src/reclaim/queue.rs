use std::thread::{self, JoinHandle};
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};

use super::{Reclaim, ReclaimSink, RenderContext};

/// Create a bounded return queue.
///
/// The [`ReturnQueue`] goes to the render loop, the [`Reclaimer`] to a
/// thread that is allowed to block.
pub fn return_queue(capacity: usize) -> (ReturnQueue, Reclaimer) {
    let (tx, rx) = RingBuffer::new(capacity);
    (
        ReturnQueue {
            tx,
            saturations: 0,
        },
        Reclaimer { rx, released: 0 },
    )
}

/// Render-side half of the return queue.
pub struct ReturnQueue {
    tx: Producer<Reclaim>,
    saturations: u64,
}

impl ReturnQueue {
    /// Borrow the render-thread capability for one render tick.
    pub fn render_context(&mut self) -> RenderContext<'_> {
        RenderContext::new(self)
    }

    /// Free slots right now.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }

    /// How many requests had to be released inline so far.
    pub fn saturations(&self) -> u64 {
        self.saturations
    }

    /// True once the reclaimer has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_abandoned()
    }
}

impl ReclaimSink for ReturnQueue {
    #[inline]
    fn push(&mut self, request: Reclaim) -> Result<(), Reclaim> {
        ReclaimSink::push(&mut self.tx, request)
    }

    fn note_saturated(&mut self) {
        self.saturations += 1;
    }
}

/// Consumer half: performs the releases the render thread deferred.
pub struct Reclaimer {
    rx: Consumer<Reclaim>,
    released: u64,
}

impl Reclaimer {
    /// Release everything currently queued. Returns how many requests were
    /// handled.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(request) = self.rx.pop() {
            log::trace!("Reclaiming {:?}", request);
            request.release();
            count += 1;
        }
        self.released += count as u64;
        count
    }

    /// Requests waiting to be released.
    pub fn pending(&self) -> usize {
        self.rx.slots()
    }

    /// Total requests released by this reclaimer.
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Run on a background thread, draining every `interval` until the
    /// render side drops its [`ReturnQueue`]. The handle yields the total
    /// number of releases.
    pub fn spawn(mut self, interval: Duration) -> std::io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name("synth-reclaimer".into())
            .spawn(move || {
                log::debug!("Reclaimer started");
                loop {
                    self.drain();
                    if self.rx.is_abandoned() {
                        // Producer is gone; pick up anything pushed before it left
                        self.drain();
                        break;
                    }
                    thread::sleep(interval);
                }
                log::debug!("Reclaimer stopped after {} releases", self.released);
                self.released
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::TuningTable;
    use crate::reclaim::tests::Counted;
    use crate::reclaim::Retire;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counted(drops: &Arc<AtomicUsize>) -> Reclaim {
        Reclaim::Instrument(Box::new(Counted {
            name: "strings".into(),
            drops: drops.clone(),
        }))
    }

    #[test]
    fn test_drain_releases_queued_requests() {
        let drops = Arc::new(AtomicUsize::new(0));
        let (mut queue, mut reclaimer) = return_queue(8);

        {
            let mut rt = queue.render_context();
            assert_eq!(rt.retire(counted(&drops)), Retire::Deferred);
            assert_eq!(rt.retire(counted(&drops)), Retire::Deferred);
        }

        assert_eq!(reclaimer.pending(), 2);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        assert_eq!(reclaimer.drain(), 2);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert_eq!(reclaimer.released(), 2);
        assert_eq!(reclaimer.drain(), 0);
    }

    #[test]
    fn test_full_queue_counts_saturation() {
        let drops = Arc::new(AtomicUsize::new(0));
        let (mut queue, mut reclaimer) = return_queue(1);

        let first = queue.render_context().retire(counted(&drops));
        let second = queue.render_context().retire(counted(&drops));

        assert_eq!(first, Retire::Deferred);
        assert_eq!(second, Retire::Inline);
        assert_eq!(queue.saturations(), 1);
        assert_eq!(queue.slots(), 0);
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        reclaimer.drain();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_spawned_reclaimer_stops_when_queue_dropped() {
        let (mut queue, reclaimer) = return_queue(16);
        let handle = reclaimer
            .spawn(Duration::from_millis(1))
            .expect("spawn reclaimer");

        let tuning = Arc::new(TuningTable::equal_temperament("et", 0, 0));
        for _ in 0..5 {
            queue.render_context().retire(Reclaim::Tuning(tuning.clone()));
        }
        drop(queue);

        let released = handle.join().expect("reclaimer panicked");
        assert_eq!(released, 5);
        assert_eq!(Arc::strong_count(&tuning), 1);
    }
}
