use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use synth_channel::{
    channel::cc, io::midi::MidiEvent, return_queue, Channel, Instrument, PresetStore, ResetMode,
    Retire, Selector, TuningTable,
};

struct Preset {
    name: String,
    drops: Arc<AtomicUsize>,
}

impl Instrument for Preset {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Preset {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Store {
    drops: Arc<AtomicUsize>,
}

impl PresetStore for Store {
    fn resolve(&self, source: u16, bank: u16, program: u8) -> Option<Box<dyn Instrument>> {
        Some(Box::new(Preset {
            name: format!("{source}/{bank}/{program}"),
            drops: self.drops.clone(),
        }))
    }
}

#[test]
fn rebind_with_capacity_queues_exactly_one_release() {
    let store = Store::default();
    let mut channel = Channel::new(0, &store).unwrap();
    let (mut queue, mut reclaimer) = return_queue(4);

    let outcome = channel.rebind(store.resolve(0, 0, 1), &mut queue.render_context());

    assert_eq!(outcome, Retire::Deferred);
    assert_eq!(reclaimer.pending(), 1);
    assert_eq!(store.drops.load(Ordering::SeqCst), 0);
    assert_eq!(channel.instrument().map(|i| i.name()), Some("0/0/1"));

    assert_eq!(reclaimer.drain(), 1);
    assert_eq!(store.drops.load(Ordering::SeqCst), 1);
}

#[test]
fn rebind_with_saturated_queue_releases_inline_once() {
    let store = Store::default();
    let mut channel = Channel::new(0, &store).unwrap();
    let (mut queue, mut reclaimer) = return_queue(1);

    // Occupy the only slot
    let filler = Arc::new(TuningTable::equal_temperament("filler", 0, 0));
    assert_eq!(
        queue.render_context().retire_tuning(filler.clone()),
        Retire::Deferred
    );

    let outcome = channel.rebind(store.resolve(0, 0, 2), &mut queue.render_context());

    assert_eq!(outcome, Retire::Inline);
    assert_eq!(queue.saturations(), 1);
    assert_eq!(store.drops.load(Ordering::SeqCst), 1);
    assert_eq!(reclaimer.drain(), 1);
    assert_eq!(store.drops.load(Ordering::SeqCst), 1);
    assert_eq!(Arc::strong_count(&filler), 1);
    assert_eq!(channel.instrument().map(|i| i.name()), Some("0/0/2"));
}

#[test]
fn control_thread_program_change_reaches_render_thread() {
    let store = Store::default();
    let mut channels = Channel::create_all(16, &store).unwrap();
    let (mut queue, mut reclaimer) = return_queue(64);

    let drums = channels[9].selector_handle();
    std::thread::spawn(move || {
        drums.set(None, None, Some(25));
    })
    .join()
    .unwrap();

    let mut rt = queue.render_context();
    for channel in channels.iter_mut().filter(|c| c.needs_sync()) {
        channel.sync_preset(&store, &mut rt);
    }

    assert_eq!(channels[9].selector(), Selector::new(0, 128, 25));
    assert_eq!(channels[9].instrument().map(|i| i.name()), Some("0/128/25"));
    assert_eq!(reclaimer.drain(), 1);
}

#[test]
fn reset_hands_tuning_to_reclaimer() {
    let store = Store::default();
    let mut channel = Channel::new(3, &store).unwrap();
    let (mut queue, mut reclaimer) = return_queue(8);
    let tuning = Arc::new(TuningTable::equal_temperament("et", 0, 0));

    channel.set_tuning(Some(tuning.clone()), &mut queue.render_context());
    assert_eq!(Arc::strong_count(&tuning), 2);

    channel.reset(&store, &mut queue.render_context());
    assert!(channel.tuning().is_none());
    // still held by the queued request
    assert_eq!(Arc::strong_count(&tuning), 2);

    reclaimer.drain();
    assert_eq!(Arc::strong_count(&tuning), 1);
}

#[test]
fn raw_midi_drives_controller_state() {
    let store = Store::default();
    let mut channel = Channel::new(0, &store).unwrap();

    for bytes in [[0xB0, cc::VOLUME_MSB, 77], [0xB0, cc::MODULATION_MSB, 12]] {
        let event = MidiEvent::from_bytes(&bytes).unwrap();
        assert!(channel.handle_event(event));
    }
    channel.reset_controllers(ResetMode::AllControllersOff);

    assert_eq!(channel.controllers().cc(cc::VOLUME_MSB), 77);
    assert_eq!(channel.controllers().cc(cc::MODULATION_MSB), 0);

    channel.reset_controllers(ResetMode::Full);
    assert_eq!(channel.controllers().cc(cc::VOLUME_MSB), 100);
    assert_eq!(channel.controllers().cc(cc::RPN_MSB), 127);
    assert_eq!(channel.controllers().cc(cc::PAN_MSB), 64);
    assert_eq!(channel.controllers().pitch_wheel_sensitivity(), 2);
    assert!(channel.generators().is_clear());
}

#[test]
fn destroy_releases_bound_instrument() {
    let store = Store::default();
    let channel = Channel::new(0, &store).unwrap();
    drop(channel);
    assert_eq!(store.drops.load(Ordering::SeqCst), 1);
}
