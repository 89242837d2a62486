//! Replaying traces through the engine.

use std::cell::Cell;

use analog_keymap::{Engine, KeySink, Keycode, LayerState};
use indicatif::ProgressBar;
use tracing::debug;

use crate::keymap::{DemoKeymap, CHANNELS};
use crate::trace::Tick;

/// A key press or release seen during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub now: u32,
    pub key: Keycode,
    pub pressed: bool,
}

/// Result of a replay.
#[derive(Debug, Default)]
pub struct Outcome {
    pub transitions: Vec<Transition>,
    pub ticks: usize,
    pub dispatched: usize,
    pub faults: u32,
}

/// Key sink that timestamps everything it receives.
#[derive(Debug, Default)]
struct Recorder {
    now: u32,
    transitions: Vec<Transition>,
}

impl KeySink for Recorder {
    fn set_key_state(&mut self, key: Keycode, pressed: bool) {
        self.transitions.push(Transition {
            now: self.now,
            key,
            pressed,
        });
    }
}

/// Run every tick of `trace` through `keymap`.
///
/// The active layer for a tick is whatever layer keys were held after the
/// previous one, as on the keyboard.
pub fn replay(keymap: DemoKeymap, trace: &[Tick<CHANNELS>], progress: &ProgressBar) -> Outcome {
    let inputs: [Cell<u16>; CHANNELS] = Default::default();
    let sources: [_; CHANNELS] = std::array::from_fn(|i| {
        let input = &inputs[i];
        move || input.get()
    });
    let boot = trace.first().map_or(0, |tick| tick.now);
    let mut engine = Engine::new(sources, keymap, boot);
    let mut keys = LayerState::new(Recorder::default());
    let mut outcome = Outcome::default();

    for tick in trace {
        for (input, &raw) in inputs.iter().zip(&tick.raw) {
            input.set(raw);
        }
        keys.inner_mut().now = tick.now;

        let layer = keys.active_layer();
        let summary = engine.tick(layer, tick.now, &mut keys);
        if summary.dispatched > 0 {
            debug!(
                "t={} layer={} dispatched={} faults={}",
                tick.now, layer, summary.dispatched, summary.faults
            );
        }

        outcome.ticks += 1;
        outcome.dispatched += summary.dispatched;
        progress.inc(1);
    }

    outcome.faults = engine.fault_count();
    outcome.transitions = keys.into_inner().transitions;
    outcome
}
