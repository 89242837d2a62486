//! The per-tick dispatch engine.
//!
//! [`Engine::tick`] runs once per scan. For every channel it reads one
//! sample, steps the channel's hysteresis state and calls into the handlers
//! of the active layer:
//!
//! 1. On a layer change, the outgoing layer's handler gets
//!    `on_layer_change(ingress = false)` with a value filtered the way that
//!    layer filters it.
//! 2. The active layer's handler gets `on_change` while the channel moves,
//!    `on_stop` on the tick it settles, and `on_layer_change(ingress = true)`
//!    on a layer change without motion.
//!
//! Handler failures are logged and counted; they never cut a tick short.

use core::fmt;

use crate::channel::{AnalogSource, ChannelState, Motion};
use crate::filter::Filter;
use crate::handler::{EventHandler, KeySink, TickEvent};
use crate::keymap::{Keymap, DEFAULT_SENSITIVITY};

/// What a single tick did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Handler calls made.
    pub dispatched: usize,
    /// Handler calls that returned an error.
    pub faults: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Hook {
    Change,
    Stop,
    Ingress,
    Egress,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Hook::Change => "on_change",
            Hook::Stop => "on_stop",
            Hook::Ingress => "on_layer_change(ingress)",
            Hook::Egress => "on_layer_change(egress)",
        })
    }
}

/// Scans a fixed set of analog channels against a resolved [`Keymap`].
pub struct Engine<S, C, const LAYERS: usize, const CHANNELS: usize> {
    sources: [S; CHANNELS],
    states: [ChannelState; CHANNELS],
    keymap: Keymap<C, LAYERS, CHANNELS>,
    previous_layer: usize,
    faults: u32,
}

impl<S, C, const LAYERS: usize, const CHANNELS: usize> Engine<S, C, LAYERS, CHANNELS>
where
    S: AnalogSource,
    C: EventHandler,
{
    /// `sources` are in physical order; the keymap's channel order maps
    /// them onto logical channels. `now` is the boot time on the same clock
    /// later passed to [`Engine::tick`].
    pub fn new(sources: [S; CHANNELS], keymap: Keymap<C, LAYERS, CHANNELS>, now: u32) -> Self {
        let mut state = ChannelState::new();
        state.last_update = now;
        Self {
            sources,
            states: [state; CHANNELS],
            keymap,
            previous_layer: 0,
            faults: 0,
        }
    }

    /// Scan every channel once.
    ///
    /// `layer` is the keyboard's active layer for this tick and `now` a
    /// free-running millisecond counter.
    pub fn tick(&mut self, layer: usize, now: u32, keys: &mut dyn KeySink) -> TickSummary {
        let previous = self.previous_layer;
        let layer_changed = layer != previous;
        let mut summary = TickSummary::default();

        if layer_changed {
            debug!("layer {} -> {}", previous, layer);
        }

        for channel in 0..CHANNELS {
            let raw = self.sources[self.keymap.physical(channel)].read();
            let sensitivity = self
                .keymap
                .sensitivity(layer, channel)
                .unwrap_or(DEFAULT_SENSITIVITY);
            let motion = self.states[channel].update(raw, sensitivity, now);

            if layer_changed {
                if let Some(filter) = self.keymap.filter(previous, channel) {
                    let event = tick_event(&filter, &motion);
                    self.dispatch(previous, channel, Hook::Egress, event, keys, &mut summary);
                }
            }

            if motion.moving || motion.was_moving || layer_changed {
                if let Some(filter) = self.keymap.filter(layer, channel) {
                    let callback = if motion.moving {
                        Hook::Change
                    } else if motion.was_moving {
                        Hook::Stop
                    } else {
                        Hook::Ingress
                    };
                    let event = tick_event(&filter, &motion);
                    self.dispatch(layer, channel, callback, event, keys, &mut summary);
                }
            }
        }

        self.previous_layer = layer;
        summary
    }

    fn dispatch(
        &mut self,
        layer: usize,
        channel: usize,
        callback: Hook,
        event: TickEvent,
        keys: &mut dyn KeySink,
        summary: &mut TickSummary,
    ) {
        let Some(handler) = self.keymap.handler_mut(layer, channel) else {
            return;
        };
        let result = match callback {
            Hook::Change => handler.on_change(event, keys),
            Hook::Stop => handler.on_stop(event, keys),
            Hook::Ingress => handler.on_layer_change(event, keys, true),
            Hook::Egress => handler.on_layer_change(event, keys, false),
        };
        summary.dispatched += 1;
        if let Err(err) = result {
            summary.faults += 1;
            self.faults = self.faults.wrapping_add(1);
            warn!("channel {} layer {} {} failed: {}", channel, layer, callback, err);
        }
    }
}

impl<S, C, const LAYERS: usize, const CHANNELS: usize> Engine<S, C, LAYERS, CHANNELS> {
    pub fn channel(&self, channel: usize) -> &ChannelState {
        &self.states[channel]
    }

    pub fn keymap(&self) -> &Keymap<C, LAYERS, CHANNELS> {
        &self.keymap
    }

    /// Layer seen by the last tick.
    pub fn previous_layer(&self) -> usize {
        self.previous_layer
    }

    /// Handler failures since boot. Wraps.
    pub fn fault_count(&self) -> u32 {
        self.faults
    }
}

fn tick_event(filter: &Filter, motion: &Motion) -> TickEvent {
    let value = filter.apply(motion.raw);
    TickEvent {
        value,
        delta: filter.apply(motion.previous_value) - value,
        elapsed: motion.elapsed,
    }
}
