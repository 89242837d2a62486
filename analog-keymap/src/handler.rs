//! Event handlers.
//!
//! A handler receives the events of one keymap cell. The engine calls
//! exactly one of [`EventHandler::on_change`], [`EventHandler::on_stop`] or
//! [`EventHandler::on_layer_change`] per channel per tick, plus an egress
//! [`EventHandler::on_layer_change`] on the outgoing layer when the layer
//! changes.

use crate::error::HandlerError;
use crate::filter::Filter;
use crate::keycode::Keycode;

/// Threshold a bare keycode is pressed at, in default filter units.
pub const DEFAULT_THRESHOLD: i32 = 127;

/// One filtered sample, handed to a single handler call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickEvent {
    /// Filtered sample.
    pub value: i32,
    /// Filtered committed value minus filtered sample.
    pub delta: i32,
    /// Milliseconds since the channel's previous tick.
    pub elapsed: u32,
}

/// Receiver of key presses and releases.
pub trait KeySink {
    fn set_key_state(&mut self, key: Keycode, pressed: bool);
}

impl<F> KeySink for F
where
    F: FnMut(Keycode, bool),
{
    fn set_key_state(&mut self, key: Keycode, pressed: bool) {
        self(key, pressed)
    }
}

/// The capability set every keymap cell implements.
///
/// All methods default to doing nothing. Handlers run inside the scan loop
/// and must not block or allocate.
pub trait EventHandler {
    /// The channel moved past its sensitivity band.
    fn on_change(
        &mut self,
        _event: TickEvent,
        _keys: &mut dyn KeySink,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// The channel came to rest after moving.
    fn on_stop(&mut self, _event: TickEvent, _keys: &mut dyn KeySink) -> Result<(), HandlerError> {
        Ok(())
    }

    /// The active layer changed. `ingress` is true on the incoming layer and
    /// false on the outgoing one.
    fn on_layer_change(
        &mut self,
        _event: TickEvent,
        _keys: &mut dyn KeySink,
        _ingress: bool,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Filter to use for this cell when the keymap gives none.
    fn preferred_filter(&self) -> Option<Filter> {
        None
    }
}

/// Custom handler type for keymaps that have none.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoCustom {}

impl EventHandler for NoCustom {}

/// A resolved keymap cell.
#[derive(Copy, Clone, Debug)]
pub enum Handler<C = NoCustom> {
    Noop,
    Key(AnalogKey),
    Custom(C),
}

impl<C> Handler<C> {
    pub fn is_noop(&self) -> bool {
        matches!(self, Handler::Noop)
    }

    pub fn as_key(&self) -> Option<&AnalogKey> {
        match self {
            Handler::Key(key) => Some(key),
            _ => None,
        }
    }
}

impl<C: EventHandler> EventHandler for Handler<C> {
    fn on_change(&mut self, event: TickEvent, keys: &mut dyn KeySink) -> Result<(), HandlerError> {
        match self {
            Handler::Noop => Ok(()),
            Handler::Key(key) => key.on_change(event, keys),
            Handler::Custom(custom) => custom.on_change(event, keys),
        }
    }

    fn on_stop(&mut self, event: TickEvent, keys: &mut dyn KeySink) -> Result<(), HandlerError> {
        match self {
            Handler::Noop => Ok(()),
            Handler::Key(key) => key.on_stop(event, keys),
            Handler::Custom(custom) => custom.on_stop(event, keys),
        }
    }

    fn on_layer_change(
        &mut self,
        event: TickEvent,
        keys: &mut dyn KeySink,
        ingress: bool,
    ) -> Result<(), HandlerError> {
        match self {
            Handler::Noop => Ok(()),
            Handler::Key(key) => key.on_layer_change(event, keys, ingress),
            Handler::Custom(custom) => custom.on_layer_change(event, keys, ingress),
        }
    }

    fn preferred_filter(&self) -> Option<Filter> {
        match self {
            Handler::Noop => None,
            Handler::Key(key) => key.preferred_filter(),
            Handler::Custom(custom) => custom.preferred_filter(),
        }
    }
}

/// A key that is pressed while the filtered value is at or above a
/// threshold.
#[derive(Copy, Clone, Debug)]
pub struct AnalogKey {
    key: Keycode,
    threshold: i32,
    pressed: bool,
    filter: Option<Filter>,
}

impl AnalogKey {
    pub const fn new(key: Keycode) -> Self {
        Self {
            key,
            threshold: DEFAULT_THRESHOLD,
            pressed: false,
            filter: None,
        }
    }

    pub const fn with_threshold(self, threshold: i32) -> Self {
        Self { threshold, ..self }
    }

    /// Ask for a specific filter when the keymap doesn't supply one.
    pub const fn with_filter(self, filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..self
        }
    }

    pub fn key(&self) -> Keycode {
        self.key
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn track(&mut self, value: i32, keys: &mut dyn KeySink) {
        if value >= self.threshold && !self.pressed {
            self.pressed = true;
            keys.set_key_state(self.key, true);
        } else if value < self.threshold && self.pressed {
            self.pressed = false;
            keys.set_key_state(self.key, false);
        }
    }
}

impl EventHandler for AnalogKey {
    fn on_change(&mut self, event: TickEvent, keys: &mut dyn KeySink) -> Result<(), HandlerError> {
        self.track(event.value, keys);
        Ok(())
    }

    fn on_layer_change(
        &mut self,
        event: TickEvent,
        keys: &mut dyn KeySink,
        ingress: bool,
    ) -> Result<(), HandlerError> {
        if ingress {
            self.track(event.value, keys);
        } else if self.pressed && !self.key.is_layer() {
            // layer is going away; don't leave the key stuck down.
            // Layer keys stay down, they are what holds the next layer.
            self.pressed = false;
            keys.set_key_state(self.key, false);
        }
        Ok(())
    }

    fn preferred_filter(&self) -> Option<Filter> {
        self.filter
    }
}

/// Signature of an [`FnHandler`] callback.
pub type Callback = fn(TickEvent, &mut dyn KeySink) -> Result<(), HandlerError>;

/// Handler assembled from plain functions, for one-off behaviour that
/// doesn't warrant its own type.
#[derive(Copy, Clone, Debug)]
pub struct FnHandler {
    on_change: Callback,
    on_stop: Callback,
}

impl FnHandler {
    pub const fn new(on_change: Callback, on_stop: Callback) -> Self {
        Self { on_change, on_stop }
    }
}

impl EventHandler for FnHandler {
    fn on_change(&mut self, event: TickEvent, keys: &mut dyn KeySink) -> Result<(), HandlerError> {
        (self.on_change)(event, keys)
    }

    fn on_stop(&mut self, event: TickEvent, keys: &mut dyn KeySink) -> Result<(), HandlerError> {
        (self.on_stop)(event, keys)
    }
}
