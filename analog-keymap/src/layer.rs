//! Momentary layer tracking.
//!
//! [`LayerState`] sits between the handlers and the real key sink. Layer
//! keys ([`Keycode::Layer1`] and up) are swallowed and recorded; every other
//! key passes through. Holding a layer key activates that layer, and the
//! highest held layer wins.
//!
//! A layer key must be [`Entry::Trans`](crate::Entry::Trans) on the layers
//! it activates. [`AnalogKey`](crate::AnalogKey) does not release layer keys
//! on egress, so the release only ever comes from the key's own handler
//! seeing the key come back up. That handler has to be reachable from the
//! layer it opened.

use crate::handler::KeySink;
use crate::keycode::Keycode;

/// Key sink decorator tracking held momentary layer keys.
#[derive(Debug, Default)]
pub struct LayerState<K> {
    inner: K,
    /// Bit `n` set while the layer `n` key is held.
    held: u16,
}

impl<K> LayerState<K> {
    pub const fn new(inner: K) -> Self {
        Self { inner, held: 0 }
    }

    /// Highest held layer, or 0.
    pub fn active_layer(&self) -> usize {
        match self.held {
            0 => 0,
            held => (u16::BITS - 1 - held.leading_zeros()) as usize,
        }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut K {
        &mut self.inner
    }

    pub fn into_inner(self) -> K {
        self.inner
    }
}

impl<K: KeySink> KeySink for LayerState<K> {
    fn set_key_state(&mut self, key: Keycode, pressed: bool) {
        if !key.is_layer() {
            self.inner.set_key_state(key, pressed);
            return;
        }
        let bit = 1 << key.layer_number();
        if pressed {
            self.held |= bit;
        } else {
            self.held &= !bit;
        }
    }
}
