//! Boot-time keymap configuration.
//!
//! Everything here borrows `&'static` (or otherwise long-lived) tables and
//! is read once by [`Keymap::resolve`](crate::Keymap::resolve).

use crate::filter::Filter;
use crate::handler::{AnalogKey, NoCustom};
use crate::keycode::Keycode;

/// One cell of a keymap row, before resolution.
#[derive(Copy, Clone, Debug)]
pub enum Entry<C = NoCustom> {
    /// Does nothing.
    NoOp,
    /// Inherit the handler of the nearest lower layer.
    Trans,
    /// Bare keycode, wrapped in an [`AnalogKey`] with the default threshold.
    Key(Keycode),
    /// Fully specified analog key.
    Analog(AnalogKey),
    /// Caller supplied handler.
    Custom(C),
}

impl<C> Entry<C> {
    pub fn is_transparent(&self) -> bool {
        matches!(self, Entry::Trans)
    }
}

/// Hysteresis band per cell.
#[derive(Copy, Clone, Debug, Default)]
pub enum Sensitivity<'a> {
    /// [`DEFAULT_SENSITIVITY`](crate::DEFAULT_SENSITIVITY) everywhere.
    #[default]
    Default,
    /// One band for every cell.
    Global(u16),
    /// `[layer][channel]` table.
    PerKey(&'a [&'a [u16]]),
}

/// Inversion of one layer's filters.
#[derive(Copy, Clone, Debug)]
pub enum InvertRow<'a> {
    All(bool),
    Each(&'a [bool]),
}

/// Inversion of the whole keymap.
#[derive(Copy, Clone, Debug, Default)]
pub enum Invert<'a> {
    #[default]
    None,
    All(bool),
    PerLayer(&'a [InvertRow<'a>]),
}

/// Keymap configuration consumed at boot.
#[derive(Copy, Clone, Debug)]
pub struct Config<'a, C = NoCustom> {
    /// `[layer][channel]` entries.
    pub event_map: &'a [&'a [Entry<C>]],
    /// `[layer][channel]` filters. Derived from the handlers when absent.
    pub filter_map: Option<&'a [&'a [Filter]]>,
    pub sensitivity: Sensitivity<'a>,
    pub invert: Invert<'a>,
    /// `channel_order[i]` is the physical input read as logical channel `i`.
    pub channel_order: Option<&'a [usize]>,
}

impl<'a, C> Config<'a, C> {
    pub const fn new(event_map: &'a [&'a [Entry<C>]]) -> Self {
        Self {
            event_map,
            filter_map: None,
            sensitivity: Sensitivity::Default,
            invert: Invert::None,
            channel_order: None,
        }
    }

    pub fn with_filters(mut self, filter_map: &'a [&'a [Filter]]) -> Self {
        self.filter_map = Some(filter_map);
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity<'a>) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_invert(mut self, invert: Invert<'a>) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_channel_order(mut self, order: &'a [usize]) -> Self {
        self.channel_order = Some(order);
        self
    }
}
