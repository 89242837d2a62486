//! The built-in demo keymap: an eight key Hall-effect macro pad.
//!
//! ```text
//!  ch:   0    1    2    3    4      5      6    7
//!  L0:   Q    W    E    R    Shift  Space  Ly1  Ly2
//!  L1:   1    2    3    4    ___    ___    ___  ___
//!  L2:   F1   F2   F3   F4   ___    Enter  ___  ___
//! ```
//!
//! `___` is transparent. The layer keys stay transparent on the layers they
//! open so they keep holding them.

use analog_keymap::{
    AnalogKey, Config, Entry, Filter, Invert, Keycode, Keymap, NoCustom, Sensitivity,
};

/// Number of analog inputs on the pad.
pub const CHANNELS: usize = 8;
/// Number of layers.
pub const NUM_LAYERS: usize = 3;

pub type DemoKeymap = Keymap<NoCustom, NUM_LAYERS, CHANNELS>;

const ___: Entry = Entry::Trans;

/// Layer keys trip early so a light touch is enough to hold a layer.
const LY1: Entry = Entry::Analog(AnalogKey::new(Keycode::Layer1).with_threshold(96));
const LY2: Entry = Entry::Analog(AnalogKey::new(Keycode::Layer2).with_threshold(96));
/// Space bar uses a finer filter and a deeper actuation point.
const SPC: Entry = Entry::Analog(
    AnalogKey::new(Keycode::Space)
        .with_filter(Filter::shift(6))
        .with_threshold(700),
);
const SFT: Entry = Entry::Key(Keycode::LShift);

pub static LAYERS: [&[Entry]; NUM_LAYERS] = [
    // Layer 0: base
    &[
        Entry::Key(Keycode::Q),
        Entry::Key(Keycode::W),
        Entry::Key(Keycode::E),
        Entry::Key(Keycode::R),
        SFT,
        SPC,
        LY1,
        LY2,
    ],
    // Layer 1: numbers
    &[
        Entry::Key(Keycode::N1),
        Entry::Key(Keycode::N2),
        Entry::Key(Keycode::N3),
        Entry::Key(Keycode::N4),
        ___,
        ___,
        ___,
        ___,
    ],
    // Layer 2: function keys
    &[
        Entry::Key(Keycode::F1),
        Entry::Key(Keycode::F2),
        Entry::Key(Keycode::F3),
        Entry::Key(Keycode::F4),
        ___,
        Entry::Key(Keycode::Enter),
        ___,
        ___,
    ],
];

/// Knobs the CLI exposes on top of the static tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub sensitivity: Option<u16>,
    pub invert: bool,
}

/// Demo configuration with the given overrides applied.
pub fn config(options: Options) -> Config<'static> {
    let mut config = Config::new(&LAYERS);
    if let Some(band) = options.sensitivity {
        config = config.with_sensitivity(Sensitivity::Global(band));
    }
    if options.invert {
        config = config.with_invert(Invert::All(true));
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_keymap_resolves_cleanly() {
        let (keymap, report) = DemoKeymap::resolve(&config(Options::default()));
        assert!(report.is_clean());
        for layer in 0..NUM_LAYERS {
            assert!(keymap.is_loaded(layer));
        }
    }

    #[test]
    fn test_layer_keys_are_shared() {
        let (keymap, _) = DemoKeymap::resolve(&config(Options::default()));
        for layer in 1..NUM_LAYERS {
            assert_eq!(keymap.owner(layer, 6), Some(0));
            assert_eq!(keymap.owner(layer, 7), Some(0));
        }
        assert_eq!(keymap.owner(2, 5), Some(2));
        assert_eq!(keymap.owner(1, 5), Some(0));
    }
}
