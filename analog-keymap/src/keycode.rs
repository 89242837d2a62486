//! Key identifiers.
//!
//! A keymap row carries bare keycodes; they are wrapped into an
//! [`AnalogKey`](crate::AnalogKey) when the keymap is resolved. Values are
//! HID usages from the keyboard page (0x07). The momentary layer keys sit
//! above the HID range and never reach the host: [`LayerState`](crate::LayerState)
//! consumes them.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Keycode {
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,

    N1 = 0x1E,
    N2 = 0x1F,
    N3 = 0x20,
    N4 = 0x21,
    N5 = 0x22,
    N6 = 0x23,
    N7 = 0x24,
    N8 = 0x25,
    N9 = 0x26,
    N0 = 0x27,

    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,

    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,

    /// Hold layer `n`, encoded as `0xF0 + n`.
    Layer1 = 0xF1,
    Layer2 = 0xF2,
    Layer3 = 0xF3,
}

impl Keycode {
    pub fn is_layer(self) -> bool {
        self as u8 >= 0xF0
    }

    /// Layer a layer key holds. Only meaningful when [`Keycode::is_layer`].
    pub fn layer_number(self) -> usize {
        usize::from((self as u8).saturating_sub(0xF0))
    }
}
