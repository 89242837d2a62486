//! Analog key engine.
//!
//! Turns continuous samples from analog key switches (Hall-effect,
//! potentiometric, ...) into key presses and releases:
//!
//! ```text
//!  AnalogSource ──► ChannelState ──► Filter ──► Handler ──► KeySink
//!   (raw u16)      (hysteresis)    (quantize)  ([layer][channel])
//! ```
//!
//! A [`Config`] of `[layer][channel]` tables is resolved once at boot into
//! a [`Keymap`]; the [`Engine`] then scans every channel on each tick.
//!
//! This crate is `no_std` and allocation free so it can run inside a
//! firmware scan loop as well as in the native tooling.

#![no_std]

#[macro_use]
mod log;

pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod handler;
pub mod keycode;
pub mod keymap;
pub mod layer;

pub use channel::{AnalogSource, ChannelState, Motion};
pub use config::{Config, Entry, Invert, InvertRow, Sensitivity};
pub use engine::{Engine, TickSummary};
pub use error::{BootIssue, HandlerError, RejectReason, RowError};
pub use filter::{invert_row, Filter, DEFAULT_SHIFT, MAX_RAW};
pub use handler::{
    AnalogKey, Callback, EventHandler, FnHandler, Handler, KeySink, NoCustom, TickEvent,
    DEFAULT_THRESHOLD,
};
pub use keycode::Keycode;
pub use keymap::{BootReport, Keymap, DEFAULT_SENSITIVITY, MAX_REPORTED};
pub use layer::LayerState;
