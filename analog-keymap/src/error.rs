//! Error types.
//!
//! None of these are fatal to the scan loop. Boot errors exclude one keymap
//! layer, handler errors are logged and counted by the engine.

use thiserror::Error;

/// Why a keymap layer was left out of the resolved tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("row has {found} entries, expected {expected} channels")]
    WidthMismatch { expected: usize, found: usize },

    #[error("transparent entry at channel {channel} has no concrete entry below it")]
    UnresolvedTransparent { channel: usize },

    #[error("filter row has {found} entries, expected {expected}")]
    FilterShape { expected: usize, found: usize },

    #[error("sensitivity row has {found} entries, expected {expected}")]
    SensitivityShape { expected: usize, found: usize },

    #[error("invert row has {found} entries, expected {expected}")]
    InvertShape { expected: usize, found: usize },

    #[error("no {table} row for this layer")]
    MissingRow { table: &'static str },

    #[error("keymap holds more layers than the {capacity} it was built for")]
    TooManyLayers { capacity: usize },
}

/// A rejected keymap layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("layer {layer}: {reason}")]
pub struct RowError {
    pub layer: usize,
    pub reason: RejectReason,
}

/// Boot problems that are not tied to a single layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootIssue {
    #[error("channel order has {found} entries, expected {expected}")]
    ChannelOrderLength { expected: usize, found: usize },

    #[error("channel order is not a permutation (index {index} out of range or repeated)")]
    ChannelOrderInvalid { index: usize },
}

/// Failure reported by an event handler callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("handler rejected the event: {0}")]
    Rejected(&'static str),
}
