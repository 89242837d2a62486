//! Per-channel hysteresis tracking.
//!
//! Each analog channel remembers the last value it committed. A new sample
//! only counts as motion once it has moved more than the sensitivity band
//! away from that value, which rejects ADC noise while still catching slow
//! travel: small steps accumulate against the committed value until they
//! cross the band.
//!
//! ```text
//!  |delta| > band                      -> commit, moving
//!  |delta| <= band, last |delta| > band -> commit, stopped (stop edge)
//!  |delta| <= band, last |delta| <= band -> nothing
//! ```
//!
//! The stop edge fires on exactly one tick per motion episode. A channel
//! starts out with a zero previous delta, so a key that rests from power-on
//! never reports a stop.

/// A readable analog input.
///
/// Reads must return immediately and have no side effects; the whole scan
/// loop blocks on them.
pub trait AnalogSource {
    fn read(&mut self) -> u16;
}

impl<F> AnalogSource for F
where
    F: FnMut() -> u16,
{
    #[inline]
    fn read(&mut self) -> u16 {
        self()
    }
}

/// Hysteresis state of one channel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Last committed raw value.
    pub last_value: u16,
    /// Delta seen on the previous tick, committed or not.
    pub last_delta: i32,
    pub moving: bool,
    /// Millisecond timestamp of the previous tick.
    pub last_update: u32,
}

/// What one [`ChannelState::update`] observed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Motion {
    pub raw: u16,
    /// Committed value before this tick.
    pub previous_value: u16,
    pub was_moving: bool,
    pub moving: bool,
    /// Milliseconds since the previous tick.
    pub elapsed: u32,
}

impl Motion {
    /// The one tick where a motion episode ends.
    pub fn is_stop(&self) -> bool {
        self.was_moving && !self.moving
    }
}

impl ChannelState {
    pub const fn new() -> Self {
        Self {
            last_value: 0,
            last_delta: 0,
            moving: false,
            last_update: 0,
        }
    }

    /// Feed one raw sample through the hysteresis band.
    ///
    /// `now` is a free-running millisecond counter; wrap-around is handled.
    pub fn update(&mut self, raw: u16, sensitivity: u16, now: u32) -> Motion {
        let band = i32::from(sensitivity);
        let previous_value = self.last_value;
        let was_moving = self.moving;
        let delta = i32::from(previous_value) - i32::from(raw);

        if delta.abs() > band {
            self.last_value = raw;
            self.moving = true;
        } else if self.last_delta.abs() > band {
            self.last_value = raw;
            self.moving = false;
        }

        let elapsed = now.wrapping_sub(self.last_update);
        self.last_delta = delta;
        self.last_update = now;

        Motion {
            raw,
            previous_value,
            was_moving,
            moving: self.moving,
            elapsed,
        }
    }
}
