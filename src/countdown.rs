//! Tick-driven countdowns
//!
//! Countdowns are loaded from the foreground loop and decremented from the timer ISR. They stop
//! at zero and never wrap.

/// Countdown decremented once per tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Countdown(u16);

impl Countdown {
    /// Expired countdown
    #[inline]
    pub const fn new() -> Self {
        Countdown(0)
    }

    /// Restart the countdown from `count`
    #[inline]
    pub fn load(&mut self, count: u16) {
        self.0 = count;
    }

    /// Expire the countdown immediately
    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Advance by one unit
    #[inline]
    pub fn tick(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    /// Whether the countdown has reached zero
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.0 == 0
    }

    /// Units left before expiry
    #[inline]
    pub fn remaining(&self) -> u16 {
        self.0
    }
}

/// Divides the tick rate down for long delays.
///
/// Fires once every `reload + 1` ticks: it counts `reload` down to zero, then fires on the tick
/// that finds it at zero and reloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Prescaler {
    reload: u16,
    count: u16,
}

impl Prescaler {
    /// Prescaler that fires every `reload + 1` ticks
    #[inline]
    pub const fn new(reload: u16) -> Self {
        Prescaler {
            reload,
            count: reload,
        }
    }

    /// Advance by one tick. Returns `true` on the ticks where the prescaled clock fires.
    #[inline]
    pub fn tick(&mut self) -> bool {
        if self.count > 0 {
            self.count -= 1;
            false
        } else {
            self.count = self.reload;
            true
        }
    }
}
