//! RF command confirmation
//!
//! Turns the qualifier verdict into a one-shot move command. The carrier has to persist for
//! `validate` long units, then stay absent for `wait_end` continuous long units before the command
//! fires. A cooldown of `ignore` long units follows, so one long press on the remote yields exactly
//! one command.
//!
//! Long units come from a prescaler on the tick: one unit every `prescaler + 1` ticks.

use crate::config::Config;
use crate::countdown::{Countdown, Prescaler};

/// Confirmation states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Confirm {
    /// Waiting for the carrier while at rest
    Idle = 0,
    /// Carrier seen, checking that it persists
    Validating = 1,
    /// Carrier confirmed, waiting for it to cease
    WaitingForEnd = 2,
    /// Command issued, ignoring the line
    Ignoring = 3,
}

impl Confirm {
    /// Decode a raw state value
    #[inline]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Confirm::Idle),
            1 => Some(Confirm::Validating),
            2 => Some(Confirm::WaitingForEnd),
            3 => Some(Confirm::Ignoring),
            _ => None,
        }
    }
}

/// Outcome of one confirmation poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfirmEvent {
    /// No transition
    None,
    /// Carrier seen at rest, validation started
    Validating,
    /// Carrier dropped during validation
    Dropped,
    /// Carrier confirmed. The indicator turns on.
    Confirmed,
    /// Carrier ceased. The indicator turns off and the command fires.
    Command,
    /// Cooldown over
    Ready,
}

/// Confirmation state machine with its long countdown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandConfirm {
    state: Confirm,
    command: bool,
    delay: Countdown,
    prescaler: Prescaler,
    validate: u16,
    wait_end: u16,
    ignore: u16,
}

impl CommandConfirm {
    /// Idle confirmation with no pending command
    pub const fn new(config: &Config) -> Self {
        CommandConfirm {
            state: Confirm::Idle,
            command: false,
            delay: Countdown::new(),
            prescaler: Prescaler::new(config.prescaler),
            validate: config.validate,
            wait_end: config.wait_end,
            ignore: config.ignore,
        }
    }

    /// Current confirmation state
    #[inline]
    pub fn state(&self) -> Confirm {
        self.state
    }

    /// Whether a confirmed command is waiting to be consumed
    #[inline]
    pub fn command(&self) -> bool {
        self.command
    }

    /// Drop the pending command
    #[inline]
    pub fn clear_command(&mut self) {
        self.command = false;
    }

    /// Consume the pending command
    #[inline]
    pub fn take_command(&mut self) -> bool {
        core::mem::replace(&mut self.command, false)
    }

    /// Long units left on the running delay
    #[inline]
    pub fn delay_remaining(&self) -> u16 {
        self.delay.remaining()
    }

    /// Advance the prescaler, decrementing the long countdown when it fires. Called once per tick
    /// from the ISR.
    #[inline]
    pub fn tick(&mut self) {
        if self.prescaler.tick() {
            self.delay.tick();
        }
    }

    /// Restore the state from its raw encoding. Unknown values reset to `Idle` with the delay
    /// cleared.
    pub fn restore_raw(&mut self, raw: u8) {
        match Confirm::from_raw(raw) {
            Some(state) => self.state = state,
            None => {
                debug!("confirm state {=u8} unknown, resetting", raw);
                self.delay.clear();
                self.state = Confirm::Idle;
            }
        }
    }

    /// Run one foreground step with the qualifier verdict and whether the arm is at rest.
    pub fn poll(&mut self, detected: bool, at_rest: bool) -> ConfirmEvent {
        match self.state {
            Confirm::Idle => {
                if detected && at_rest {
                    self.delay.load(self.validate);
                    self.state = Confirm::Validating;
                    ConfirmEvent::Validating
                } else {
                    ConfirmEvent::None
                }
            }
            Confirm::Validating => {
                if !detected {
                    self.state = Confirm::Idle;
                    ConfirmEvent::Dropped
                } else if self.delay.is_expired() {
                    self.delay.load(self.wait_end);
                    self.state = Confirm::WaitingForEnd;
                    debug!("RF carrier confirmed");
                    ConfirmEvent::Confirmed
                } else {
                    ConfirmEvent::None
                }
            }
            Confirm::WaitingForEnd => {
                if detected {
                    // Absence must be continuous
                    self.delay.load(self.wait_end);
                    ConfirmEvent::None
                } else if self.delay.is_expired() {
                    self.command = true;
                    self.delay.load(self.ignore);
                    self.state = Confirm::Ignoring;
                    debug!("RF command issued");
                    ConfirmEvent::Command
                } else {
                    ConfirmEvent::None
                }
            }
            Confirm::Ignoring => {
                if self.delay.is_expired() {
                    self.command = false;
                    self.state = Confirm::Idle;
                    ConfirmEvent::Ready
                } else {
                    ConfirmEvent::None
                }
            }
        }
    }
}
