//! Positioning state machine
//!
//! Moves the duty cycle between the two configured endpoints. Each trigger received at rest picks
//! the endpoint the arm is not currently occupying; the duty cycle then ramps toward it one unit
//! at a time, waiting `speed` ticks between units. Triggers received while moving are absorbed by
//! the motion in progress.

use crate::config::Config;
use crate::countdown::Countdown;

/// Positioning states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Motion {
    /// Holding position, waiting for a trigger
    AtRest,
    /// About to step the duty cycle up
    MovingUp,
    /// About to step the duty cycle down
    MovingDown,
    /// Waiting for the step delay before moving up again
    WaitingUp,
    /// Waiting for the step delay before moving down again
    WaitingDown,
}

/// Outcome of one foreground step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Nothing changed
    Idle,
    /// A trigger started a motion toward `target`. The trigger is consumed.
    Started {
        /// Endpoint being approached
        target: u16,
    },
    /// The duty cycle moved one unit and the step delay was armed
    Stepped(u16),
    /// The step delay expired; the next step is taken on the following poll
    Resumed,
    /// The target was reached. Any pending trigger is consumed.
    Arrived(u16),
}

/// Pick the endpoint to move to from `current`.
///
/// Resolves to whichever endpoint the arm is not currently occupying, heading for `start` first
/// when below it.
pub fn select_target(current: u16, start: u16, end: u16) -> u16 {
    if current == start {
        end
    } else if current < start {
        start
    } else if current == end {
        start
    } else if current > end {
        end
    } else {
        // current in (start, end); only reachable when end > start
        end
    }
}

/// Duty cycle plus the positioning state that drives it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Positioner {
    motion: Motion,
    current: u16,
    target: u16,
    delay: Countdown,
    start: u16,
    end: u16,
    max_step: u16,
    speed: u16,
}

impl Positioner {
    /// Positioner at rest on `config.initial_duty`
    pub const fn new(config: &Config) -> Self {
        Positioner {
            motion: Motion::AtRest,
            current: config.initial_duty,
            target: config.initial_duty,
            delay: Countdown::new(),
            start: config.start,
            end: config.end,
            max_step: config.max_step,
            speed: config.speed,
        }
    }

    /// Current positioning state
    #[inline]
    pub fn motion(&self) -> Motion {
        self.motion
    }

    /// Whether the arm is holding position
    #[inline]
    pub fn is_at_rest(&self) -> bool {
        self.motion == Motion::AtRest
    }

    /// Live duty cycle read by the PWM generator
    #[inline]
    pub fn duty(&self) -> u16 {
        self.current
    }

    /// Duty cycle being approached
    #[inline]
    pub fn target(&self) -> u16 {
        self.target
    }

    /// Ticks left before the next step
    #[inline]
    pub fn delay_remaining(&self) -> u16 {
        self.delay.remaining()
    }

    /// Decrement the step delay. Called once per tick from the ISR.
    #[inline]
    pub fn tick(&mut self) {
        self.delay.tick();
    }

    /// Run one foreground step. `trigger` only matters at rest.
    pub fn step(&mut self, trigger: bool) -> Step {
        match self.motion {
            Motion::AtRest => {
                if !trigger {
                    return Step::Idle;
                }
                // An endpoint beyond the PWM period could never be reached
                self.target = select_target(self.current, self.start, self.end).min(self.max_step);
                self.motion = if self.target > self.current {
                    Motion::MovingUp
                } else {
                    Motion::MovingDown
                };
                debug!("move {=u16} -> {=u16}", self.current, self.target);
                Step::Started {
                    target: self.target,
                }
            }
            Motion::MovingUp => {
                if self.current == self.target {
                    return self.arrive();
                }
                self.current = self.current.saturating_add(1).min(self.max_step);
                self.delay.load(self.speed);
                self.motion = Motion::WaitingUp;
                Step::Stepped(self.current)
            }
            Motion::MovingDown => {
                if self.current == self.target {
                    return self.arrive();
                }
                self.current = self.current.saturating_sub(1);
                self.delay.load(self.speed);
                self.motion = Motion::WaitingDown;
                Step::Stepped(self.current)
            }
            Motion::WaitingUp => self.resume(Motion::MovingUp),
            Motion::WaitingDown => self.resume(Motion::MovingDown),
        }
    }

    fn arrive(&mut self) -> Step {
        self.motion = Motion::AtRest;
        debug!("arrived at {=u16}", self.current);
        Step::Arrived(self.current)
    }

    fn resume(&mut self, moving: Motion) -> Step {
        if self.delay.is_expired() {
            self.motion = moving;
            Step::Resumed
        } else {
            Step::Idle
        }
    }
}
