//! Shared servo context
//!
//! [`Controller`] owns every state machine and is the only thing the interrupt handlers and the
//! foreground loop touch. It has three entry points:
//!
//! - [`Controller::on_tick`] from the periodic timer ISR,
//! - [`Controller::on_rising_edge`] from the GPIO ISR of the RF line,
//! - [`Controller::poll`] from the foreground loop.
//!
//! None of them block, and all of them are plain functions over the state, so the controller can
//! be driven on the host without hardware.

use crate::config::{Config, ConfigError};
use crate::confirm::{CommandConfirm, Confirm, ConfirmEvent};
use crate::envelope::{Envelope, EnvelopeEvent, RfEnvelope};
use crate::positioner::{Motion, Positioner, Step};
use crate::pwm::SoftPwm;
use bitflags::bitflags;

bitflags! {
    /// Side effects of one tick
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TickEvents: u8 {
        /// Enable rising-edge notifications on the RF line again
        const REARM_EDGE = 1 << 0;
        /// The qualifier sampled a HIGH or LOW run this tick
        const SAMPLING = 1 << 1;
        /// The qualifier accepted the carrier
        const QUALIFIED = 1 << 2;
        /// The qualifier rejected the signal
        const REJECTED = 1 << 3;
    }
}

bitflags! {
    /// Side effects of one foreground poll
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PollEvents: u8 {
        /// Turn the confirmation indicator on
        const INDICATOR_ON = 1 << 0;
        /// Turn the confirmation indicator off
        const INDICATOR_OFF = 1 << 1;
        /// An RF command was issued
        const COMMAND = 1 << 2;
        /// A motion started
        const MOVE_STARTED = 1 << 3;
        /// The duty cycle moved one unit
        const STEPPED = 1 << 4;
        /// A motion ended on its target
        const MOVE_DONE = 1 << 5;
    }
}

/// Result of one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutput {
    /// Level to drive on the PWM pin
    pub level: bool,
    /// Side effects for the interrupt glue
    pub events: TickEvents,
}

/// Copy of the controller state for inspection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    /// Positioning state
    pub motion: Motion,
    /// Live duty cycle
    pub duty: u16,
    /// Duty cycle being approached
    pub target: u16,
    /// Position within the PWM period
    pub pwm_counter: u16,
    /// Qualifier state
    pub envelope: Envelope,
    /// Qualifier verdict
    pub detected: bool,
    /// Whether rising edges start a detection
    pub edge_armed: bool,
    /// Confirmation state
    pub confirm: Confirm,
    /// Pending RF command
    pub command: bool,
}

/// Complete servo state shared by the ISRs and the foreground loop
#[derive(Clone, Copy, Debug)]
pub struct Controller {
    config: Config,
    pwm: SoftPwm,
    positioner: Positioner,
    envelope: RfEnvelope,
    confirm: CommandConfirm,
}

impl Controller {
    /// Build a controller after validating `config`
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new_unchecked(config))
    }

    /// Build a controller without validating `config`, for use in `static` initializers.
    ///
    /// Invalid constants do not panic, here or in [`Config`]'s derived timings. Endpoints beyond
    /// `max_step` are capped when a motion starts, so every motion still ends. Other invalid
    /// values produce a servo that does not behave usefully.
    pub const fn new_unchecked(config: Config) -> Self {
        Controller {
            pwm: SoftPwm::new(config.max_step),
            positioner: Positioner::new(&config),
            envelope: RfEnvelope::new(&config),
            confirm: CommandConfirm::new(&config),
            config,
        }
    }

    /// Configuration the controller was built with
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Live duty cycle
    #[inline]
    pub fn duty(&self) -> u16 {
        self.positioner.duty()
    }

    /// Whether the arm is holding position
    #[inline]
    pub fn is_at_rest(&self) -> bool {
        self.positioner.is_at_rest()
    }

    /// Whether the next tick consumes the RF line level. The line only needs reading while a
    /// detection is in progress and the arm is at rest.
    #[inline]
    pub fn samples_rf(&self) -> bool {
        self.positioner.is_at_rest() && self.envelope.is_sampling()
    }

    /// Positioning state machine
    #[inline]
    pub fn positioner(&self) -> &Positioner {
        &self.positioner
    }

    /// RF envelope qualifier
    #[inline]
    pub fn envelope(&self) -> &RfEnvelope {
        &self.envelope
    }

    /// Command confirmation state machine
    #[inline]
    pub fn confirm(&self) -> &CommandConfirm {
        &self.confirm
    }

    /// Mutable access to the confirmation state machine, e.g. to restore a raw state
    #[inline]
    pub fn confirm_mut(&mut self) -> &mut CommandConfirm {
        &mut self.confirm
    }

    /// Timer ISR body. `rf_level` is the RF line level, only consulted when
    /// [`samples_rf`](Self::samples_rf) is `true`.
    ///
    /// Advances the qualifier (at rest only), decrements every countdown and computes the PWM
    /// level for this tick.
    pub fn on_tick(&mut self, rf_level: bool) -> TickOutput {
        let mut events = TickEvents::empty();

        if self.positioner.is_at_rest() {
            if matches!(
                self.envelope.state(),
                Envelope::DetectHigh | Envelope::DetectLow
            ) {
                events |= TickEvents::SAMPLING;
            }
            match self.envelope.step(rf_level) {
                EnvelopeEvent::Qualified => events |= TickEvents::QUALIFIED,
                EnvelopeEvent::Rejected => events |= TickEvents::REJECTED,
                EnvelopeEvent::Rearmed => events |= TickEvents::REARM_EDGE,
                EnvelopeEvent::None | EnvelopeEvent::HighAccepted => {}
            }
        }

        self.positioner.tick();
        self.confirm.tick();

        let level = self.pwm.tick(self.positioner.duty());
        TickOutput { level, events }
    }

    /// RF line GPIO ISR body. `rf_level` is the line read back inside the handler.
    ///
    /// Returns `true` if a detection started and edge notifications must be disabled until a
    /// tick reports [`TickEvents::REARM_EDGE`].
    #[inline]
    pub fn on_rising_edge(&mut self, rf_level: bool) -> bool {
        self.envelope.on_rising_edge(rf_level)
    }

    /// Foreground loop body. `button_pressed` is one debounced press of the manual trigger.
    pub fn poll(&mut self, button_pressed: bool) -> PollEvents {
        let mut events = PollEvents::empty();

        let at_rest = self.positioner.is_at_rest();
        match self.confirm.poll(self.envelope.detected(), at_rest) {
            ConfirmEvent::Confirmed => events |= PollEvents::INDICATOR_ON,
            ConfirmEvent::Command => events |= PollEvents::INDICATOR_OFF | PollEvents::COMMAND,
            ConfirmEvent::None
            | ConfirmEvent::Validating
            | ConfirmEvent::Dropped
            | ConfirmEvent::Ready => {}
        }

        let trigger = button_pressed || self.confirm.command();
        match self.positioner.step(trigger) {
            Step::Started { .. } => {
                self.confirm.clear_command();
                events |= PollEvents::MOVE_STARTED;
            }
            Step::Arrived(_) => {
                self.confirm.clear_command();
                events |= PollEvents::MOVE_DONE;
            }
            Step::Stepped(_) => events |= PollEvents::STEPPED,
            Step::Idle | Step::Resumed => {}
        }

        events
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            motion: self.positioner.motion(),
            duty: self.positioner.duty(),
            target: self.positioner.target(),
            pwm_counter: self.pwm.counter(),
            envelope: self.envelope.state(),
            detected: self.envelope.detected(),
            edge_armed: self.envelope.is_armed(),
            confirm: self.confirm.state(),
            command: self.confirm.command(),
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new_unchecked(Config::RANGE_FINDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Controller {
        let config = Config::RANGE_FINDER
            .positions(20, 20, 10)
            .speed(2)
            .carrier(6, 5, 1)
            .confirmation(2, 2, 4)
            .prescaler(0)
            .max_step(50);
        Controller::new(config).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = Config::RANGE_FINDER.speed(0);
        assert_eq!(Controller::new(config).err(), Some(ConfigError::ZeroSpeed));
    }

    #[test]
    fn degenerate_unchecked_config_keeps_running() {
        let config = Config::RANGE_FINDER
            .tick(0, 0)
            .max_step(0)
            .positions(7, 5, u16::MAX)
            .speed(0)
            .carrier(0, 0, 9)
            .prescaler(0);
        let mut c = Controller::new_unchecked(config);
        assert_eq!(c.config().tick_period_ns(), 0);
        c.on_rising_edge(true);
        c.poll(true);
        for i in 0..100 {
            c.on_tick(i % 3 == 0);
            c.poll(false);
        }
        assert!(c.is_at_rest());
        assert_eq!(c.duty(), 0);
    }

    #[test]
    fn initial_snapshot() {
        let c = Controller::default();
        let s = c.snapshot();
        assert_eq!(s.motion, Motion::AtRest);
        assert_eq!(s.duty, 161);
        assert_eq!(s.envelope, Envelope::Idle);
        assert_eq!(s.confirm, Confirm::Idle);
        assert!(s.edge_armed);
        assert!(!s.detected && !s.command);
    }

    #[test]
    fn button_moves_the_arm() {
        let mut c = fast();
        assert_eq!(c.poll(true), PollEvents::MOVE_STARTED);
        assert_eq!(c.poll(false), PollEvents::STEPPED);
        assert_eq!(c.duty(), 19);
        assert!(!c.is_at_rest());
    }

    #[test]
    fn qualifier_pauses_while_moving() {
        let mut c = fast();
        assert!(c.on_rising_edge(true));
        c.poll(true);
        assert!(!c.samples_rf());
        for _ in 0..20 {
            c.on_tick(false);
        }
        assert_eq!(c.envelope().state(), Envelope::DetectHigh);
        assert_eq!(c.envelope().counter(), 0);
    }

    #[test]
    fn tick_reports_sampling_and_verdict() {
        let mut c = fast();
        c.on_rising_edge(true);
        assert!(c.samples_rf());
        let out = c.on_tick(true);
        assert!(out.events.contains(TickEvents::SAMPLING));
        let out = c.on_tick(false);
        assert!(out.events.contains(TickEvents::REJECTED));
        let out = c.on_tick(true);
        assert_eq!(out.events, TickEvents::REARM_EDGE);
        assert!(!c.samples_rf());
    }

    #[test]
    fn countdowns_run_while_moving() {
        let mut c = fast();
        c.poll(true);
        c.poll(false);
        assert_eq!(c.positioner().delay_remaining(), 2);
        c.on_tick(false);
        c.on_tick(false);
        assert_eq!(c.positioner().delay_remaining(), 0);
    }

    #[test]
    fn pwm_follows_live_duty() {
        let mut c = fast();
        let high = (0..50).filter(|_| c.on_tick(false).level).count();
        assert_eq!(high, 20);
    }
}
