//! RF envelope qualifier
//!
//! Classifies the output of the RF receiver by run-length counting. A rising edge on the line
//! starts a detection: the line must then stay HIGH for `count_high` ticks followed by LOW for
//! `count_low` ticks, give or take `tolerance` ticks on a run that ends early. The asymmetric
//! thresholds single out one carrier frequency without measuring it.
//!
//! Edge notifications are disarmed while a detection runs and re-armed once the line is seen HIGH
//! again after the verdict.

use crate::config::Config;

/// Qualifier states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Envelope {
    /// Waiting for a rising edge
    Idle,
    /// Counting the HIGH run
    DetectHigh,
    /// Counting the LOW run
    DetectLow,
    /// Verdict given, waiting for the line to go HIGH before re-arming
    DetectEnd,
}

/// Outcome of one qualifier step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnvelopeEvent {
    /// No transition
    None,
    /// The HIGH run was accepted, now counting the LOW run
    HighAccepted,
    /// Both runs matched the carrier
    Qualified,
    /// The signal did not match the carrier
    Rejected,
    /// Edge notifications must be enabled again
    Rearmed,
}

/// Run-length detector for the RF carrier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RfEnvelope {
    state: Envelope,
    counter: u16,
    detected: bool,
    armed: bool,
    count_high: u16,
    count_low: u16,
    tolerance: u16,
}

impl RfEnvelope {
    /// Idle qualifier with edge notifications armed
    pub const fn new(config: &Config) -> Self {
        RfEnvelope {
            state: Envelope::Idle,
            counter: 0,
            detected: false,
            armed: true,
            count_high: config.count_high,
            count_low: config.count_low,
            tolerance: config.tolerance,
        }
    }

    /// Current qualifier state
    #[inline]
    pub fn state(&self) -> Envelope {
        self.state
    }

    /// Verdict of the last completed detection
    #[inline]
    pub fn detected(&self) -> bool {
        self.detected
    }

    /// Whether rising edges currently start a detection
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether `step` needs the line level
    #[inline]
    pub fn is_sampling(&self) -> bool {
        self.state != Envelope::Idle
    }

    /// Length of the run being counted
    #[inline]
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Handle a rising edge on the RF line. `level` is the line read back inside the handler.
    ///
    /// Returns `true` if a detection started, in which case edge notifications must be disabled
    /// until [`EnvelopeEvent::Rearmed`].
    pub fn on_rising_edge(&mut self, level: bool) -> bool {
        // A spike that is already gone does not start a detection
        if !self.armed || !level {
            return false;
        }
        self.state = Envelope::DetectHigh;
        self.counter = 0;
        self.armed = false;
        true
    }

    /// Advance by one tick with the current line level.
    pub fn step(&mut self, level: bool) -> EnvelopeEvent {
        match self.state {
            Envelope::Idle => EnvelopeEvent::None,
            Envelope::DetectHigh => {
                if level {
                    if self.counter < self.count_high {
                        self.counter += 1;
                        EnvelopeEvent::None
                    } else {
                        self.enter(Envelope::DetectLow);
                        EnvelopeEvent::HighAccepted
                    }
                } else if self.counter >= self.count_high.saturating_sub(self.tolerance) {
                    self.enter(Envelope::DetectLow);
                    EnvelopeEvent::HighAccepted
                } else {
                    self.finish(false)
                }
            }
            Envelope::DetectLow => {
                if !level {
                    if self.counter < self.count_low {
                        self.counter += 1;
                        EnvelopeEvent::None
                    } else {
                        self.finish(true)
                    }
                } else {
                    let accepted = self.counter >= self.count_low.saturating_sub(self.tolerance);
                    self.finish(accepted)
                }
            }
            Envelope::DetectEnd => {
                if level {
                    self.enter(Envelope::Idle);
                    self.armed = true;
                    EnvelopeEvent::Rearmed
                } else {
                    EnvelopeEvent::None
                }
            }
        }
    }

    #[inline]
    fn enter(&mut self, state: Envelope) {
        self.state = state;
        self.counter = 0;
    }

    fn finish(&mut self, detected: bool) -> EnvelopeEvent {
        trace!("carrier run ended at {=u16}: {=bool}", self.counter, detected);
        self.enter(Envelope::DetectEnd);
        self.detected = detected;
        if detected {
            EnvelopeEvent::Qualified
        } else {
            EnvelopeEvent::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qualifier() -> RfEnvelope {
        RfEnvelope::new(&Config::RANGE_FINDER)
    }

    fn feed(env: &mut RfEnvelope, level: bool, ticks: u16) -> EnvelopeEvent {
        let mut last = EnvelopeEvent::None;
        for _ in 0..ticks {
            let event = env.step(level);
            if event != EnvelopeEvent::None {
                last = event;
            }
        }
        last
    }

    #[test]
    fn idle_ignores_the_line() {
        let mut env = qualifier();
        assert_eq!(feed(&mut env, true, 2000), EnvelopeEvent::None);
        assert_eq!(env.state(), Envelope::Idle);
        assert!(!env.is_sampling());
    }

    #[test]
    fn edge_disarms_until_rearmed() {
        let mut env = qualifier();
        assert!(env.on_rising_edge(true));
        assert_eq!(env.state(), Envelope::DetectHigh);
        assert!(!env.is_armed());
        assert!(!env.on_rising_edge(true));
    }

    #[test]
    fn edge_spike_is_ignored() {
        let mut env = qualifier();
        assert!(!env.on_rising_edge(false));
        assert_eq!(env.state(), Envelope::Idle);
        assert!(env.is_armed());
    }

    #[test]
    fn clean_carrier_qualifies() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        assert_eq!(feed(&mut env, true, 625), EnvelopeEvent::None);
        assert_eq!(env.counter(), 625);
        assert_eq!(feed(&mut env, false, 624), EnvelopeEvent::HighAccepted);
        assert_eq!(env.state(), Envelope::DetectLow);
        assert_eq!(env.step(true), EnvelopeEvent::Qualified);
        assert!(env.detected());
        assert_eq!(env.state(), Envelope::DetectEnd);
        assert_eq!(env.counter(), 0);
    }

    #[test]
    fn long_low_run_qualifies_on_threshold() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        feed(&mut env, true, 626);
        assert_eq!(env.state(), Envelope::DetectLow);
        assert_eq!(feed(&mut env, false, 624), EnvelopeEvent::None);
        assert_eq!(env.step(false), EnvelopeEvent::Qualified);
        assert!(env.detected());
        // Line stays low, nothing re-arms
        assert_eq!(feed(&mut env, false, 5000), EnvelopeEvent::None);
        assert!(!env.is_armed());
    }

    #[test]
    fn short_high_run_is_rejected() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        feed(&mut env, true, 625 - 10 - 1);
        assert_eq!(env.step(false), EnvelopeEvent::Rejected);
        assert!(!env.detected());
        assert_eq!(env.state(), Envelope::DetectEnd);
    }

    #[test]
    fn high_run_within_tolerance_is_accepted() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        feed(&mut env, true, 625 - 10);
        assert_eq!(env.step(false), EnvelopeEvent::HighAccepted);
    }

    #[test]
    fn short_low_run_is_rejected() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        feed(&mut env, true, 625);
        env.step(false);
        feed(&mut env, false, 600);
        assert_eq!(env.step(true), EnvelopeEvent::Rejected);
        assert!(!env.detected());
    }

    #[test]
    fn rejection_overwrites_previous_detection() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        feed(&mut env, true, 625);
        feed(&mut env, false, 624);
        env.step(true);
        assert!(env.detected());

        assert_eq!(env.step(true), EnvelopeEvent::Rearmed);
        assert!(env.on_rising_edge(true));
        feed(&mut env, true, 100);
        env.step(false);
        assert!(!env.detected());
    }

    #[test]
    fn detect_end_rearms_on_high() {
        let mut env = qualifier();
        env.on_rising_edge(true);
        env.step(false);
        assert_eq!(env.state(), Envelope::DetectEnd);
        assert_eq!(env.step(false), EnvelopeEvent::None);
        assert_eq!(env.step(true), EnvelopeEvent::Rearmed);
        assert_eq!(env.state(), Envelope::Idle);
        assert!(env.is_armed());
    }
}
