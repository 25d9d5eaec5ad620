//! Software PWM
//!
//! Produces the servo pulse from the periodic tick instead of a timer output-compare channel, so
//! any GPIO can drive the servo. The period is `max_step` ticks. Within a period the output is
//! HIGH while the cycle counter is at or below the duty cycle; the tick on which the counter wraps
//! is always LOW.

/// Free-running software PWM generator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SoftPwm {
    counter: u16,
    max_step: u16,
}

impl SoftPwm {
    /// Create a generator with a period of `max_step` ticks, starting at the period boundary
    #[inline]
    pub const fn new(max_step: u16) -> Self {
        SoftPwm {
            counter: 0,
            max_step,
        }
    }

    /// Advance by one tick and return the output level for `duty`.
    #[inline]
    pub fn tick(&mut self, duty: u16) -> bool {
        let next = self.counter + 1;
        if next >= self.max_step {
            // Period boundary
            self.counter = 0;
            false
        } else {
            self.counter = next;
            next <= duty
        }
    }

    /// Position within the current period
    #[inline]
    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// PWM period in ticks
    #[inline]
    pub fn max_step(&self) -> u16 {
        self.max_step
    }

    /// Restart the period
    #[inline]
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn high_ticks(pwm: &mut SoftPwm, duty: u16) -> usize {
        (0..pwm.max_step()).filter(|_| pwm.tick(duty)).count()
    }

    #[test]
    fn pulse_length_follows_duty() {
        let mut pwm = SoftPwm::new(2000);
        assert_eq!(high_ticks(&mut pwm, 161), 161);
        assert_eq!(high_ticks(&mut pwm, 78), 78);
        assert_eq!(high_ticks(&mut pwm, 0), 0);
    }

    #[test]
    fn full_duty_still_drops_at_boundary() {
        let mut pwm = SoftPwm::new(10);
        let levels: Vec<bool> = (0..10).map(|_| pwm.tick(10)).collect();
        assert_eq!(levels.iter().filter(|l| **l).count(), 9);
        assert!(!levels[9]);
        assert_eq!(pwm.counter(), 0);
    }

    #[test]
    fn reset_restarts_period() {
        let mut pwm = SoftPwm::new(10);
        for _ in 0..5 {
            pwm.tick(3);
        }
        pwm.reset();
        assert_eq!(pwm.counter(), 0);
        assert!(pwm.tick(3));
        assert_eq!(pwm.counter(), 1);
    }

    proptest! {
        #[test]
        fn counter_stays_in_period(
            max_step in 2u16..3000,
            duties in proptest::collection::vec(0u16..3500, 1..4000),
        ) {
            let mut pwm = SoftPwm::new(max_step);
            for duty in duties {
                let level = pwm.tick(duty);
                let counter = pwm.counter();
                prop_assert!(counter < max_step);
                if counter == 0 {
                    prop_assert!(!level);
                } else {
                    prop_assert_eq!(level, counter <= duty);
                }
            }
        }
    }
}
