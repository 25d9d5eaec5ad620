//! Timing and positioning constants
//!
//! Every duration is counted in timer ticks, except the RF confirmation delays which use the
//! prescaled long countdown (one unit every `prescaler + 1` ticks). With the range-finder defaults
//! a tick is 10 us and a long unit is roughly 1 ms.

use core::fmt;

/// Configures the controller and every state machine inside it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Timer input clock frequency in Hz
    pub clock_hz: u32,
    /// Timer counts per tick (the CCR0 value in up mode)
    pub tick_count: u16,
    /// PWM period in ticks
    pub max_step: u16,
    /// Duty cycle at power-up
    pub initial_duty: u16,
    /// First positioning endpoint
    pub start: u16,
    /// Second positioning endpoint
    pub end: u16,
    /// Ticks between two duty-cycle steps
    pub speed: u16,
    /// HIGH run length that identifies the carrier
    pub count_high: u16,
    /// LOW run length that identifies the carrier
    pub count_low: u16,
    /// Accepted shortfall on either run length
    pub tolerance: u16,
    /// Long units the carrier must persist before a command is confirmed
    pub validate: u16,
    /// Long units the carrier must stay absent before the command fires
    pub wait_end: u16,
    /// Long units during which new commands are ignored
    pub ignore: u16,
    /// Ticks per long unit, minus one
    pub prescaler: u16,
}

impl Config {
    /// Range-finder arm on a 16 MHz SMCLK: 10 us ticks, 50 Hz PWM, 30 ms per step.
    pub const RANGE_FINDER: Config = Config {
        clock_hz: 16_000_000,
        tick_count: 160,
        max_step: 2000,
        initial_duty: 161,
        start: 161,
        end: 78,
        speed: 3000,
        count_high: 625,
        count_low: 624,
        tolerance: 10,
        validate: 10,
        wait_end: 10,
        ignore: 1000,
        prescaler: 100,
    };

    /// Configure the tick timer clock and the count per tick
    #[inline]
    pub const fn tick(self, clock_hz: u32, tick_count: u16) -> Self {
        Config {
            clock_hz,
            tick_count,
            ..self
        }
    }

    /// Configure the PWM period in ticks
    #[inline]
    pub const fn max_step(self, max_step: u16) -> Self {
        Config { max_step, ..self }
    }

    /// Configure the power-up duty cycle and the two endpoints
    #[inline]
    pub const fn positions(self, initial_duty: u16, start: u16, end: u16) -> Self {
        Config {
            initial_duty,
            start,
            end,
            ..self
        }
    }

    /// Configure the delay in ticks between two duty-cycle steps
    #[inline]
    pub const fn speed(self, speed: u16) -> Self {
        Config { speed, ..self }
    }

    /// Configure the run lengths of the carrier and the accepted shortfall
    #[inline]
    pub const fn carrier(self, count_high: u16, count_low: u16, tolerance: u16) -> Self {
        Config {
            count_high,
            count_low,
            tolerance,
            ..self
        }
    }

    /// Configure the confirmation delays in long units
    #[inline]
    pub const fn confirmation(self, validate: u16, wait_end: u16, ignore: u16) -> Self {
        Config {
            validate,
            wait_end,
            ignore,
            ..self
        }
    }

    /// Configure the number of ticks per long unit, minus one
    #[inline]
    pub const fn prescaler(self, prescaler: u16) -> Self {
        Config { prescaler, ..self }
    }

    /// Check the constants against each other.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_hz == 0 || self.tick_count == 0 {
            return Err(ConfigError::ZeroTick);
        }
        // The counter needs at least one non-wrapping value
        if self.max_step < 2 {
            return Err(ConfigError::PeriodTooShort);
        }
        if self.initial_duty > self.max_step {
            return Err(ConfigError::InitialOutOfRange);
        }
        if self.start > self.max_step || self.end > self.max_step {
            return Err(ConfigError::EndpointOutOfRange);
        }
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if self.tolerance > self.count_high || self.tolerance > self.count_low {
            return Err(ConfigError::ToleranceTooWide);
        }
        Ok(())
    }

    // The derived timings below never panic on an unvalidated config: a zero divisor yields 0
    // and results saturate at `u32::MAX`.

    /// Duration of one tick in nanoseconds
    #[inline]
    pub const fn tick_period_ns(&self) -> u32 {
        ratio(self.tick_count as u64 * 1_000_000_000, self.clock_hz as u64)
    }

    /// PWM output frequency in Hz
    #[inline]
    pub const fn pwm_frequency_hz(&self) -> u32 {
        ratio(
            self.clock_hz as u64,
            self.tick_count as u64 * self.max_step as u64,
        )
    }

    /// Length of the HIGH pulse produced by `duty`, in microseconds
    #[inline]
    pub const fn pulse_width_us(&self, duty: u16) -> u32 {
        let ticks = if duty >= self.max_step {
            self.max_step.saturating_sub(1)
        } else {
            duty
        };
        ratio(ticks as u64 * self.tick_period_ns() as u64, 1000)
    }

    /// Time between two duty-cycle steps, in microseconds
    #[inline]
    pub const fn step_interval_us(&self) -> u32 {
        ratio(self.speed as u64 * self.tick_period_ns() as u64, 1000)
    }
}

const fn ratio(num: u64, den: u64) -> u32 {
    match num.checked_div(den) {
        Some(q) if q > u32::MAX as u64 => u32::MAX,
        Some(q) => q as u32,
        None => 0,
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::RANGE_FINDER
    }
}

/// Inconsistent configuration constants
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Clock frequency or tick count is zero
    ZeroTick,
    /// PWM period shorter than two ticks
    PeriodTooShort,
    /// Initial duty cycle above the PWM period
    InitialOutOfRange,
    /// A positioning endpoint above the PWM period
    EndpointOutOfRange,
    /// Zero delay between steps
    ZeroSpeed,
    /// Tolerance larger than one of the run lengths
    ToleranceTooWide,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroTick => "tick clock or count is zero",
            ConfigError::PeriodTooShort => "PWM period must be at least two ticks",
            ConfigError::InitialOutOfRange => "initial duty cycle exceeds the PWM period",
            ConfigError::EndpointOutOfRange => "positioning endpoint exceeds the PWM period",
            ConfigError::ZeroSpeed => "step delay must be nonzero",
            ConfigError::ToleranceTooWide => "tolerance exceeds a carrier run length",
        };
        f.write_str(msg)
    }
}
