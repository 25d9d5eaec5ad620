//! Pin-level glue
//!
//! Binds a [`Controller`] to `embedded-hal` pins. [`ServoDriver`] belongs to the interrupt
//! handlers: it owns the PWM output and the RF input. [`Panel`] belongs to the foreground loop: it
//! owns the manual trigger and the confirmation indicator.
//!
//! Pin errors are never propagated. A failed write is ignored and a failed read counts as LOW,
//! which the qualifier treats like any other noise.

use crate::controller::{Controller, PollEvents, TickEvents};
use crate::shared::SharedController;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Timer and edge interrupt half of the servo
pub struct ServoDriver<PWM, RF> {
    pwm: PWM,
    rf: RF,
}

impl<PWM: OutputPin, RF: InputPin> ServoDriver<PWM, RF> {
    /// Take ownership of the PWM output and the RF input
    pub fn new(pwm: PWM, rf: RF) -> Self {
        ServoDriver { pwm, rf }
    }

    /// Timer ISR body: sample the RF line if needed, run the tick and drive the PWM pin.
    ///
    /// The caller re-enables the RF edge interrupt when the result contains
    /// [`TickEvents::REARM_EDGE`].
    #[inline]
    pub fn tick(&mut self, controller: &mut Controller) -> TickEvents {
        let rf_level = controller.samples_rf() && self.rf.is_high().unwrap_or(false);
        let out = controller.on_tick(rf_level);
        self.pwm.set_state(PinState::from(out.level)).ok();
        out.events
    }

    /// RF edge ISR body. Returns `true` if the caller must disable the RF edge interrupt.
    #[inline]
    pub fn rising_edge(&mut self, controller: &mut Controller) -> bool {
        let level = self.rf.is_high().unwrap_or(false);
        controller.on_rising_edge(level)
    }

    /// RF input, e.g. to switch its edge interrupt on and off
    #[inline]
    pub fn rf_mut(&mut self) -> &mut RF {
        &mut self.rf
    }

    /// Release the pins
    pub fn free(self) -> (PWM, RF) {
        (self.pwm, self.rf)
    }
}

/// Debounced manual trigger
pub trait Button {
    /// Whether a press was completed since the last call. Each physical press is reported once.
    fn is_pressed(&mut self) -> bool;
}

/// No manual trigger fitted
#[derive(Clone, Copy, Debug, Default)]
pub struct NoButton;

impl Button for NoButton {
    #[inline]
    fn is_pressed(&mut self) -> bool {
        false
    }
}

impl<F: FnMut() -> bool> Button for F {
    #[inline]
    fn is_pressed(&mut self) -> bool {
        self()
    }
}

/// Push button on an active-high input, reported on release.
///
/// The line must read HIGH on at least `min_samples` consecutive polls before the falling edge
/// counts as a press, which filters contact bounce without blocking the foreground loop.
pub struct ReleaseButton<P> {
    pin: P,
    min_samples: u16,
    held: u16,
}

impl<P: InputPin> ReleaseButton<P> {
    /// Wrap an input pin
    pub fn new(pin: P, min_samples: u16) -> Self {
        ReleaseButton {
            pin,
            min_samples,
            held: 0,
        }
    }

    /// Release the pin
    pub fn free(self) -> P {
        self.pin
    }
}

impl<P: InputPin> Button for ReleaseButton<P> {
    fn is_pressed(&mut self) -> bool {
        if self.pin.is_high().unwrap_or(false) {
            self.held = self.held.saturating_add(1);
            false
        } else {
            let pressed = self.held > 0 && self.held >= self.min_samples;
            self.held = 0;
            pressed
        }
    }
}

/// Foreground half of the servo
pub struct Panel<B, L> {
    button: B,
    indicator: L,
}

impl<B: Button, L: OutputPin> Panel<B, L> {
    /// Take ownership of the manual trigger and the confirmation indicator
    pub fn new(button: B, indicator: L) -> Self {
        Panel { button, indicator }
    }

    /// Foreground loop body: read the button, poll the shared controller and update the
    /// indicator. The button is read outside the critical section.
    pub fn poll(&mut self, shared: &SharedController) -> PollEvents {
        let pressed = self.button.is_pressed();
        let events = shared.with(|c| c.poll(pressed));
        self.show(events);
        events
    }

    /// Same as [`poll`](Self::poll) for a controller that is not shared with an ISR
    pub fn poll_controller(&mut self, controller: &mut Controller) -> PollEvents {
        let pressed = self.button.is_pressed();
        let events = controller.poll(pressed);
        self.show(events);
        events
    }

    fn show(&mut self, events: PollEvents) {
        if events.contains(PollEvents::INDICATOR_ON) {
            self.indicator.set_high().ok();
        }
        if events.contains(PollEvents::INDICATOR_OFF) {
            self.indicator.set_low().ok();
        }
    }

    /// Release the button and the indicator
    pub fn free(self) -> (B, L) {
        (self.button, self.indicator)
    }
}
