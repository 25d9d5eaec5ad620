//! Sharing the controller between interrupt handlers and the foreground loop
//!
//! On a single-core MSP430 a critical section masks interrupts, so holding the controller inside
//! one bounds how stale the foreground view can get to a single tick: the timer ISR runs as soon
//! as the foreground releases the lock.

use crate::config::{Config, ConfigError};
use crate::controller::{Controller, Snapshot};
use core::cell::RefCell;
use critical_section::Mutex;

/// Controller behind a `critical_section` mutex, suitable for a `static`
pub struct SharedController(Mutex<RefCell<Controller>>);

impl SharedController {
    /// Wrap a controller
    pub const fn new(controller: Controller) -> Self {
        SharedController(Mutex::new(RefCell::new(controller)))
    }

    /// Wrap a controller built from an unchecked `config`. Pair with a `Config::validate` call at
    /// startup.
    pub const fn from_config(config: Config) -> Self {
        Self::new(Controller::new_unchecked(config))
    }

    /// Run `f` on the controller inside a critical section.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> R {
        critical_section::with(|cs| f(&mut self.0.borrow_ref_mut(cs)))
    }

    /// Replace the controller with one built from a validated `config`
    pub fn reconfigure(&self, config: Config) -> Result<(), ConfigError> {
        let controller = Controller::new(config)?;
        self.with(|c| *c = controller);
        Ok(())
    }

    /// Copy of the current state
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        self.with(|c| c.snapshot())
    }
}
