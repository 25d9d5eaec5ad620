//! Servo positioning for a range-finder arm on MSP430 microcontrollers.
//!
//! The servo is driven by a software PWM generated from a single periodic timer interrupt. Each
//! trigger (a push button press or a qualified RF on/off command) moves the arm between two
//! endpoint positions, one duty-cycle unit at a time, so the slew rate stays bounded.
//!
//! All state lives in one [`Controller`](controller::Controller):
//!
//! - [`Controller::on_tick`](controller::Controller::on_tick) runs inside the timer ISR. It drives
//!   the PWM level, advances the RF envelope qualifier and decrements every countdown.
//! - [`Controller::on_rising_edge`](controller::Controller::on_rising_edge) runs inside the GPIO
//!   ISR of the RF line and starts a detection.
//! - [`Controller::poll`](controller::Controller::poll) runs in the foreground loop. It confirms
//!   RF commands and steps the positioning state machine.
//!
//! [`shared::SharedController`] puts the controller behind a `critical_section` mutex so both
//! contexts can reach it, and [`driver`] binds it to `embedded-hal` pins.
//!
//! # Examples
//!
//! The `device-examples/` directory contains firmware for the MSP430FR2355 Launchpad built on the
//! `msp430fr2x5x-hal`. Build it from inside that directory with `cargo build --example rf_motor`.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod config;
pub mod confirm;
pub mod controller;
pub mod countdown;
pub mod driver;
pub mod envelope;
pub mod positioner;
pub mod prelude;
pub mod pwm;
pub mod shared;

pub use config::{Config, ConfigError};
pub use controller::{Controller, PollEvents, Snapshot, TickEvents, TickOutput};
pub use shared::SharedController;
