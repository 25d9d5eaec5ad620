#![allow(dead_code)]

use rangefinder_servo::{Config, Controller, PollEvents, TickEvents};

/// Simulated board: one timer tick at a time, with the edge interrupt flag latched while edge
/// notifications are disabled, and two foreground polls per tick.
pub struct Rig {
    pub controller: Controller,
    level: bool,
    pending_edge: bool,
    pub ticks: u64,
}

impl Rig {
    pub fn new(config: Config) -> Self {
        Rig {
            controller: Controller::new(config).unwrap(),
            level: false,
            pending_edge: false,
            ticks: 0,
        }
    }

    /// One tick with the RF line at `level`, then the foreground loop.
    pub fn step(&mut self, level: bool, button: bool) -> (TickEvents, PollEvents) {
        if level && !self.level {
            self.pending_edge = true;
        }
        self.level = level;
        self.service_edge();

        let out = self.controller.on_tick(level);
        if out.events.contains(TickEvents::REARM_EDGE) {
            // A flag latched while disabled fires as soon as the interrupt is enabled
            self.service_edge();
        }
        self.ticks += 1;

        let polled = self.controller.poll(button) | self.controller.poll(false);
        (out.events, polled)
    }

    fn service_edge(&mut self) {
        if self.pending_edge && self.controller.envelope().is_armed() {
            self.pending_edge = false;
            self.controller.on_rising_edge(self.level);
        }
    }

    /// Hold the RF line for `ticks` ticks. Returns every poll event seen.
    pub fn hold(&mut self, level: bool, ticks: u32) -> PollEvents {
        let mut seen = PollEvents::empty();
        for _ in 0..ticks {
            seen |= self.step(level, false).1;
        }
        seen
    }

    /// Square wave: `high` ticks HIGH then `low` ticks LOW, `periods` times.
    pub fn square(&mut self, high: u32, low: u32, periods: u32) -> PollEvents {
        let mut seen = PollEvents::empty();
        for _ in 0..periods {
            seen |= self.hold(true, high);
            seen |= self.hold(false, low);
        }
        seen
    }
}
