#![no_main]
#![no_std]
#![feature(abi_msp430_interrupt)]

// Servo arm on P1.2 that swings between its two endpoints on every press of the P2.3 button, or
// whenever a 433 MHz remote is held and released. The receiver output goes to P1.6 and the P1.0
// LED lights up once the remote has been held long enough.

use core::cell::RefCell;
use critical_section::{with, Mutex};
use msp430_rt::entry;
use msp430fr2355::interrupt;
use msp430fr2x5x_hal::{
    clock::{ClockConfig, DcoclkFreqSel, MclkDiv, SmclkDiv},
    fram::Fram,
    gpio::*,
    pmm::Pmm,
    timer::{Timer, TimerConfig, TimerParts3},
    watchdog::Wdt,
};
use panic_msp430 as _;
use rangefinder_servo::driver::{Panel, ReleaseButton, ServoDriver};
use rangefinder_servo::{Config, SharedController, TickEvents};

const CONFIG: Config = Config::RANGE_FINDER;

type PwmPin = Pin<P1, Pin2, Output>;
type RfPin = Pin<P1, Pin6, Input<Pulldown>>;

static SERVO: SharedController = SharedController::from_config(CONFIG);
static DRIVER: Mutex<RefCell<Option<ServoDriver<PwmPin, RfPin>>>> =
    Mutex::new(RefCell::new(None));
static TIMER: Mutex<RefCell<Option<Timer<msp430fr2355::TB0>>>> = Mutex::new(RefCell::new(None));
static P1IV: Mutex<RefCell<Option<PxIV<P1>>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    CONFIG.validate().unwrap();

    let periph = msp430fr2355::Peripherals::take().unwrap();
    let mut fram = Fram::new(periph.FRCTL);
    Wdt::constrain(periph.WDT_A);
    let pmm = Pmm::new(periph.PMM);

    let p1 = Batch::new(periph.P1)
        .config_pin0(|p| p.to_output())
        .config_pin2(|p| p.to_output())
        .config_pin6(|p| p.pulldown())
        .split(&pmm);
    let p2 = Batch::new(periph.P2)
        .config_pin3(|p| p.pulldown())
        .split(&pmm);

    let (smclk, _aclk, _delay) = ClockConfig::new(periph.CS)
        .mclk_dcoclk(DcoclkFreqSel::_16MHz, MclkDiv::_1)
        .smclk_on(SmclkDiv::_1)
        .aclk_refoclk()
        .freeze(&mut fram);

    // One servo tick every `tick_count` SMCLK cycles: 10 us at 16 MHz
    let mut timer = TimerParts3::new(periph.TB0, TimerConfig::smclk(&smclk)).timer;
    timer.start(CONFIG.tick_count);
    timer.enable_interrupts();

    let mut rf = p1.pin6;
    rf.select_rising_edge_trigger().enable_interrupts();

    let mut panel = Panel::new(ReleaseButton::new(p2.pin3, 20), p1.pin0);

    with(|cs| {
        *DRIVER.borrow_ref_mut(cs) = Some(ServoDriver::new(p1.pin2, rf));
        *TIMER.borrow_ref_mut(cs) = Some(timer);
        *P1IV.borrow_ref_mut(cs) = Some(p1.pxiv);
    });

    unsafe { msp430::interrupt::enable() };

    loop {
        panel.poll(&SERVO);
    }
}

#[interrupt]
fn TIMER0_B1() {
    with(|cs| {
        if let Some(timer) = TIMER.borrow_ref_mut(cs).as_mut() {
            timer.wait().ok();
        }
        let mut driver = DRIVER.borrow_ref_mut(cs);
        let Some(driver) = driver.as_mut() else {
            return;
        };
        let events = SERVO.with(|servo| driver.tick(servo));
        if events.contains(TickEvents::REARM_EDGE) {
            // A flag latched while disabled fires as soon as the interrupt is back on
            driver.rf_mut().enable_interrupts();
        }
    });
}

#[interrupt]
fn PORT1() {
    with(|cs| {
        let vector = P1IV
            .borrow_ref_mut(cs)
            .as_mut()
            .map(|pxiv| pxiv.get_interrupt_vector());
        if vector != Some(GpioVector::Pin6Isr) {
            return;
        }
        if let Some(driver) = DRIVER.borrow_ref_mut(cs).as_mut() {
            if SERVO.with(|servo| driver.rising_edge(servo)) {
                driver.rf_mut().disable_interrupts();
            }
        }
    });
}
