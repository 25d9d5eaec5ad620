//! Prelude

pub use crate::driver::Button as _rangefinder_servo_Button;
pub use embedded_hal::digital::InputPin as _rangefinder_servo_InputPin;
pub use embedded_hal::digital::OutputPin as _rangefinder_servo_OutputPin;
