//! This module provides traits for the keyboard's outputs.
//!
//! The gate and the octave indicators are plain digital outputs and use [`OutputPin`] directly. Their errors are
//! [`Infallible`]: a GPIO write is assumed to succeed.

use core::convert::Infallible;
use embedded_hal::digital::OutputPin;
use measurements::Voltage;

/// A trait for expressing the sounding note as a control voltage.
pub trait ControlVoltage {
    /// Drives the output to `voltage` as measured at the synthesizer, i.e. after any gain applied by the output stage.
    /// Implementations are responsible for scaling to their converter's range.
    fn set_voltage(&mut self, voltage: Voltage);
}

/// A trait for sending MIDI to the host.
pub trait MidiTransport {
    /// Queues a three-byte MIDI message for delivery on the given virtual cable. Must not block.
    fn send_message(&mut self, cable: u8, message: [u8; 3]);
}

/// A digital output whose writes cannot fail, such as a GPIO pin.
pub trait InfallibleOutput: OutputPin<Error = Infallible> {
    /// Drives the output high or low.
    fn set_level(&mut self, high: bool) {
        let Ok(()) = self.set_state(high.into());
    }
}

impl<P: OutputPin<Error = Infallible>> InfallibleOutput for P {}
