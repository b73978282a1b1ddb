//! Controls the device's CV and gate outputs.

use crate::midi::UsbMidiOut;
use defmt::trace;
use embassy_stm32::{
    dac::{DacCh1, Value},
    gpio::Output,
    mode::Async,
    peripherals::DAC1,
};
use lkp_keyboard_lib::{dispatcher::Dispatcher, io::ControlVoltage, queue::EventConsumer};
use measurements::Voltage;

/// Amount of gain applied to the DAC output by the op-amp stage that drives the CV jack.
pub const CV_OPAMP_GAIN: f64 = 3.2;

/// The dispatcher as wired on this board.
pub type KeyboardDispatcher = Dispatcher<CvDac, Output<'static>, Output<'static>, UsbMidiOut>;

/// The DAC channel feeding the CV output stage.
pub struct CvDac {
    dac: DacCh1<'static, DAC1, Async>,
}

impl CvDac {
    /// Constructs a `CvDac`.
    pub fn new(dac: DacCh1<'static, DAC1, Async>) -> Self {
        Self { dac }
    }
}

impl ControlVoltage for CvDac {
    fn set_voltage(&mut self, voltage: Voltage) {
        let dac_value = voltage_to_dac_value(voltage);
        trace!(
            "Sending {} to DAC to achieve a voltage of {}",
            dac_value,
            voltage.as_volts()
        );
        self.dac.set(dac_value);
    }
}

/// Helper function to convert the voltage required at the CV jack to a <abbr name="digital-to-analog converter">DAC</abbr> value.
///
/// There's an uncomfortable amount of hardcoding here. Ideally we could do without it, but, if not, this is the most appropriate place for it, as this is
/// where all the hardware-specific code goes.
fn voltage_to_dac_value(voltage: Voltage) -> Value {
    // full scale of the 12-bit converter
    const DAC_MAX: f64 = 4095.0;

    Value::Bit12Right(
        (voltage.as_volts()
            // undo the gain of the output stage to find what the DAC itself must produce
            / CV_OPAMP_GAIN
            // This is the reference voltage 3.333333; TODO: this should not be hardcoded, as reference voltages may vary
            / (10.0 / 3.0)
            * DAC_MAX)
            .clamp(0.0, DAC_MAX)
            // Casting to u16 serves as a quick and dirty rounding. The DAC resolution is high enough I don't think this will
            // matter.
            as u16,
    )
}

/// Task responsible for turning key events into CV, gate, MIDI and octave indicator output.
#[embassy_executor::task]
pub async fn keyboard(
    mut dispatcher: KeyboardDispatcher,
    mut events: EventConsumer<'static>,
) -> ! {
    dispatcher.run(&mut events).await
}
