//! [Embassy](https://embassy.dev)-based firmware for a split-octave keyboard controller. The firmware runs on the
//! [Nucleo-F767ZI development board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html), which is powered by
//! an F7-series STM32 microcontroller.
//!
//! A 49-key keybed and three control keys are scanned as a 6 × 10 matrix. The most recently pressed key still held is
//! expressed as a control voltage and gate for analog synthesizers, and every keybed transition is sent to the host as
//! a USB-MIDI note message. The octave keys shift the keybed within ±1 octave; holding the function key makes them
//! shift only the keys below middle C. Three LEDs show which octaves are in use.

#![no_std]
#![no_main]

mod keyboard;
mod midi;
mod scanner;

use crate::{
    keyboard::{CvDac, KeyboardDispatcher},
    midi::UsbMidiOut,
};
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::{
    Config, bind_interrupts,
    dac::{Dac, DacCh2},
    gpio::{Input, Level, Output, Pull, Speed},
    mode::Async,
    peripherals::{self, DAC1},
    time::Hertz,
    usb,
};
use embassy_time::Timer;
use embassy_usb::{Builder, UsbDevice, class::midi::MidiClass};
use lkp_keyboard_lib::{
    configuration::DuplicatePress,
    io::ControlVoltage,
    keyboard_state::OCTAVE_INDICATOR_CNT,
    pitch::BASE_SHIFT,
    queue::{EventConsumer, EventProducer, KeyEventChannel},
};
use measurements::Voltage;
use static_cell::StaticCell;

#[cfg(feature = "defmt-rtt")]
use defmt_rtt as _;
#[cfg(not(feature = "panic-probe"))]
use panic_halt as _;
#[cfg(feature = "panic-probe")]
use panic_probe as _;

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    }
);

/// USB driver for the board's full-speed OTG port.
pub type UsbDriver = usb::Driver<'static, peripherals::USB_OTG_FS>;

/// Key transitions on their way from the scanner to the dispatcher.
static KEY_EVENTS: KeyEventChannel = KeyEventChannel::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting keyboard controller");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop, crucial for dividing clock
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // per section 5.2 of RM0410: most peripheral clocks are derived from their bus clock, but the 48MHz clock used for USB OTG FS
            // is derived from main PLL VCO (PLLQ clock) or PLLSAI VCO (PLLSAI clock)
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    // an external LED; dropping the handle would float the pin, so it is leaked to stay lit
    core::mem::forget(Output::new(p.PG1, Level::High, Speed::Low));

    let gate = Output::new(p.PG0, Level::Low, Speed::Low);

    // the board's user LEDs, lowest octave first: LD1 (green), LD2 (blue), LD3 (red)
    let mut octave_leds: [Output<'static>; OCTAVE_INDICATOR_CNT] = [
        Output::new(p.PB0, Level::Low, Speed::Low),
        Output::new(p.PB7, Level::Low, Speed::Low),
        Output::new(p.PB14, Level::Low, Speed::Low),
    ];

    // set up the DAC to output voltage to the synth
    // per RM0410 (the reference manual for the chip), DAC channel 1 outputs on port A, pin 4
    let dac_ch1_out = p.PA4;
    // DMA: direct memory access controller
    let dac_ch1_dma = p.DMA1_CH5;

    // the second DAC channel is unused, but must be held; see `idle_dac_ch2`
    let dac_ch2_out = p.PA5;
    let dac_ch2_dma = p.DMA1_CH6;

    let (dac_ch1, dac_ch2) =
        Dac::new(p.DAC1, dac_ch1_dma, dac_ch2_dma, dac_ch1_out, dac_ch2_out).split();

    let mut cv = CvDac::new(dac_ch1);
    cv.set_voltage(Voltage::from_volts(BASE_SHIFT));

    // Create the driver, from the HAL.
    static ENDPOINT_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let mut config = embassy_stm32::usb::Config::default();

    // USB devices which are self-powered (i.e., that can stay powered on if unplugged from the host)
    // need to enable vbus_detection to comply with the USB spec. Per section 6.10 of the Nucleo board
    // manual (UM1974), CN13 (the USB port) cannot power the board; external power is necessary.
    // See docs on `vbus_detection` for details.
    config.vbus_detection = true;

    let driver = usb::Driver::new_fs(
        p.USB_OTG_FS,
        Irqs,
        p.PA12,
        p.PA11,
        ENDPOINT_OUT_BUFFER.init([0; 256]),
        config,
    );

    // per https://pid.codes, FOSS projects can apply to be listed under the vendor ID owned by InterBiometrics
    let vendor_id = 0x1209;
    // pid.codes reserves this product ID for testing
    let product_id = 0x0001;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("Pawpaw Works");
    config.product = Some("LKP Keyboard");
    config.self_powered = true;
    config.max_power = 0;

    // Create embassy-usb DeviceBuilder using the driver and config.
    // It needs some buffers for building the descriptors.
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );

    // one jack in each direction: notes go out, and whatever comes in is drained
    let class = MidiClass::new(&mut builder, 1, 1, 64);

    // Build the builder.
    let usb = builder.build();

    unwrap!(spawner.spawn(usb_task(usb)));
    unwrap!(spawner.spawn(midi::midi_task(class)));
    unwrap!(spawner.spawn(idle_dac_ch2(dac_ch2)));

    // columns are driven, rows are read
    let columns = [
        Output::new(p.PE2, Level::Low, Speed::Low),
        Output::new(p.PE3, Level::Low, Speed::Low),
        Output::new(p.PE4, Level::Low, Speed::Low),
        Output::new(p.PE5, Level::Low, Speed::Low),
        Output::new(p.PE6, Level::Low, Speed::Low),
        Output::new(p.PE7, Level::Low, Speed::Low),
        Output::new(p.PE8, Level::Low, Speed::Low),
        Output::new(p.PE9, Level::Low, Speed::Low),
        Output::new(p.PE10, Level::Low, Speed::Low),
        Output::new(p.PE11, Level::Low, Speed::Low),
    ];
    let rows = [
        Input::new(p.PF0, Pull::Down),
        Input::new(p.PF1, Pull::Down),
        Input::new(p.PF2, Pull::Down),
        Input::new(p.PF3, Pull::Down),
        Input::new(p.PF4, Pull::Down),
        Input::new(p.PF5, Pull::Down),
    ];
    unwrap!(spawner.spawn(scanner::scan_keys(
        columns,
        rows,
        EventProducer::new(&KEY_EVENTS)
    )));

    // keys pressed during the boot animation wait in the queue
    indicate_boot(&mut octave_leds).await;

    let dispatcher = KeyboardDispatcher::new(
        DuplicatePress::default(),
        cv,
        gate,
        octave_leds,
        UsbMidiOut::new(),
    );
    unwrap!(spawner.spawn(keyboard::keyboard(
        dispatcher,
        EventConsumer::new(&KEY_EVENTS)
    )));

    info!("Keyboard controller running");
}

/// Runs each octave LED in turn, three times over, to show the firmware has started.
async fn indicate_boot(leds: &mut [Output<'static>]) {
    for _ in 0..3 {
        for led in leds.iter_mut() {
            Timer::after_millis(50).await;
            led.set_high();
            Timer::after_millis(50).await;
            led.set_low();
        }
    }
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

/// Holds the second DAC channel so the DAC itself isn't disabled; see <https://github.com/embassy-rs/embassy/issues/4577>.
#[embassy_executor::task]
async fn idle_dac_ch2(dac: DacCh2<'static, DAC1, Async>) -> ! {
    loop {
        Timer::after_secs(60).await;
        trace!("Idle DAC channel 2 reading: {}", dac.read());
    }
}
