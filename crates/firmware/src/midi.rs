//! USB-MIDI plumbing: note messages queued by the dispatcher are written to the host, and anything the host sends is
//! read and thrown away.

use crate::UsbDriver;
use defmt::{info, panic, warn};
use embassy_futures::join::join;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{self, Channel},
};
use embassy_usb::{
    class::midi::{MidiClass, Receiver, Sender},
    driver::EndpointError,
};
use lkp_keyboard_lib::{io::MidiTransport, midi};

/// USB-MIDI Event Packets waiting to be written before the dispatcher starts dropping notes.
const MIDI_OUT_DEPTH: usize = 16;

/// Size of a USB full-speed bulk packet.
const MAX_PACKET_SIZE: usize = 64;

type MidiOutChannel = Channel<CriticalSectionRawMutex, [u8; 4], MIDI_OUT_DEPTH>;

/// Outgoing USB-MIDI Event Packets, filled by the dispatcher and drained by [`midi_task`].
pub static MIDI_OUT: MidiOutChannel = Channel::new();

/// The dispatcher's handle on the USB-MIDI output. Never waits; the USB side is serviced by [`midi_task`].
pub struct UsbMidiOut {
    packets: channel::Sender<'static, CriticalSectionRawMutex, [u8; 4], MIDI_OUT_DEPTH>,
}

impl UsbMidiOut {
    /// Constructs a `UsbMidiOut` feeding [`MIDI_OUT`].
    pub fn new() -> Self {
        Self {
            packets: MIDI_OUT.sender(),
        }
    }
}

impl MidiTransport for UsbMidiOut {
    fn send_message(&mut self, cable: u8, message: [u8; 3]) {
        if self
            .packets
            .try_send(midi::usb_packet(cable, message))
            .is_err()
        {
            warn!("MIDI output queue is full, dropping {}", message);
        }
    }
}

#[doc(hidden)]
struct Disconnected {}

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => panic!("Buffer overflow"),
            EndpointError::Disabled => Disconnected {},
        }
    }
}

/// Task responsible for both directions of the USB-MIDI interface.
#[embassy_executor::task]
pub async fn midi_task(class: MidiClass<'static, UsbDriver>) -> ! {
    let (mut sender, mut receiver) = class.split();
    loop {
        join(write_notes(&mut sender), discard_input(&mut receiver)).await;
    }
}

async fn write_notes(sender: &mut Sender<'static, UsbDriver>) {
    loop {
        sender.wait_connection().await;
        info!("USB connected");
        // notes played while nobody was listening would arrive late and out of context
        MIDI_OUT.clear();
        let _ = forward_packets(sender).await;
        info!("USB disconnected");
    }
}

/// Writes queued packets to the host, batching whatever has accumulated into a single transfer.
async fn forward_packets(sender: &mut Sender<'static, UsbDriver>) -> Result<(), Disconnected> {
    let mut buf = [0_u8; MAX_PACKET_SIZE];
    loop {
        buf[..4].copy_from_slice(&MIDI_OUT.receive().await);
        let mut len = 4;
        while len < MAX_PACKET_SIZE {
            let Ok(packet) = MIDI_OUT.try_receive() else {
                break;
            };
            buf[len..len + 4].copy_from_slice(&packet);
            len += 4;
        }
        sender.write_packet(&buf[..len]).await?;
    }
}

/// This device takes no performance data; whatever the host sends is read only so the endpoint doesn't stall.
async fn discard_input(receiver: &mut Receiver<'static, UsbDriver>) {
    let mut buf = [0_u8; MAX_PACKET_SIZE];
    loop {
        receiver.wait_connection().await;
        while let Ok(n) = receiver.read_packet(&mut buf).await {
            midi::discard_inbound(&buf[..n]);
        }
    }
}
