//! Helpers for the USB-MIDI side of the keyboard: building the note messages sent for keybed events, framing them as
//! USB-MIDI Event Packets, and disposing of whatever the host sends us.

use crate::key::KeyAction;
use wmidi::{Channel, MidiMessage, Note, U7};

/// Channel all note messages are sent on.
pub const MIDI_CHANNEL: Channel = Channel::Ch1;
/// Velocity of every note-on; the keybed isn't velocity sensitive.
pub const NOTE_ON_VELOCITY: U7 = U7::MAX;
/// Virtual cable all messages are sent on.
pub const MIDI_CABLE: u8 = 0;

/// Converts a computed note number into a [`Note`], returning `None` if it lies outside the MIDI range.
pub fn note_from_number(number: i16) -> Option<Note> {
    let number = u8::try_from(number).ok()?;
    Note::try_from(number).ok()
}

/// Builds the note message for a keybed transition.
pub fn note_message(action: KeyAction, note: Note) -> MidiMessage<'static> {
    match action {
        KeyAction::Pressed => MidiMessage::NoteOn(MIDI_CHANNEL, note, NOTE_ON_VELOCITY),
        KeyAction::Released => MidiMessage::NoteOff(MIDI_CHANNEL, note, U7::MIN),
    }
}

/// Serializes a three-byte message, returning `None` for messages of any other length.
pub fn message_bytes(message: &MidiMessage) -> Option<[u8; 3]> {
    if message.bytes_size() != 3 {
        return None;
    }
    let mut data = [0_u8; 3];
    message.copy_to_slice(&mut data).ok()?;
    Some(data)
}

/// Frames a three-byte message as a USB-MIDI Event Packet.
///
/// The Packet Header carries the cable number in its high nibble and the Code Index Number in its low nibble; for
/// channel voice messages the latter is simply the status nibble.
pub fn usb_packet(cable: u8, message: [u8; 3]) -> [u8; 4] {
    [(cable << 4) | (message[0] >> 4), message[0], message[1], message[2]]
}

/// Drains data received from the host, which this device has no use for. Returns the number of packets discarded.
///
/// Data may contain one or more USB-MIDI Event Packets.
pub fn discard_inbound(data: &[u8]) -> usize {
    data.chunks(4)
        .filter(|potential_packet| {
            if potential_packet.len() != 4 {
                error!("USB-MIDI Event Packets must always be 32 bits long");
                return false;
            }
            // the Packet Header is not of interest; the remaining three bytes contain the actual MIDI event
            if MidiMessage::from_bytes(&potential_packet[1..]).is_ok() {
                debug!("Discarding inbound MIDI message: {}", potential_packet);
            } else {
                debug!("Discarding unrecognized inbound packet: {}", potential_packet);
            }
            true
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_numbers_outside_midi_range_are_rejected() {
        assert_eq!(Some(Note::C4), note_from_number(60));
        assert_eq!(Some(Note::LOWEST_NOTE), note_from_number(0));
        assert_eq!(Some(Note::HIGHEST_NOTE), note_from_number(127));
        assert_eq!(None, note_from_number(128));
        assert_eq!(None, note_from_number(-1));
        // would alias middle C if truncated to a byte
        assert_eq!(None, note_from_number(256 + 60));
    }

    #[test]
    fn note_on_bytes() {
        let msg = note_message(KeyAction::Pressed, Note::C4);
        assert_eq!(Some([0x90, 60, 127]), message_bytes(&msg), "Expected left but got right");
    }

    #[test]
    fn note_off_bytes() {
        let msg = note_message(KeyAction::Released, Note::A4);
        assert_eq!(Some([0x80, 69, 0]), message_bytes(&msg), "Expected left but got right");
    }

    #[test]
    fn only_three_byte_messages_serialize() {
        let msg = MidiMessage::ProgramChange(Channel::Ch1, U7::MIN);
        assert_eq!(None, message_bytes(&msg));
    }

    #[test]
    fn packet_header() {
        assert_eq!([0x09, 0x90, 60, 127], usb_packet(0, [0x90, 60, 127]));
        assert_eq!([0x38, 0x80, 60, 0], usb_packet(3, [0x80, 60, 0]));
    }

    #[test]
    fn discard_counts_whole_packets() {
        let data = [0x09, 0x90, 60, 127, 0x08, 0x80, 60, 0, 0x0B];
        assert_eq!(2, discard_inbound(&data));
        assert_eq!(0, discard_inbound(&[]));
    }
}
