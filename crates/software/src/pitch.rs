//! Translation of keys into pitch, both as a control voltage for the analog output and as a MIDI note number.
//!
//! Both translations pick the octave offset by which side of the split the key falls on; see
//! [`OctaveState::offset_for`].

use crate::{key::KeyId, keyboard_state::OctaveState};
use measurements::Voltage;

/// Keys in one octave of the keybed.
pub const KEYS_PER_OCTAVE: u8 = 12;

/// Added to every control voltage so that the lowest key stays positive with the keybed shifted down to
/// [`OCTAVE_MIN`][crate::keyboard_state::OCTAVE_MIN].
pub const BASE_SHIFT: f64 = 1.0;

/// Volts above the octave for each semitone, calibrated against the output stage at one volt per octave.
pub const NOTE_TABLE: [f64; KEYS_PER_OCTAVE as usize] = [
    0.0833, 0.1667, 0.2550, 0.3333, 0.4167, 0.5000, 0.5833, 0.6667, 0.7500, 0.8333, 0.9167, 1.000,
];

/// Added to a key's identifier to get its MIDI note number; places [`KEY_MIDDLE_C`][crate::key::KEY_MIDDLE_C] on
/// middle C (note 60).
pub const MIDI_KEY_OFFSET: u8 = 35;

/// Returns the control voltage that plays `key`, before any gain applied by the output stage.
///
/// Key identifiers start at one, so the first key of each octave, i.e. a multiple of [`KEYS_PER_OCTAVE`], is the top
/// entry of the [`NOTE_TABLE`] for the octave below it.
pub fn key_to_voltage(key: KeyId, octave: &OctaveState) -> Voltage {
    let step = key.get() - 1;
    let key_octave = f64::from(step / KEYS_PER_OCTAVE);
    let semitone = NOTE_TABLE[usize::from(step % KEYS_PER_OCTAVE)];

    Voltage::from_volts(
        key_octave + f64::from(octave.offset_for(key)) + BASE_SHIFT + semitone,
    )
}

/// Returns the MIDI note number for `key`.
///
/// The result isn't clamped to the MIDI range; with the stock layout and octave limits it can't leave it, but callers
/// building MIDI messages must still check, e.g. with [`note_from_number`][crate::midi::note_from_number].
pub fn key_to_midi(key: KeyId, octave: &OctaveState) -> i16 {
    let shift = i16::from(octave.offset_for(key)) * i16::from(KEYS_PER_OCTAVE);
    i16::from(key.get()) + i16::from(MIDI_KEY_OFFSET) + shift
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard_state::{OCTAVE_MAX, OCTAVE_MIN, OctaveShift};

    const EPSILON: f64 = 1e-9;

    fn key(id: u16) -> KeyId {
        KeyId::new(id).unwrap()
    }

    fn volts(key_id: u16, octave: &OctaveState) -> f64 {
        key_to_voltage(key(key_id), octave).as_volts()
    }

    fn split(top: OctaveShift, bottom_steps: &[OctaveShift]) -> OctaveState {
        let mut octave = OctaveState::new();
        octave.shift(top);
        octave.set_func_held(true);
        bottom_steps.iter().for_each(|&s| octave.shift(s));
        octave.set_func_held(false);
        octave
    }

    #[test]
    fn voltage_within_first_octave() {
        let octave = OctaveState::new();
        assert!((volts(1, &octave) - 1.0833).abs() < EPSILON);
        assert!((volts(3, &octave) - 1.2550).abs() < EPSILON);
        assert!((volts(11, &octave) - 1.9167).abs() < EPSILON);
    }

    #[test]
    fn octave_multiple_wraps_to_top_of_table() {
        let octave = OctaveState::new();
        assert!((volts(12, &octave) - 2.0).abs() < EPSILON);
        assert!((volts(13, &octave) - 2.0833).abs() < EPSILON);
        assert!((volts(24, &octave) - 3.0).abs() < EPSILON);
        assert!((volts(48, &octave) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn voltage_follows_split() {
        let octave = split(OctaveShift::Up, &[OctaveShift::Down, OctaveShift::Down]);
        assert_eq!((1, -1), (octave.top_offset(), octave.bottom_offset()));

        // middle C sits on the top half, the key below it on the bottom half
        assert!((volts(25, &octave) - 4.0833).abs() < EPSILON);
        assert!((volts(24, &octave) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn voltage_never_negative() {
        let mut octave = OctaveState::new();
        octave.shift(OctaveShift::Down);
        assert_eq!(OCTAVE_MIN, octave.bottom_offset());
        for id in 1..=49 {
            assert!(volts(id, &octave) > 0.0);
        }
    }

    #[test]
    fn voltage_defined_for_every_key() {
        let octave = OctaveState::new();
        for raw in 0..=u16::from(u8::MAX) {
            let Ok(key) = KeyId::new(raw) else {
                continue;
            };
            assert!(key_to_voltage(key, &octave).as_volts() >= BASE_SHIFT);
        }
    }

    #[test]
    fn voltage_is_deterministic() {
        let octave = split(OctaveShift::Up, &[OctaveShift::Down]);
        for id in 1..=49 {
            assert_eq!(
                key_to_voltage(key(id), &octave),
                key_to_voltage(key(id), &octave)
            );
        }
    }

    #[test]
    fn midi_middle_c() {
        assert_eq!(60, key_to_midi(key(25), &OctaveState::new()));
        assert_eq!(36, key_to_midi(key(1), &OctaveState::new()));
        assert_eq!(84, key_to_midi(key(49), &OctaveState::new()));
    }

    #[test]
    fn midi_follows_split() {
        let octave = split(OctaveShift::Up, &[OctaveShift::Down, OctaveShift::Down]);
        assert_eq!(72, key_to_midi(key(25), &octave));
        assert_eq!(47, key_to_midi(key(24), &octave));
    }

    #[test]
    fn midi_stays_in_range_at_extremes() {
        let mut octave = OctaveState::new();
        octave.shift(OctaveShift::Up);
        assert_eq!(OCTAVE_MAX, octave.top_offset());
        assert_eq!(96, key_to_midi(key(49), &octave));

        let mut octave = OctaveState::new();
        octave.shift(OctaveShift::Down);
        assert_eq!(24, key_to_midi(key(1), &octave));
    }
}
