//! Provides the octave-shift state machine.
//!
//! The keybed is divided at [`KEY_MIDDLE_C`]. Keys from there up are transposed by the top offset and keys below it by
//! the bottom offset. Normally both halves move together. While the function key is held, the octave keys move the
//! bottom half alone ("split" mode), which lets the left hand play below the right.

use crate::key::{KEY_MIDDLE_C, KeyId};

/// Lowest octave offset either half of the keybed may be shifted to.
pub const OCTAVE_MIN: i8 = -1;
/// Highest octave offset either half of the keybed may be shifted to.
pub const OCTAVE_MAX: i8 = 1;

/// One indicator per octave offset, from [`OCTAVE_MIN`] to [`OCTAVE_MAX`].
pub const OCTAVE_INDICATOR_CNT: usize = (OCTAVE_MAX - OCTAVE_MIN) as usize + 1;

/// Direction of an octave-control key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OctaveShift {
    /// Toward [`OCTAVE_MIN`].
    Down,
    /// Toward [`OCTAVE_MAX`].
    Up,
}

/// Octave offsets of both halves of the keybed plus the state of the function key.
///
/// Always satisfies `OCTAVE_MIN <= bottom_offset <= top_offset <= OCTAVE_MAX`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OctaveState {
    top_offset: i8,
    bottom_offset: i8,
    func_held: bool,
}

impl OctaveState {
    /// Constructs an `OctaveState` with both halves unshifted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Getter.
    pub fn top_offset(&self) -> i8 {
        self.top_offset
    }

    /// Getter.
    pub fn bottom_offset(&self) -> i8 {
        self.bottom_offset
    }

    /// Returns `true` while the function key is held, i.e. while the octave keys are in split mode.
    pub fn func_held(&self) -> bool {
        self.func_held
    }

    /// Setter.
    pub fn set_func_held(&mut self, held: bool) {
        self.func_held = held;
    }

    /// Applies a press of an octave-control key. Shifts that would leave the legal range are ignored.
    pub fn shift(&mut self, shift: OctaveShift) {
        if self.func_held {
            // split mode: the bottom half may not climb above the top half
            match shift {
                OctaveShift::Down if self.bottom_offset > OCTAVE_MIN => self.bottom_offset -= 1,
                OctaveShift::Up if self.bottom_offset < self.top_offset => self.bottom_offset += 1,
                _ => {}
            }
        } else {
            match shift {
                OctaveShift::Down if self.top_offset > OCTAVE_MIN => self.top_offset -= 1,
                OctaveShift::Up if self.top_offset < OCTAVE_MAX => self.top_offset += 1,
                _ => {}
            }
            self.bottom_offset = self.top_offset;
        }
    }

    /// Returns the offset which applies to `key`.
    pub fn offset_for(&self, key: KeyId) -> i8 {
        if key >= KEY_MIDDLE_C {
            self.top_offset
        } else {
            self.bottom_offset
        }
    }

    /// Returns which octave indicators should be lit, lowest octave first.
    ///
    /// The indicator for the top offset is always lit; the one for the bottom offset is lit as well when the keybed is
    /// split.
    pub fn indicators(&self) -> [bool; OCTAVE_INDICATOR_CNT] {
        let mut lit = [false; OCTAVE_INDICATOR_CNT];
        lit[indicator_index(self.top_offset)] = true;
        lit[indicator_index(self.bottom_offset)] = true;
        lit
    }
}

fn indicator_index(offset: i8) -> usize {
    (offset - OCTAVE_MIN) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(top_offset: i8, bottom_offset: i8, func_held: bool) -> OctaveState {
        OctaveState {
            top_offset,
            bottom_offset,
            func_held,
        }
    }

    fn assert_invariant(state: &OctaveState) {
        assert!(OCTAVE_MIN <= state.bottom_offset());
        assert!(state.bottom_offset() <= state.top_offset());
        assert!(state.top_offset() <= OCTAVE_MAX);
    }

    #[test]
    fn new_is_unshifted() {
        assert_eq!(state(0, 0, false), OctaveState::new());
    }

    #[test]
    fn normal_mode_moves_both_halves() {
        let mut actual = OctaveState::new();
        actual.shift(OctaveShift::Up);
        assert_eq!(state(1, 1, false), actual, "Expected left but got right");

        actual.shift(OctaveShift::Down);
        actual.shift(OctaveShift::Down);
        assert_eq!(state(-1, -1, false), actual, "Expected left but got right");
    }

    #[test]
    fn normal_mode_clamps() {
        let mut actual = state(OCTAVE_MAX, OCTAVE_MAX, false);
        actual.shift(OctaveShift::Up);
        assert_eq!(state(OCTAVE_MAX, OCTAVE_MAX, false), actual);

        let mut actual = state(OCTAVE_MIN, OCTAVE_MIN, false);
        actual.shift(OctaveShift::Down);
        assert_eq!(state(OCTAVE_MIN, OCTAVE_MIN, false), actual);
    }

    #[test]
    fn split_walkthrough() {
        let mut actual = OctaveState::new();
        actual.shift(OctaveShift::Up);
        assert_eq!(state(1, 1, false), actual);

        actual.set_func_held(true);
        actual.shift(OctaveShift::Down);
        assert_eq!(state(1, 0, true), actual, "Expected left but got right");

        actual.shift(OctaveShift::Up);
        assert_eq!(state(1, 1, true), actual, "Expected left but got right");

        // clamped at the top offset
        actual.shift(OctaveShift::Up);
        assert_eq!(state(1, 1, true), actual, "Expected left but got right");
    }

    #[test]
    fn split_mode_clamps_at_min() {
        let mut actual = state(0, OCTAVE_MIN, true);
        actual.shift(OctaveShift::Down);
        assert_eq!(state(0, OCTAVE_MIN, true), actual);
    }

    #[test]
    fn leaving_split_mode_rejoins_halves() {
        let mut actual = state(1, -1, true);
        actual.set_func_held(false);
        assert_eq!(state(1, -1, false), actual, "Split persists until an octave key is pressed");

        actual.shift(OctaveShift::Down);
        assert_eq!(state(0, 0, false), actual, "Expected left but got right");
    }

    #[test]
    fn invariant_holds_for_every_sequence() {
        // every sequence of up to six events drawn from {up, down, func press, func release}
        for seed in 0..4_u32.pow(6) {
            let mut actual = OctaveState::new();
            let mut code = seed;
            for _ in 0..6 {
                match code % 4 {
                    0 => actual.shift(OctaveShift::Up),
                    1 => actual.shift(OctaveShift::Down),
                    2 => actual.set_func_held(true),
                    _ => actual.set_func_held(false),
                }
                if code % 4 < 2 && !actual.func_held() {
                    assert_eq!(actual.top_offset(), actual.bottom_offset());
                }
                assert_invariant(&actual);
                code /= 4;
            }
        }
    }

    #[test]
    fn offset_for_split_key() {
        let actual = state(1, -1, false);
        assert_eq!(1, actual.offset_for(KEY_MIDDLE_C));
        assert_eq!(1, actual.offset_for(KeyId::new(49).unwrap()));
        assert_eq!(-1, actual.offset_for(KeyId::new(24).unwrap()));
        assert_eq!(-1, actual.offset_for(KeyId::new(1).unwrap()));
    }

    #[test]
    fn indicators() {
        assert_eq!([false, true, false], state(0, 0, false).indicators());
        assert_eq!([false, false, true], state(1, 1, false).indicators());
        assert_eq!([true, false, true], state(1, -1, true).indicators());
        assert_eq!([true, true, false], state(0, -1, false).indicators());
    }
}
