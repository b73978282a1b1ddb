use crate::{configuration::DuplicatePress, key::KeyId, pitch};
use measurements::Voltage;

mod octave;
pub use octave::*;

mod priority_stack;
pub use priority_stack::*;

/// Everything the keyboard remembers between events: which keys are held and how far each half of the keybed is
/// shifted.
///
/// The sounding voice isn't stored; it is derived from the most recent held key and the octave offsets whenever it is
/// needed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardState {
    /// Keybed keys currently held, in press order.
    pub held_keys: PriorityStack,
    /// Octave offsets and function-key state.
    pub octave: OctaveState,
}

impl KeyboardState {
    /// Constructs a `KeyboardState` with no keys held and no octave shift.
    pub fn new(duplicate_press: DuplicatePress) -> Self {
        Self {
            held_keys: PriorityStack::new(duplicate_press),
            octave: OctaveState::new(),
        }
    }

    /// Returns the key that should sound, if any.
    pub fn voiced_key(&self) -> Option<KeyId> {
        self.held_keys.peek_top()
    }

    /// Returns the control voltage for the key that should sound, if any.
    pub fn voice(&self) -> Option<Voltage> {
        self.voiced_key()
            .map(|key| pitch::key_to_voltage(key, &self.octave))
    }
}
