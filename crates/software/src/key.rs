//! Identifiers and events for the physical keys scanned from the key matrix.
//!
//! Every switch in the matrix has a [`KeyId`]. Most of them belong to the keybed; the remaining three are control keys
//! which shift octaves or modify how the octave keys behave.

use crate::{Error, keyboard_state::OctaveShift};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// Number of keys on the keybed, C to C across four octaves.
pub const KEYBED_KEY_CNT: u8 = 49;

/// The first key of the upper half of the keybed; keys from here up use the top octave offset.
pub const KEY_MIDDLE_C: KeyId = KeyId(25);

/// Largest identifier a valid key may carry.
pub const MAX_KEY: u8 = 52;

/// Raw identifier meaning "no key"; rejected by [`KeyId::new`].
pub const KEY_NONE: u16 = 0;

/// Identifier of a single key, validated to lie in `1..=MAX_KEY`.
///
/// Identifiers are one-based: zero is reserved for the [`KEY_NONE`] sentinel, which never names a real key. Every
/// `KeyId` in existence names a real key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyId(u8);

impl KeyId {
    /// Lowers the octave, or the bottom octave while the function key is held.
    pub const OCTAVE_DOWN: Self = Self(KEYBED_KEY_CNT + 1);
    /// Raises the octave, or the bottom octave while the function key is held.
    pub const OCTAVE_UP: Self = Self(KEYBED_KEY_CNT + 2);
    /// Modifier which puts the octave keys into split mode while held.
    pub const FUNCTION: Self = Self(KEYBED_KEY_CNT + 3);

    /// Validates a raw identifier as reported by the scanner.
    pub fn new(raw: u16) -> Result<Self, Error> {
        match u8::try_from(raw) {
            Ok(id) if raw != KEY_NONE && id <= MAX_KEY => Ok(Self(id)),
            _ => Err(Error::InvalidKeyId(raw)),
        }
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Classifies the key by the role it plays.
    pub fn kind(self) -> KeyKind {
        match self {
            Self::OCTAVE_DOWN => KeyKind::Octave(OctaveShift::Down),
            Self::OCTAVE_UP => KeyKind::Octave(OctaveShift::Up),
            Self::FUNCTION => KeyKind::Function,
            _ => KeyKind::Keybed,
        }
    }
}

/// The role a key plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyKind {
    /// An ordinary musical key.
    Keybed,
    /// One of the two octave-control keys.
    Octave(OctaveShift),
    /// The modifier key.
    Function,
}

/// Whether a key went down or came up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// The key was released.
    Released = 0,
    /// The key was pressed.
    Pressed = 1,
}

/// A single key transition as reported by the scanner.
///
/// The key is carried unvalidated; the consumer is responsible for rejecting identifiers that don't name a real key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// Direction of the transition.
    pub action: KeyAction,
    /// Raw identifier of the key that changed.
    pub key: u16,
}

impl KeyEvent {
    /// Constructs a press event.
    pub fn pressed(key: u16) -> Self {
        Self {
            action: KeyAction::Pressed,
            key,
        }
    }

    /// Constructs a release event.
    pub fn released(key: u16) -> Self {
        Self {
            action: KeyAction::Released,
            key,
        }
    }

    /// Packs the event into a single word for the event queue.
    pub fn pack(self) -> PackedKeyEvent {
        PackedKeyEvent((self.action as u32) << 16 | u32::from(self.key))
    }
}

/// A [`KeyEvent`] packed into one word: the action code in the upper half, the key in the lower half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PackedKeyEvent(u32);

impl PackedKeyEvent {
    /// Wraps a raw word, e.g. one received from another core.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw word.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Recovers the [`KeyEvent`], failing if the action code is unknown.
    pub fn unpack(self) -> Result<KeyEvent, Error> {
        let code = (self.0 >> 16) as u16;
        let action = KeyAction::from_u16(code).ok_or(Error::InvalidKeyAction(code))?;
        Ok(KeyEvent {
            action,
            key: self.0 as u16,
        })
    }
}
