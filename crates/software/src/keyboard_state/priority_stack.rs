//! Provides a struct [`PriorityStack`] for tracking the keys currently held, in the order they were pressed. The
//! most recent press is the one that sounds ("last-key priority"); releasing it hands the voice back to the most
//! recent press still held.

use crate::{
    configuration::DuplicatePress,
    key::{KEY_MIDDLE_C, KeyId},
    matrix::MATRIX_KEY_CNT,
};
use tinyvec::{ArrayVec, array_vec};

/// Storage for one held key. `ArrayVec` fills its unused slots with `Default` values, which are never read.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Slot(KeyId);

impl Default for Slot {
    fn default() -> Self {
        Self(KEY_MIDDLE_C)
    }
}

/// A struct for tracking held keys in press order, most recent last.
///
/// A key appears at most once. The default capacity allows every switch in the matrix to be held at the same time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriorityStack<const N: usize = MATRIX_KEY_CNT> {
    data: ArrayVec<[Slot; N]>,
    duplicate_press: DuplicatePress,
}

impl Default for PriorityStack {
    fn default() -> Self {
        Self::new(DuplicatePress::default())
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for PriorityStack<N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "PriorityStack {{ data: [");
        for (i, key) in self.data.iter().enumerate() {
            if i == 0 {
                defmt::write!(fmt, " ");
            } else {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{}", key.0.get());
        }
        defmt::write!(fmt, " ] }}");
    }
}

impl<const N: usize> PriorityStack<N> {
    /// Constructs an empty `PriorityStack`.
    pub fn new(duplicate_press: DuplicatePress) -> Self {
        Self {
            data: array_vec!(),
            duplicate_press,
        }
    }

    /// Records a press, making `key` the most recent entry.
    ///
    /// A key which is already held is handled per the [`DuplicatePress`] policy. A press that would exceed the
    /// capacity is ignored.
    pub fn push(&mut self, key: KeyId) {
        if let Some(position) = self.position(key) {
            match self.duplicate_press {
                DuplicatePress::Ignore => return,
                DuplicatePress::MoveToTop => {
                    self.data.remove(position);
                }
            }
        } else if self.data.len() == self.data.capacity() {
            warn!("Priority stack is full, ignoring press of key {}", key.get());
            return;
        }

        self.data.push(Slot(key));
    }

    /// Records a release, removing `key` wherever it sits in the press order.
    ///
    /// Returns `true` if `key` was the most recent entry, i.e. the key that was sounding. Returns `false` if it was
    /// buried under later presses or wasn't held at all; either way the sounding key is unaffected.
    pub fn pop(&mut self, key: KeyId) -> bool {
        match self.position(key) {
            Some(position) => {
                let was_top = position + 1 == self.data.len();
                self.data.remove(position);
                was_top
            }
            None => false,
        }
    }

    /// Returns the most recently pressed key that is still held.
    pub fn peek_top(&self) -> Option<KeyId> {
        self.data.last().map(|slot| slot.0)
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Determine if any keys are held.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns an [`Iterator`] over the held keys, earliest press first.
    pub fn iter(&self) -> impl Iterator<Item = KeyId> {
        self.data.iter().map(|slot| slot.0)
    }

    fn position(&self, key: KeyId) -> Option<usize> {
        self.data.iter().position(|slot| slot.0 == key)
    }
}
