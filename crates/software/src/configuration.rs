//! This module contains settings which tune the behavior of the keyboard. They are fixed when the firmware is built
//! and handed to the relevant constructors at startup.

/// Determines what happens when a key that is already held is reported as pressed again.
///
/// The scanner shouldn't report a second press without an intervening release, but a bouncing switch or a dropped
/// release event can cause it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DuplicatePress {
    /// The key becomes the most recent press, as though it had been released and pressed again. If the key was buried
    /// under later presses, it takes over the voice.
    #[default]
    MoveToTop,
    /// The repeated press is dropped and the key keeps its place in the press order.
    Ignore,
}
