//! This crate contains architecture-agnostic logic for a split-octave keyboard controller. Key transitions scanned from
//! the key matrix are turned into a monophonic [CV/gate](https://en.wikipedia.org/wiki/CV/gate) signal pair for analog
//! synthesizers, voiced by last-key priority, and into [MIDI](https://midi.org/midi-1-0) notes sent over USB.
//!
//! Two octave keys shift the keybed up or down an octave. While the function key is held, they shift only the keys
//! below middle C, splitting the keybed across two octaves.

#![deny(missing_docs)]
#![no_std]

#[macro_use]
mod fmt;

mod error;
pub use error::Error;

pub mod configuration;
pub mod dispatcher;
pub mod io;
pub mod key;
/// Data structures for tracking which keys are held and how the keybed is shifted.
pub mod keyboard_state;
pub mod matrix;
pub mod midi;
pub mod pitch;
pub mod queue;
