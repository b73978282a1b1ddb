use core::fmt;

/// Conditions under which an incoming event cannot be processed.
///
/// None of these are fatal; the offending event is logged and discarded without touching any state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The key identifier is the [`KEY_NONE`][crate::key::KEY_NONE] sentinel or lies beyond the highest known key.
    InvalidKeyId(u16),
    /// A packed event carried an action code other than pressed or released.
    InvalidKeyAction(u16),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyId(id) => write!(f, "invalid key id: {id}"),
            Self::InvalidKeyAction(code) => write!(f, "invalid key action code: {code}"),
        }
    }
}

impl core::error::Error for Error {}
