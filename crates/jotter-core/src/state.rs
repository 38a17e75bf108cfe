//! Shared view state types.

use serde::{Deserialize, Serialize};

/// Encryption toggle state machine.
///
/// `Plain -> Encrypting -> Encrypted -> Decrypting -> Plain`; a failed pass
/// falls back to the stable state it started from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionState {
    #[default]
    Plain,
    Encrypting,
    Encrypted,
    Decrypting,
}

impl EncryptionState {
    /// Stable state for a persisted `encrypted` setting
    pub const fn stable(encrypted: bool) -> Self {
        if encrypted {
            Self::Encrypted
        } else {
            Self::Plain
        }
    }

    /// Transitional state entered when moving towards `encrypted`
    pub const fn transition_to(encrypted: bool) -> Self {
        if encrypted {
            Self::Encrypting
        } else {
            Self::Decrypting
        }
    }

    /// Whether a bulk pass is running
    pub const fn is_crypting(self) -> bool {
        matches!(self, Self::Encrypting | Self::Decrypting)
    }

    /// The encryption state being held or moved towards.
    ///
    /// This is what the settings toggle shows, and the policy for new writes.
    pub const fn target(self) -> bool {
        matches!(self, Self::Encrypting | Self::Encrypted)
    }
}
