//! Error types for the paranoia-core crate.
//!
//! Only restore and construction paths fail. Value changes clamp instead of
//! failing, and lookup misses resolve to documented defaults, so most of the
//! engine's surface is total.

use paranoia_types::{Identifier, IdentifierError};

/// Errors raised by table lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No hearts breakdown entry exists for the requested bucket.
    #[error("no level-change entry for light level {light_level} at hearts bucket {hearts}")]
    OutOfRange {
        /// The light level queried.
        light_level: u8,
        /// The hearts bucket queried.
        hearts: usize,
    },
}

/// Errors that can occur during sanity state operations.
#[derive(Debug, thiserror::Error)]
pub enum SanityError {
    /// A persisted record had the wrong shape or inconsistent contents.
    ///
    /// Restores that fail with this error leave the existing state untouched.
    #[error("failed to decode sanity record: {reason}")]
    Decode {
        /// Description of what was malformed.
        reason: String,
    },

    /// The immutable bounds are out of order.
    #[error("invalid sanity bounds: floor {floor} is above ceiling {ceiling}")]
    InvalidBounds {
        /// Requested floor.
        floor: i32,
        /// Requested ceiling.
        ceiling: i32,
    },

    /// A callback was registered with identical start and stop levels.
    #[error("callback {id} has identical start and stop level {level}")]
    InvalidCallbackLevels {
        /// The callback identifier.
        id: Identifier,
        /// The shared level.
        level: i32,
    },

    /// A temporary tick hook was removed but never registered.
    #[error("temporary tick hook {0} does not exist")]
    HookNotFound(Identifier),

    /// An identifier could not be built.
    #[error("invalid identifier: {source}")]
    InvalidIdentifier {
        /// The underlying parse error.
        #[from]
        source: IdentifierError,
    },
}

impl From<serde_json::Error> for SanityError {
    fn from(source: serde_json::Error) -> Self {
        Self::Decode {
            reason: source.to_string(),
        }
    }
}
