//! Error types for encounter commands
//!
//! Caller-facing failures are split into four kinds:
//! - validation: bad input, no state change
//! - state conflict: the command is not legal in the current phase
//! - resource unavailable: a collaborator lookup failed
//! - internal: an engine invariant was violated (fatal to the encounter)

use thiserror::Error;

use crate::external::{AdminAction, StoreError};

/// Errors returned by the caller-facing command surface
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("there is already an ongoing boss battle")]
    AlreadyActive,

    #[error("no boss battle is currently running")]
    NoActiveEncounter,

    #[error("the boss battle is not accepting joins")]
    NotJoinable,

    #[error("you have already joined the boss battle")]
    AlreadyJoined,

    #[error("you have been disqualified from this battle")]
    Disqualified,

    #[error("you are not part of this battle")]
    NotInBattle,

    #[error("actions can only be submitted during an active round")]
    NoActiveRound,

    #[error("asset {0} is not in your eligible inventory")]
    IneligibleAsset(i64),

    #[error("asset {0} has already been deployed this battle")]
    AssetAlreadyUsed(i64),

    #[error("attack damage {amount} is outside the allowed range {min}..={max}")]
    DamageOutOfRange { amount: i64, min: i64, max: i64 },

    #[error("not authorized for {0:?}")]
    Unauthorized(AdminAction),

    #[error("inventory lookup failed")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Coarse error taxonomy, for hosts that map errors to user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    ResourceUnavailable,
    Internal,
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IneligibleAsset(_)
            | Self::AssetAlreadyUsed(_)
            | Self::DamageOutOfRange { .. }
            | Self::Unauthorized(_) => ErrorKind::Validation,
            Self::AlreadyActive
            | Self::NoActiveEncounter
            | Self::NotJoinable
            | Self::AlreadyJoined
            | Self::Disqualified
            | Self::NotInBattle
            | Self::NoActiveRound => ErrorKind::StateConflict,
            Self::Store(_) => ErrorKind::ResourceUnavailable,
            Self::Invariant(_) => ErrorKind::Internal,
        }
    }
}

/// Engine invariant violations
///
/// These are fatal to the running encounter: the scheduler logs them, aborts
/// any live timer, and resets the slot rather than continuing with
/// inconsistent state.
#[derive(Debug, Error)]
pub enum InvariantViolation {
    #[error("a second live round timer was detected")]
    DuplicateTimer,

    #[error("a round timer was live outside of an active round")]
    TimerWithoutRound,

    #[error("an active round has no live timer")]
    MissingTimer,
}
