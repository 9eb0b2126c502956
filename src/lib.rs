//! Raid boss encounter engine
//!
//! The cooperative "raid boss" core of a collectible-game chat bot: many
//! participants commit creature assets against a shared boss across timed
//! rounds. This crate owns round lifecycle, timer-driven auto-resolution,
//! damage/health bookkeeping, disqualification handling, and reward
//! computation. Chat parsing, rendering, inventory persistence, and
//! permission data live in the host behind the [`external`] traits.

pub mod boss;
pub mod config;
pub mod encounter;
pub mod error;
pub mod events;
pub mod external;
pub mod rewards;
pub mod roster;
pub mod round;
pub mod scheduler;
pub mod selection;
pub mod stats;

#[cfg(test)]
mod round_tests;
#[cfg(test)]
mod selection_tests;
#[cfg(test)]
mod stats_tests;

// Re-exports for convenience
pub use boss::{BossDefinition, BossImagery, load_bosses_from_dir, load_bosses_from_file};
pub use config::{RaidConfig, TierHp};
pub use encounter::{Encounter, EncounterState, RoundAction, RoundType};
pub use error::{CommandError, ErrorKind, InvariantViolation};
pub use events::RaidEvent;
pub use external::{
    AdminAction, AnnouncementSink, AssetId, AssetSnapshot, AuthorizationGate, InventoryStore,
    PlayerDirectory, PlayerId, RaidHost, StoreError, UserId,
};
pub use rewards::{ConcludePolicy, Disposition, RaidSummary, distribute, pick_winner};
pub use roster::{DamageLedgerEntry, Participant, ParticipantStatus, RosterLedger};
pub use round::{AutoFill, ResolvedRound, RoundOutcome, advance_round, resolve_round};
pub use scheduler::{DamageSummary, RaidScheduler};
pub use selection::{FallbackPick, select_fallback};
pub use stats::{EffectiveStats, resolve_stats};
