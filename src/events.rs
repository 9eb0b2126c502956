//! Announcement events
//!
//! Everything the engine wants the outside world to hear, as typed values.
//! The scheduler renders these to text and hands them to the announcement
//! sink; hosts that want richer formatting can match on the variants
//! instead.

use crate::encounter::RoundType;
use crate::round::{ResolvedRound, RoundOutcome};

#[derive(Debug, Clone)]
pub enum RaidEvent {
    /// The join window just opened
    BattleOpened { boss: String },

    /// A round was announced; participants may submit until the deadline
    RoundOpened {
        round: u32,
        boss: String,
        round_type: RoundType,
        /// Announced damage for Attack rounds
        boss_damage: Option<i64>,
    },

    /// A round resolved; includes the per-participant report
    RoundResolved { boss: String, resolved: ResolvedRound },
}

impl RaidEvent {
    pub fn render(&self) -> String {
        match self {
            Self::BattleOpened { boss } => {
                format!("A boss battle against {boss} has begun! Join now!")
            }
            // The drawn damage is not revealed until the round resolves
            Self::RoundOpened {
                round,
                boss,
                round_type,
                ..
            } => match round_type {
                RoundType::Defense => {
                    format!("Round {round}\n{boss} is preparing to defend!")
                }
                RoundType::Attack => {
                    format!("Round {round}\n{boss} is preparing to attack!")
                }
            },
            Self::RoundResolved { boss, resolved } => {
                let mut text = render_round_header(boss, resolved);
                if !resolved.report.is_empty() {
                    text.push('\n');
                    text.push_str(&resolved.report.join("\n"));
                }
                text
            }
        }
    }
}

fn render_round_header(boss: &str, resolved: &ResolvedRound) -> String {
    match (resolved.round_type, resolved.outcome) {
        (_, RoundOutcome::Victory) => {
            format!(
                "Round {} has ended\n{boss} has been defeated!",
                resolved.round
            )
        }
        (RoundType::Attack, RoundOutcome::Defeat) => {
            format!(
                "Round {} has ended\n{boss} dealt {} damage!\n{boss} has won!",
                resolved.round,
                resolved.boss_damage.unwrap_or_default()
            )
        }
        (_, RoundOutcome::Defeat) => {
            format!("Round {} has ended\n{boss} has won!", resolved.round)
        }
        (RoundType::Attack, RoundOutcome::Continue) => {
            format!(
                "Round {} has ended\n{boss} dealt {} damage!",
                resolved.round,
                resolved.boss_damage.unwrap_or_default()
            )
        }
        (RoundType::Defense, RoundOutcome::Continue) => {
            format!(
                "Round {} is over, {} HP remaining",
                resolved.round, resolved.hp_remaining
            )
        }
    }
}
