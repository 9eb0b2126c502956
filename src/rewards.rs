//! Reward distribution and conclusion summaries
//!
//! On victory the last-hitter receives the distinguished boss-tagged reward
//! and the top damage dealers receive standard rewards. Forced conclusions
//! pick a winner by policy. Reward grants are collaborator calls made after
//! the encounter has already left the scheduler slot, so a failed grant is
//! reported in the summary without corrupting anything.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::RaidConfig;
use crate::encounter::Encounter;
use crate::external::{InventoryStore, PlayerId};
use crate::roster::ParticipantStatus;

/// Winner policy for an administrative conclusion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcludePolicy {
    /// Random among still-active damage dealers
    Random,
    /// Highest total among still-active damage dealers
    HighestDamage,
    LastHitter,
    /// No winner, summary only
    None,
}

/// How the encounter ended, for distribution purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Victory,
    Defeat,
    /// Administrative conclusion with a pre-picked winner
    Forced { winner: Option<PlayerId> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub player: PlayerId,
    pub name: String,
    pub total: i64,
    /// Eliminated or disqualified before the end
    pub out: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardGrant {
    pub player: PlayerId,
    pub name: String,
    pub distinguished: bool,
}

/// Conclusion summary handed to the announcement sink (and the caller of a
/// forced conclusion)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidSummary {
    pub boss_name: String,
    pub rounds: u32,
    pub victory: bool,
    pub leaderboard: Vec<LeaderboardRow>,
    pub granted: Vec<RewardGrant>,
    /// Human-readable grant failures; never fatal
    pub failures: Vec<String>,
}

/// Pick the winner for a forced conclusion.
///
/// Random and HighestDamage consider only damage dealers still on the
/// active roster; LastHitter may name an eliminated participant.
pub fn pick_winner(
    enc: &Encounter,
    policy: ConcludePolicy,
    rng: &mut impl Rng,
) -> Option<PlayerId> {
    match policy {
        ConcludePolicy::None => None,
        ConcludePolicy::LastHitter => enc.roster.last_hitter(),
        ConcludePolicy::HighestDamage => enc
            .roster
            .damage_totals()
            .into_iter()
            .find(|(player, _)| enc.roster.is_active(*player))
            .map(|(player, _)| player),
        ConcludePolicy::Random => {
            let dealers: Vec<PlayerId> = enc
                .roster
                .damage_totals()
                .into_iter()
                .map(|(player, _)| player)
                .filter(|player| enc.roster.is_active(*player))
                .collect();
            if dealers.is_empty() {
                None
            } else {
                Some(dealers[rng.gen_range(0..dealers.len())])
            }
        }
    }
}

/// Rank participants and grant rewards according to the disposition
pub async fn distribute<H: InventoryStore>(
    host: &H,
    enc: &Encounter,
    disposition: Disposition,
    config: &RaidConfig,
) -> RaidSummary {
    let mut summary = RaidSummary {
        boss_name: enc.boss.name.clone(),
        rounds: enc.round,
        victory: matches!(disposition, Disposition::Victory),
        leaderboard: build_leaderboard(enc, config),
        granted: Vec::new(),
        failures: Vec::new(),
    };

    let mut grants: Vec<(PlayerId, bool)> = Vec::new();
    match disposition {
        Disposition::Victory => {
            let last_hitter = enc.roster.last_hitter();
            if let Some(player) = last_hitter {
                grants.push((player, true));
            }
            // Top slots by damage; the last-hitter keeps their distinguished
            // reward instead of doubling up.
            for (player, _) in enc
                .roster
                .damage_totals()
                .into_iter()
                .take(config.standard_reward_count)
            {
                if last_hitter == Some(player) {
                    continue;
                }
                grants.push((player, false));
            }
        }
        Disposition::Forced { winner: Some(player) } => grants.push((player, true)),
        Disposition::Defeat | Disposition::Forced { winner: None } => {}
    }

    for (player, distinguished) in grants {
        let name = participant_name(enc, player);
        match host.create_asset(player, &enc.boss.id, distinguished).await {
            Ok(asset) => {
                info!(player, asset, distinguished, boss = %enc.boss.id, "reward granted");
                summary.granted.push(RewardGrant {
                    player,
                    name,
                    distinguished,
                });
            }
            Err(err) => {
                error!(player, %err, "reward grant failed");
                summary.failures.push(format!("{name}: {err}"));
            }
        }
    }

    summary
}

fn build_leaderboard(enc: &Encounter, config: &RaidConfig) -> Vec<LeaderboardRow> {
    enc.roster
        .damage_totals()
        .into_iter()
        .take(config.leaderboard_len)
        .map(|(player, total)| LeaderboardRow {
            player,
            name: participant_name(enc, player),
            total,
            out: enc
                .roster
                .participant(player)
                .is_none_or(|p| p.status != ParticipantStatus::Active),
        })
        .collect()
}

fn participant_name(enc: &Encounter, player: PlayerId) -> String {
    enc.roster
        .participant(player)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("player {player}"))
}

impl RaidSummary {
    pub fn render(&self) -> String {
        let mut text = format!("{} — the battle has concluded\n", self.boss_name);
        if self.victory {
            text.push_str("The boss has been defeated!\n");
        }

        if !self.leaderboard.is_empty() {
            text.push_str("The following players dealt the most damage:\n");
            for (i, row) in self.leaderboard.iter().enumerate() {
                let marker = if row.out { " [out]" } else { "" };
                text.push_str(&format!("{}. {}{}: {}\n", i + 1, row.name, marker, row.total));
            }
        }

        for grant in &self.granted {
            if grant.distinguished {
                text.push_str(&format!("{} received the boss reward!\n", grant.name));
            } else {
                text.push_str(&format!("{} received a standard reward!\n", grant.name));
            }
        }

        for failure in &self.failures {
            text.push_str(&format!("reward could not be granted — {failure}\n"));
        }

        text
    }
}
