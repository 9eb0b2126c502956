//! Round resolution state machine
//!
//! `resolve_round` applies one full round as a batch: merge auto-filled
//! actions, apply damage or eliminations, then run the terminal check. No
//! partial round is ever observable; callers see state before the batch or
//! after it. `advance_round` moves a surviving encounter into its next
//! round.
//!
//! Per-participant problems (no eligible asset, missing records) are
//! isolated: the participant is eliminated or skipped and the batch
//! continues.

use chrono::NaiveDateTime;
use rand::Rng;
use tracing::info;

use crate::config::RaidConfig;
use crate::encounter::{Encounter, EncounterState, RoundAction, RoundType};
use crate::external::PlayerId;

/// Where the encounter stands after a resolved round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Boss and roster both alive; schedule the next round
    Continue,
    /// Boss HP reached zero
    Victory,
    /// No active participants remain
    Defeat,
}

/// Result of one resolved round, for announcements and scheduling
#[derive(Debug, Clone)]
pub struct ResolvedRound {
    pub round: u32,
    pub round_type: RoundType,
    pub outcome: RoundOutcome,
    /// Damage the boss dealt (Attack rounds only)
    pub boss_damage: Option<i64>,
    /// Display-clamped HP after the round
    pub hp_remaining: i64,
    /// Per-participant report lines, in resolution order
    pub report: Vec<String>,
}

/// Deadline fallback for one participant who did not submit
#[derive(Debug, Clone)]
pub struct AutoFill {
    pub player: PlayerId,
    /// `None` means no eligible asset was found; the participant is
    /// eliminated without touching HP or the ledger
    pub action: Option<RoundAction>,
}

/// Resolve the current round as a single batch.
///
/// Returns `None` when the encounter is not in an active round — a stale
/// timer callback racing a manual conclusion lands here and must be a no-op.
pub fn resolve_round(enc: &mut Encounter, auto_fills: Vec<AutoFill>) -> Option<ResolvedRound> {
    if enc.state != EncounterState::RoundActive {
        return None;
    }

    let round = enc.round;
    let round_type = enc.round_type;
    let mut report = Vec::new();

    // Merge the deadline fallbacks into the submitted action set. A
    // participant with nothing to deploy is eliminated on the spot.
    for fill in auto_fills {
        match fill.action {
            Some(action) => enc.submit_action(action),
            None => {
                let name = display_name(enc, fill.player);
                enc.roster.eliminate(fill.player);
                report.push(format!("{name} had no eligible creatures and fell!"));
            }
        }
    }

    // Only active participants resolve; a submission from someone
    // disqualified mid-round is dropped here.
    let actions: Vec<RoundAction> = enc
        .take_actions()
        .into_iter()
        .filter(|a| enc.roster.is_active(a.player))
        .collect();
    for action in &actions {
        enc.roster.mark_asset_used(action.player, action.asset);
    }

    match round_type {
        RoundType::Defense => {
            for action in &actions {
                let name = display_name(enc, action.player);
                let hp_before = enc.hp_pool;
                enc.hp_pool -= action.attack;
                enc.roster
                    .record_damage(action.player, action.attack, round, action.label.clone());
                report.push(format!(
                    "{name}'s {} dealt {} damage!",
                    action.label, action.attack
                ));
                if hp_before > 0 && enc.hp_pool <= 0 {
                    enc.roster.set_last_hitter(action.player);
                }
            }
        }
        RoundType::Attack => {
            let boss_damage = enc.boss_damage.unwrap_or_default();
            for action in &actions {
                let name = display_name(enc, action.player);
                if action.health <= boss_damage {
                    enc.roster.eliminate(action.player);
                    report.push(format!(
                        "{name}'s {} had {} HP and fell!",
                        action.label, action.health
                    ));
                } else {
                    report.push(format!(
                        "{name}'s {} had {} HP and survived!",
                        action.label, action.health
                    ));
                }
            }
        }
    }

    // Terminal check runs strictly after the whole batch. The defeat check
    // reads the raw (unclamped) HP sign.
    let outcome = if enc.hp_pool <= 0 {
        enc.state = EncounterState::Concluded;
        RoundOutcome::Victory
    } else if enc.roster.active_len() == 0 {
        enc.state = EncounterState::Concluded;
        RoundOutcome::Defeat
    } else {
        RoundOutcome::Continue
    };

    if outcome != RoundOutcome::Continue {
        enc.clear_deadline();
    }

    info!(
        round,
        ?round_type,
        ?outcome,
        hp = enc.hp_display(),
        active = enc.roster.active_len(),
        "round resolved"
    );

    Some(ResolvedRound {
        round,
        round_type,
        outcome,
        boss_damage: enc.boss_damage,
        hp_remaining: enc.hp_display(),
        report,
    })
}

/// Move a surviving encounter into its next round.
///
/// Round 1 is always Defense; later rounds flip a coin. Attack rounds draw
/// the boss damage up front (admin override wins) so the announcement can
/// name it.
pub fn advance_round(
    enc: &mut Encounter,
    rng: &mut impl Rng,
    config: &RaidConfig,
    deadline: NaiveDateTime,
) {
    let round_type = if enc.round == 0 {
        RoundType::Defense
    } else if rng.gen_bool(0.5) {
        RoundType::Attack
    } else {
        RoundType::Defense
    };

    let boss_damage = match round_type {
        RoundType::Attack => Some(
            enc.forced_attack_damage
                .unwrap_or_else(|| draw_boss_damage(rng, config)),
        ),
        RoundType::Defense => None,
    };

    enc.begin_round(round_type, boss_damage, deadline);
}

/// Draw boss damage from the configured range, stepped
fn draw_boss_damage(rng: &mut impl Rng, config: &RaidConfig) -> i64 {
    let step = config.damage_step.max(1);
    let steps = ((config.damage_max - config.damage_min) / step).max(1);
    config.damage_min + step * rng.gen_range(0..steps)
}

fn display_name(enc: &Encounter, player: PlayerId) -> String {
    enc.roster
        .participant(player)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| format!("player {player}"))
}
