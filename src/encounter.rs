//! Encounter runtime state
//!
//! An [`Encounter`] is a plain value owned by the scheduler: it can be
//! constructed and resolved without a running event loop, which is what the
//! unit tests do. The timer handle that drives it lives on the scheduler,
//! never here.

use chrono::NaiveDateTime;

use crate::boss::BossDefinition;
use crate::config::RaidConfig;
use crate::external::{AssetId, PlayerId};
use crate::roster::RosterLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterState {
    /// Join window is open; round 1 has not started
    Joining,
    /// A round is running against its deadline
    RoundActive,
    /// Terminal; the value is dropped from the scheduler slot
    Concluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundType {
    /// Participants deal damage to the boss
    Defense,
    /// The boss deals damage; weak assets are eliminated
    Attack,
}

/// A participant's submission for the current round
#[derive(Debug, Clone)]
pub struct RoundAction {
    pub player: PlayerId,
    pub asset: AssetId,
    /// Effective attack, resolved at submission time (manual) or at the
    /// deadline (auto-selected)
    pub attack: i64,
    pub health: i64,
    pub label: String,
}

/// One full raid-boss lifecycle from start to conclusion
#[derive(Debug, Clone)]
pub struct Encounter {
    /// Scheduler generation that created this encounter; stale timer
    /// callbacks check it before touching anything
    pub generation: u64,
    pub state: EncounterState,
    pub boss: BossDefinition,
    /// Signed on purpose: the defeat check reads the raw sign, display
    /// clamps at zero
    pub hp_pool: i64,
    /// 0 until the first round starts
    pub round: u32,
    pub round_type: RoundType,
    pub round_deadline: Option<NaiveDateTime>,
    /// Damage the boss deals this round; drawn at round start for Attack
    /// rounds so the announcement can include it
    pub boss_damage: Option<i64>,
    /// Admin override for Attack-round damage draws, sticky for the
    /// encounter
    pub forced_attack_damage: Option<i64>,
    pub roster: RosterLedger,
    /// Current-round actions in submission order
    actions: Vec<RoundAction>,
}

impl Encounter {
    /// Fresh encounter in the join phase, HP computed for a roster of one
    pub fn new(generation: u64, boss: BossDefinition, config: &RaidConfig) -> Self {
        let hp_pool = config.hp_pool(boss.tier, 1);
        Self {
            generation,
            state: EncounterState::Joining,
            boss,
            hp_pool,
            round: 0,
            round_type: RoundType::Defense,
            round_deadline: None,
            boss_damage: None,
            forced_attack_damage: None,
            roster: RosterLedger::new(),
            actions: Vec::new(),
        }
    }

    /// Recompute the HP pool from the current roster size.
    ///
    /// Called only from the join paths; round resolution is the only other
    /// place `hp_pool` changes.
    pub fn recompute_hp(&mut self, config: &RaidConfig) {
        if self.state == EncounterState::Concluded {
            return;
        }
        let roster_len = self.roster.active_len().max(1);
        self.hp_pool = config.hp_pool(self.boss.tier, roster_len);
    }

    /// HP clamped at zero for display; the defeat check uses the raw value
    pub fn hp_display(&self) -> i64 {
        self.hp_pool.max(0)
    }

    /// Record a submission for the current round, replacing any prior one
    /// from the same participant in place.
    pub fn submit_action(&mut self, action: RoundAction) {
        match self.actions.iter_mut().find(|a| a.player == action.player) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    pub fn has_action(&self, player: PlayerId) -> bool {
        self.actions.iter().any(|a| a.player == player)
    }

    pub fn actions(&self) -> &[RoundAction] {
        &self.actions
    }

    /// Advance into the next round: bump the counter, install the round
    /// type and pre-drawn boss damage, and clear the action set.
    pub fn begin_round(
        &mut self,
        round_type: RoundType,
        boss_damage: Option<i64>,
        deadline: NaiveDateTime,
    ) {
        self.round += 1;
        self.state = EncounterState::RoundActive;
        self.round_type = round_type;
        self.boss_damage = boss_damage;
        self.round_deadline = Some(deadline);
        self.actions.clear();
    }

    /// Invalidate the deadline; paired with timer cancellation
    pub fn clear_deadline(&mut self) {
        self.round_deadline = None;
    }

    pub(crate) fn take_actions(&mut self) -> Vec<RoundAction> {
        std::mem::take(&mut self.actions)
    }
}
