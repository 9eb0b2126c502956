//! Runtime configuration
//!
//! All gameplay tunables live here: phase timing, stat caps, boss HP
//! scaling, the attack damage range, and reward counts. Loaded from the
//! platform config directory via confy; every field has a serde default so
//! old config files keep working when fields are added.

use serde::{Deserialize, Serialize};

/// Per-tier base HP override
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierHp {
    pub tier: u8,
    pub hp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidConfig {
    /// Seconds the join window stays open before round 1 starts
    #[serde(default = "default_join_window")]
    pub join_window_secs: u64,

    /// Seconds participants have to submit an action each round
    #[serde(default = "default_round")]
    pub round_secs: u64,

    /// Pause between a round ending and the next one being announced
    #[serde(default = "default_pause")]
    pub interround_pause_secs: u64,

    /// Base stats are clamped to `[0, max_stat]` before bonuses apply
    #[serde(default = "default_max_stat")]
    pub max_stat: i64,

    /// Boss HP before tier overrides and per-participant scaling
    #[serde(default = "default_base_hp")]
    pub base_hp: i64,

    /// Per-tier replacements for `base_hp`
    #[serde(default = "default_tier_hp")]
    pub tier_hp: Vec<TierHp>,

    /// HP added per active participant
    #[serde(default = "default_per_participant_hp")]
    pub per_participant_hp: i64,

    /// Attack-round damage is drawn from `[damage_min, damage_max)` in
    /// increments of `damage_step`, unless an admin override is set
    #[serde(default = "default_damage_min")]
    pub damage_min: i64,

    #[serde(default = "default_damage_max")]
    pub damage_max: i64,

    #[serde(default = "default_damage_step")]
    pub damage_step: i64,

    /// How many runners-up receive a standard reward on victory
    #[serde(default = "default_standard_rewards")]
    pub standard_reward_count: usize,

    /// Leaderboard length in the conclusion summary
    #[serde(default = "default_leaderboard")]
    pub leaderboard_len: usize,

    /// Whether participants may join after round 1 has started
    #[serde(default)]
    pub allow_midfight_join: bool,
}

fn default_join_window() -> u64 {
    300
}
fn default_round() -> u64 {
    20
}
fn default_pause() -> u64 {
    10
}
fn default_max_stat() -> i64 {
    100_000
}
fn default_base_hp() -> i64 {
    50_000
}
fn default_tier_hp() -> Vec<TierHp> {
    vec![TierHp {
        tier: 1,
        hp: 70_000,
    }]
}
fn default_per_participant_hp() -> i64 {
    40_000
}
fn default_damage_min() -> i64 {
    6_000
}
fn default_damage_max() -> i64 {
    7_000
}
fn default_damage_step() -> i64 {
    100
}
fn default_standard_rewards() -> usize {
    3
}
fn default_leaderboard() -> usize {
    5
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            join_window_secs: default_join_window(),
            round_secs: default_round(),
            interround_pause_secs: default_pause(),
            max_stat: default_max_stat(),
            base_hp: default_base_hp(),
            tier_hp: default_tier_hp(),
            per_participant_hp: default_per_participant_hp(),
            damage_min: default_damage_min(),
            damage_max: default_damage_max(),
            damage_step: default_damage_step(),
            standard_reward_count: default_standard_rewards(),
            leaderboard_len: default_leaderboard(),
            allow_midfight_join: false,
        }
    }
}

impl RaidConfig {
    pub fn load() -> Self {
        confy::load("raidboss", None).unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("raidboss", None, self)
    }

    /// Boss HP for a tier and roster size
    pub fn hp_pool(&self, tier: u8, roster_len: usize) -> i64 {
        let base = self
            .tier_hp
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.hp)
            .unwrap_or(self.base_hp);
        base + self.per_participant_hp * roster_len as i64
    }
}
