//! Effective stat resolution
//!
//! Base stats come from client-supplied asset records, so they are clamped
//! to the configured range before anything else. A single tag bonus may then
//! apply on top: the table is ranked, the best-ranked tag present on the
//! asset wins, and bonuses never stack. Unknown tags contribute nothing, so
//! resolution is total.

use phf::phf_map;

use crate::config::RaidConfig;

/// Flat additive bonus granted by a special tag
#[derive(Debug, Clone, Copy)]
pub struct TagBonus {
    /// Lower rank wins when an asset carries several bonus tags
    pub rank: u8,
    pub attack: i64,
    pub health: i64,
}

/// Bonus table, keyed by asset tag
static TAG_BONUSES: phf::Map<&'static str, TagBonus> = phf_map! {
    "shiny" => TagBonus { rank: 0, attack: 2_000, health: 2_000 },
    "christmas" => TagBonus { rank: 1, attack: 500, health: 500 },
    "mythic" => TagBonus { rank: 2, attack: 3_000, health: 3_000 },
    "boss" => TagBonus { rank: 3, attack: 4_000, health: 4_000 },
};

/// Clamped, bonus-adjusted stats for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveStats {
    pub attack: i64,
    pub health: i64,
}

/// Resolve an asset's effective stats
pub fn resolve_stats<S: AsRef<str>>(
    base_attack: i64,
    base_health: i64,
    tags: &[S],
    config: &RaidConfig,
) -> EffectiveStats {
    let mut attack = base_attack.clamp(0, config.max_stat);
    let mut health = base_health.clamp(0, config.max_stat);

    if let Some(bonus) = best_bonus(tags) {
        attack += bonus.attack;
        health += bonus.health;
    }

    EffectiveStats { attack, health }
}

fn best_bonus<S: AsRef<str>>(tags: &[S]) -> Option<TagBonus> {
    tags.iter()
        .filter_map(|tag| TAG_BONUSES.get(tag.as_ref()).copied())
        .min_by_key(|bonus| bonus.rank)
}
