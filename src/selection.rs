//! Auto-selection fallback policy
//!
//! Participants who miss a round deadline get an action picked for them:
//! the strongest eligible asset they have not already deployed this
//! encounter. Attack rounds rank by effective health (survival), Defense
//! rounds by effective attack (damage). An empty candidate set means the
//! caller eliminates the participant outright.

use hashbrown::HashSet;
use std::cmp::Reverse;

use crate::config::RaidConfig;
use crate::encounter::RoundType;
use crate::external::{AssetId, AssetSnapshot};
use crate::stats::{EffectiveStats, resolve_stats};

/// The asset chosen for an idle participant, stats already resolved
#[derive(Debug, Clone)]
pub struct FallbackPick {
    pub asset: AssetId,
    pub stats: EffectiveStats,
    pub label: String,
}

/// Pick the best unused asset for the round type, or `None` if the
/// participant has nothing left to deploy.
///
/// Ties break toward the lower asset id so repeated runs are deterministic.
pub fn select_fallback(
    assets: &[AssetSnapshot],
    round_type: RoundType,
    used: &HashSet<AssetId>,
    config: &RaidConfig,
) -> Option<FallbackPick> {
    assets
        .iter()
        .filter(|a| a.tradeable && !used.contains(&a.id))
        .map(|a| {
            let stats = resolve_stats(a.base_attack, a.base_health, &a.tags, config);
            (a, stats)
        })
        .max_by_key(|(a, stats)| {
            let rank = match round_type {
                RoundType::Attack => stats.health,
                RoundType::Defense => stats.attack,
            };
            (rank, Reverse(a.id))
        })
        .map(|(a, stats)| FallbackPick {
            asset: a.id,
            stats,
            label: a.label.clone(),
        })
}
