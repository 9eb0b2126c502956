//! Tests for the auto-selection fallback policy

use hashbrown::HashSet;

use crate::config::RaidConfig;
use crate::encounter::RoundType;
use crate::external::AssetSnapshot;
use crate::selection::select_fallback;

fn asset(id: i64, attack: i64, health: i64) -> AssetSnapshot {
    AssetSnapshot {
        id,
        base_attack: attack,
        base_health: health,
        tags: Vec::new(),
        label: format!("asset-{id}"),
        tradeable: true,
    }
}

fn tagged(id: i64, attack: i64, health: i64, tag: &str) -> AssetSnapshot {
    AssetSnapshot {
        tags: vec![tag.to_string()],
        ..asset(id, attack, health)
    }
}

#[test]
fn test_defense_round_picks_highest_attack() {
    let assets = vec![asset(1, 4_000, 9_000), asset(2, 7_000, 1_000)];
    let pick = select_fallback(
        &assets,
        RoundType::Defense,
        &HashSet::new(),
        &RaidConfig::default(),
    )
    .unwrap();
    assert_eq!(pick.asset, 2);
    assert_eq!(pick.stats.attack, 7_000);
}

#[test]
fn test_attack_round_picks_highest_health() {
    let assets = vec![asset(1, 4_000, 9_000), asset(2, 7_000, 1_000)];
    let pick = select_fallback(
        &assets,
        RoundType::Attack,
        &HashSet::new(),
        &RaidConfig::default(),
    )
    .unwrap();
    assert_eq!(pick.asset, 1);
    assert_eq!(pick.stats.health, 9_000);
}

#[test]
fn test_used_assets_are_skipped() {
    let assets = vec![asset(1, 9_000, 1_000), asset(2, 4_000, 1_000)];
    let used = HashSet::from([1]);
    let pick = select_fallback(&assets, RoundType::Defense, &used, &RaidConfig::default()).unwrap();
    assert_eq!(pick.asset, 2);
}

#[test]
fn test_non_tradeable_assets_are_skipped() {
    let mut locked = asset(1, 9_000, 1_000);
    locked.tradeable = false;
    let assets = vec![locked, asset(2, 4_000, 1_000)];
    let pick = select_fallback(
        &assets,
        RoundType::Defense,
        &HashSet::new(),
        &RaidConfig::default(),
    )
    .unwrap();
    assert_eq!(pick.asset, 2);
}

#[test]
fn test_empty_candidate_set_returns_none() {
    let assets = vec![asset(1, 9_000, 1_000)];
    let used = HashSet::from([1]);
    assert!(select_fallback(&assets, RoundType::Defense, &used, &RaidConfig::default()).is_none());
    assert!(
        select_fallback(
            &[],
            RoundType::Attack,
            &HashSet::new(),
            &RaidConfig::default()
        )
        .is_none()
    );
}

#[test]
fn test_ranking_uses_effective_stats() {
    // 900 base + 2000 shiny bonus beats 2_500 plain
    let assets = vec![tagged(1, 900, 900, "shiny"), asset(2, 2_500, 2_500)];
    let pick = select_fallback(
        &assets,
        RoundType::Defense,
        &HashSet::new(),
        &RaidConfig::default(),
    )
    .unwrap();
    assert_eq!(pick.asset, 1);
    assert_eq!(pick.stats.attack, 2_900);
}

#[test]
fn test_ties_break_toward_lower_asset_id() {
    let assets = vec![asset(9, 5_000, 5_000), asset(3, 5_000, 5_000)];
    let pick = select_fallback(
        &assets,
        RoundType::Defense,
        &HashSet::new(),
        &RaidConfig::default(),
    )
    .unwrap();
    assert_eq!(pick.asset, 3);
}
