//! Tests for effective stat resolution

use crate::config::RaidConfig;
use crate::stats::resolve_stats;

fn config() -> RaidConfig {
    RaidConfig::default()
}

#[test]
fn test_plain_asset_passes_through() {
    let stats = resolve_stats(12_000, 9_500, &Vec::<String>::new(), &config());
    assert_eq!(stats.attack, 12_000);
    assert_eq!(stats.health, 9_500);
}

#[test]
fn test_clamps_to_max_stat() {
    let stats = resolve_stats(250_000, 180_000, &Vec::<String>::new(), &config());
    assert_eq!(stats.attack, 100_000);
    assert_eq!(stats.health, 100_000);
}

#[test]
fn test_clamps_negative_to_zero() {
    let stats = resolve_stats(-50, -1, &Vec::<String>::new(), &config());
    assert_eq!(stats.attack, 0);
    assert_eq!(stats.health, 0);
}

#[test]
fn test_bonus_applies_after_clamp() {
    // Clamp to 100_000 first, then add the shiny bonus on top
    let stats = resolve_stats(250_000, 1_000, &["shiny"], &config());
    assert_eq!(stats.attack, 102_000);
    assert_eq!(stats.health, 3_000);
}

#[test]
fn test_unknown_tags_add_nothing() {
    let stats = resolve_stats(5_000, 5_000, &["sparkly", "limited"], &config());
    assert_eq!(stats.attack, 5_000);
    assert_eq!(stats.health, 5_000);
}

#[test]
fn test_bonuses_do_not_stack() {
    // shiny outranks boss; only one bonus applies
    let stats = resolve_stats(1_000, 1_000, &["boss", "shiny"], &config());
    assert_eq!(stats.attack, 3_000);
    assert_eq!(stats.health, 3_000);
}

#[test]
fn test_rank_order_decides_between_tags() {
    // christmas (rank 1) wins over mythic (rank 2) despite the smaller bonus
    let stats = resolve_stats(1_000, 1_000, &["mythic", "christmas"], &config());
    assert_eq!(stats.attack, 1_500);
    assert_eq!(stats.health, 1_500);
}
