//! Tests for round resolution and the encounter state machine

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::boss::BossDefinition;
use crate::config::RaidConfig;
use crate::encounter::{Encounter, EncounterState, RoundAction, RoundType};
use crate::round::{AutoFill, RoundOutcome, advance_round, resolve_round};

fn config() -> RaidConfig {
    RaidConfig::default()
}

fn encounter_with(players: &[i64]) -> Encounter {
    let cfg = config();
    let mut enc = Encounter::new(1, BossDefinition::new("leviathan", "Leviathan", 1), &cfg);
    for &id in players {
        enc.roster
            .join(crate::roster::Participant::new(
                id,
                id as u64,
                format!("player-{id}"),
            ))
            .unwrap();
    }
    enc.recompute_hp(&cfg);
    enc
}

fn begin(enc: &mut Encounter, round_type: RoundType, boss_damage: Option<i64>) {
    let deadline = Utc::now().naive_utc() + chrono::Duration::seconds(20);
    enc.begin_round(round_type, boss_damage, deadline);
}

fn action(player: i64, asset: i64, attack: i64, health: i64) -> RoundAction {
    RoundAction {
        player,
        asset,
        attack,
        health,
        label: format!("asset-{asset}"),
    }
}

#[test]
fn test_worked_example_tier_one() {
    // Tier 1 boss: 70_000 base, one participant joins -> 110_000
    let mut enc = encounter_with(&[1]);
    assert_eq!(enc.hp_pool, 110_000);

    begin(&mut enc, RoundType::Defense, None);
    assert_eq!(enc.round, 1);
    enc.submit_action(action(1, 10, 12_000, 8_000));

    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();
    assert_eq!(resolved.outcome, RoundOutcome::Continue);
    assert_eq!(enc.hp_pool, 98_000);
    assert_eq!(enc.roster.total_damage(1), 12_000);
    assert!(enc.roster.last_hitter().is_none());
}

#[test]
fn test_defense_hp_is_monotonic() {
    let mut enc = encounter_with(&[1, 2]);
    let mut last_hp = enc.hp_pool;

    for round in 0..4 {
        begin(&mut enc, RoundType::Defense, None);
        enc.submit_action(action(1, round * 2 + 1, 3_000, 5_000));
        enc.submit_action(action(2, round * 2 + 2, 1_500, 5_000));
        let resolved = resolve_round(&mut enc, Vec::new()).unwrap();
        assert_eq!(resolved.outcome, RoundOutcome::Continue);
        assert!(enc.hp_pool <= last_hp);
        last_hp = enc.hp_pool;
    }
    assert_eq!(enc.roster.entries().len(), 8);
}

#[test]
fn test_last_hitter_is_crossing_contribution() {
    let mut enc = encounter_with(&[1, 2, 3]);
    enc.hp_pool = 10_000;

    begin(&mut enc, RoundType::Defense, None);
    enc.submit_action(action(1, 10, 4_000, 1_000));
    enc.submit_action(action(2, 11, 7_000, 1_000));
    enc.submit_action(action(3, 12, 9_000, 1_000));

    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();
    assert_eq!(resolved.outcome, RoundOutcome::Victory);
    // Player 2 drove the pool to <= 0; player 3's hit afterwards does not
    // reassign the last hit
    assert_eq!(enc.roster.last_hitter(), Some(2));
    // The whole batch was still applied
    assert_eq!(enc.roster.entries().len(), 3);
    assert_eq!(enc.hp_pool, -10_000);
    assert_eq!(resolved.hp_remaining, 0);
    assert_eq!(enc.state, EncounterState::Concluded);
    assert!(enc.round_deadline.is_none());
}

#[test]
fn test_raw_sign_drives_victory_display_clamps() {
    let mut enc = encounter_with(&[1]);
    enc.hp_pool = 100;

    begin(&mut enc, RoundType::Defense, None);
    enc.submit_action(action(1, 10, 150, 1_000));
    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();

    assert_eq!(resolved.outcome, RoundOutcome::Victory);
    assert_eq!(enc.hp_pool, -50);
    assert_eq!(enc.hp_display(), 0);
}

#[test]
fn test_attack_round_eliminates_weak_assets() {
    let mut enc = encounter_with(&[1, 2, 3]);

    begin(&mut enc, RoundType::Attack, Some(6_000));
    enc.submit_action(action(1, 10, 100, 5_000)); // below the hit
    enc.submit_action(action(2, 11, 100, 6_000)); // exactly the hit: falls
    enc.submit_action(action(3, 12, 100, 6_001)); // survives

    let hp_before = enc.hp_pool;
    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();

    assert_eq!(resolved.outcome, RoundOutcome::Continue);
    assert_eq!(enc.roster.active_ids(), vec![3]);
    // Attack rounds never touch boss HP or the ledger
    assert_eq!(enc.hp_pool, hp_before);
    assert!(enc.roster.entries().is_empty());
}

#[test]
fn test_attack_round_wipe_is_defeat() {
    let mut enc = encounter_with(&[1, 2]);

    begin(&mut enc, RoundType::Attack, Some(7_000));
    enc.submit_action(action(1, 10, 100, 2_000));
    enc.submit_action(action(2, 11, 100, 3_000));

    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();
    assert_eq!(resolved.outcome, RoundOutcome::Defeat);
    assert_eq!(enc.state, EncounterState::Concluded);
    assert_eq!(enc.roster.active_len(), 0);
}

#[test]
fn test_no_eligible_asset_eliminates_without_ledger_entry() {
    let mut enc = encounter_with(&[1, 2]);

    begin(&mut enc, RoundType::Attack, Some(6_000));
    enc.submit_action(action(1, 10, 100, 9_000));

    let fills = vec![AutoFill {
        player: 2,
        action: None,
    }];
    let resolved = resolve_round(&mut enc, fills).unwrap();

    assert_eq!(resolved.outcome, RoundOutcome::Continue);
    assert_eq!(enc.roster.active_ids(), vec![1]);
    assert!(enc.roster.entries().is_empty());
    assert!(resolved.report.iter().any(|l| l.contains("no eligible")));
}

#[test]
fn test_empty_roster_after_defense_round_is_defeat() {
    // Everyone idles with an empty inventory; nobody is left to fight
    let mut enc = encounter_with(&[1]);

    begin(&mut enc, RoundType::Defense, None);
    let fills = vec![AutoFill {
        player: 1,
        action: None,
    }];
    let resolved = resolve_round(&mut enc, fills).unwrap();

    assert_eq!(resolved.outcome, RoundOutcome::Defeat);
    assert_eq!(enc.state, EncounterState::Concluded);
}

#[test]
fn test_resubmission_replaces_not_duplicates() {
    let mut enc = encounter_with(&[1]);

    begin(&mut enc, RoundType::Defense, None);
    enc.submit_action(action(1, 10, 2_000, 1_000));
    enc.submit_action(action(1, 11, 5_000, 1_000));
    assert_eq!(enc.actions().len(), 1);
    assert_eq!(enc.actions()[0].asset, 11);

    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();
    assert_eq!(resolved.outcome, RoundOutcome::Continue);
    // Exactly one ledger entry, from the replacement
    assert_eq!(enc.roster.entries().len(), 1);
    assert_eq!(enc.roster.total_damage(1), 5_000);
    // Only the resolved asset was consumed
    assert!(enc.roster.is_asset_used(1, 11));
    assert!(!enc.roster.is_asset_used(1, 10));
}

#[test]
fn test_disqualified_mid_round_action_is_dropped() {
    let mut enc = encounter_with(&[1, 2]);

    begin(&mut enc, RoundType::Defense, None);
    enc.submit_action(action(1, 10, 5_000, 1_000));
    enc.submit_action(action(2, 11, 5_000, 1_000));
    enc.roster.disqualify(1, false);

    let hp_before = enc.hp_pool;
    let resolved = resolve_round(&mut enc, Vec::new()).unwrap();

    assert_eq!(resolved.outcome, RoundOutcome::Continue);
    // Only the remaining active participant's contribution landed
    assert_eq!(enc.hp_pool, hp_before - 5_000);
    assert_eq!(enc.roster.total_damage(1), 0);
    assert!(!enc.roster.is_asset_used(1, 10));
}

#[test]
fn test_resolve_is_noop_outside_active_round() {
    let mut enc = encounter_with(&[1]);
    assert_eq!(enc.state, EncounterState::Joining);
    assert!(resolve_round(&mut enc, Vec::new()).is_none());

    enc.state = EncounterState::Concluded;
    assert!(resolve_round(&mut enc, Vec::new()).is_none());
}

#[test]
fn test_first_round_is_always_defense() {
    let cfg = config();
    for seed in 0..10 {
        let mut enc = encounter_with(&[1]);
        let mut rng = StdRng::seed_from_u64(seed);
        let deadline = Utc::now().naive_utc() + chrono::Duration::seconds(20);
        advance_round(&mut enc, &mut rng, &cfg, deadline);
        assert_eq!(enc.round, 1);
        assert_eq!(enc.round_type, RoundType::Defense);
        assert!(enc.boss_damage.is_none());
        assert_eq!(enc.state, EncounterState::RoundActive);
    }
}

#[test]
fn test_attack_damage_drawn_from_configured_range() {
    let cfg = config();
    let deadline = Utc::now().naive_utc() + chrono::Duration::seconds(20);
    let mut saw_attack = false;

    for seed in 0..32 {
        let mut enc = encounter_with(&[1]);
        enc.round = 1; // past the fixed Defense opener
        let mut rng = StdRng::seed_from_u64(seed);
        advance_round(&mut enc, &mut rng, &cfg, deadline);
        if enc.round_type == RoundType::Attack {
            saw_attack = true;
            let damage = enc.boss_damage.unwrap();
            assert!((6_000..7_000).contains(&damage));
            assert_eq!(damage % 100, 0);
        }
    }
    assert!(saw_attack, "no attack round in 32 draws");
}

#[test]
fn test_forced_attack_damage_overrides_draw() {
    let cfg = config();
    let deadline = Utc::now().naive_utc() + chrono::Duration::seconds(20);

    for seed in 0..32 {
        let mut enc = encounter_with(&[1]);
        enc.round = 1;
        enc.forced_attack_damage = Some(6_500);
        let mut rng = StdRng::seed_from_u64(seed);
        advance_round(&mut enc, &mut rng, &cfg, deadline);
        if enc.round_type == RoundType::Attack {
            assert_eq!(enc.boss_damage, Some(6_500));
            return;
        }
    }
    panic!("no attack round in 32 draws");
}

#[test]
fn test_advance_clears_action_set() {
    let cfg = config();
    let mut enc = encounter_with(&[1]);
    begin(&mut enc, RoundType::Defense, None);
    enc.submit_action(action(1, 10, 2_000, 1_000));
    resolve_round(&mut enc, Vec::new()).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let deadline = Utc::now().naive_utc() + chrono::Duration::seconds(20);
    advance_round(&mut enc, &mut rng, &cfg, deadline);
    assert_eq!(enc.round, 2);
    assert!(enc.actions().is_empty());
    assert!(!enc.has_action(1));
}
