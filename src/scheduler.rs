//! Encounter scheduler
//!
//! Owns the one encounter slot and the timers that drive it. Two timers can
//! exist over a lifecycle but never two of the same kind at once: the join
//! window timer (live only while `Joining`) and the round deadline timer
//! (live iff a round is active). Every transition out of `RoundActive`
//! aborts the round timer before anything else, so a stale callback can
//! never resolve a round that no longer exists; callbacks additionally
//! re-check generation, state, and round number under the lock and become
//! no-ops when they lose that race.
//!
//! Mutations are single write-lock sections with no await inside.
//! Collaborator I/O happens before the lock (inventory reads, directory
//! lookups) or after it (broadcasts, reward grants).

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use hashbrown::HashSet;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::boss::BossDefinition;
use crate::config::RaidConfig;
use crate::encounter::{Encounter, EncounterState, RoundAction, RoundType};
use crate::error::{CommandError, InvariantViolation};
use crate::events::RaidEvent;
use crate::external::{
    AdminAction, AnnouncementSink, AssetId, AuthorizationGate, InventoryStore, PlayerDirectory,
    PlayerId, RaidHost, UserId,
};
use crate::rewards::{self, ConcludePolicy, Disposition, RaidSummary};
use crate::roster::{Participant, ParticipantStatus};
use crate::round::{self, AutoFill, RoundOutcome};
use crate::selection::select_fallback;
use crate::stats::resolve_stats;

/// One participant's standing in the current fight, for `/ongoing`-style
/// queries
#[derive(Debug, Clone)]
pub struct DamageSummary {
    pub total: i64,
    /// (asset label, amount) per ledger entry
    pub entries: Vec<(String, i64)>,
    /// `None` if the caller never joined and was never disqualified
    pub status: Option<ParticipantStatus>,
}

/// The single encounter slot plus its timers
#[derive(Default)]
struct Slot {
    encounter: Option<Encounter>,
    /// Live only while the encounter is `Joining`
    join_timer: Option<JoinHandle<()>>,
    /// Live iff a round is active; at most one at any time
    round_timer: Option<JoinHandle<()>>,
    /// Bumped on every `start`; stale callbacks compare against it
    generation: u64,
}

impl Slot {
    fn abort_timers(&mut self) {
        if let Some(handle) = self.join_timer.take() {
            handle.abort();
        }
        if let Some(handle) = self.round_timer.take() {
            handle.abort();
        }
    }

    /// With no encounter in the slot there must be no live timers.
    /// A violation resets the slot to idle before surfacing.
    fn check_idle(&mut self) -> Result<(), InvariantViolation> {
        if self.join_timer.is_some() || self.round_timer.is_some() {
            error!("live timer found without an active encounter; resetting");
            self.abort_timers();
            self.encounter = None;
            return Err(InvariantViolation::TimerWithoutRound);
        }
        Ok(())
    }

    /// Install the round deadline timer. Finding one already live is fatal:
    /// both are aborted and the encounter is torn down.
    fn install_round_timer(&mut self, handle: JoinHandle<()>) -> Result<(), InvariantViolation> {
        if let Some(existing) = self.round_timer.take() {
            error!("second live round timer detected; aborting encounter");
            existing.abort();
            handle.abort();
            self.abort_timers();
            self.encounter = None;
            return Err(InvariantViolation::DuplicateTimer);
        }
        self.round_timer = Some(handle);
        Ok(())
    }
}

struct Inner<H> {
    host: H,
    config: RaidConfig,
    slot: RwLock<Slot>,
}

/// Drives raid encounters against a host's collaborators
pub struct RaidScheduler<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for RaidScheduler<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl<H: RaidHost> RaidScheduler<H> {
    pub fn new(host: H, config: RaidConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                config,
                slot: RwLock::new(Slot::default()),
            }),
        }
    }

    pub fn config(&self) -> &RaidConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    fn authorize(&self, user: UserId, action: AdminAction) -> Result<(), CommandError> {
        if self.inner.host.is_authorized(user, action) {
            Ok(())
        } else {
            warn!(user, ?action, "unauthorized admin command");
            Err(CommandError::Unauthorized(action))
        }
    }

    /// Open a new encounter in the join phase.
    ///
    /// Fails with `AlreadyActive` while a fight is running. The join window
    /// timer is scheduled here; when it fires, round 1 (always Defense)
    /// begins.
    pub async fn start(&self, admin: UserId, boss: BossDefinition) -> Result<(), CommandError> {
        self.authorize(admin, AdminAction::Start)?;

        let (event, imagery) = {
            let mut guard = self.inner.slot.write().await;
            let slot = &mut *guard;
            if slot.encounter.is_some() {
                return Err(CommandError::AlreadyActive);
            }
            slot.check_idle()?;

            slot.generation += 1;
            let generation = slot.generation;
            let enc = Encounter::new(generation, boss, &self.inner.config);
            let event = RaidEvent::BattleOpened {
                boss: enc.boss.name.clone(),
            };
            let imagery = enc.boss.imagery.start.clone();
            info!(generation, boss = %enc.boss.id, tier = enc.boss.tier, "boss battle started");
            slot.encounter = Some(enc);

            let sched = self.clone();
            let join_window = Duration::from_secs(self.inner.config.join_window_secs);
            slot.join_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(join_window).await;
                sched.close_join_window(generation).await;
            }));
            (event, imagery)
        };

        self.inner.host.broadcast(event.render(), imagery).await;
        Ok(())
    }

    /// Join the current encounter.
    ///
    /// Allowed during the join window, and mid-fight only when configured.
    /// Joining recomputes the HP pool for the new roster size.
    pub async fn join(&self, user: UserId, name: impl Into<String>) -> Result<(), CommandError> {
        let name = name.into();
        let player = self.inner.host.get_or_create_player(user).await?;

        let mut guard = self.inner.slot.write().await;
        let slot = &mut *guard;
        let Some(enc) = slot.encounter.as_mut() else {
            return Err(CommandError::NoActiveEncounter);
        };
        match enc.state {
            EncounterState::Joining => {}
            EncounterState::RoundActive if self.inner.config.allow_midfight_join => {}
            EncounterState::RoundActive | EncounterState::Concluded => {
                return Err(CommandError::NotJoinable);
            }
        }
        enc.roster.join(Participant::new(player, user, name))?;
        enc.recompute_hp(&self.inner.config);
        info!(player, user, hp = enc.hp_pool, "participant joined");
        Ok(())
    }

    /// Submit (or replace) the caller's action for the current round.
    ///
    /// Stats are resolved here, at submission time; the asset is only
    /// consumed when the round resolves.
    pub async fn submit_action(&self, user: UserId, asset: AssetId) -> Result<(), CommandError> {
        let player = self.inner.host.get_or_create_player(user).await?;
        let assets = self.inner.host.list_eligible_assets(player).await?;
        let snapshot = assets
            .into_iter()
            .find(|a| a.id == asset && a.tradeable)
            .ok_or(CommandError::IneligibleAsset(asset))?;
        let stats = resolve_stats(
            snapshot.base_attack,
            snapshot.base_health,
            &snapshot.tags,
            &self.inner.config,
        );

        let mut guard = self.inner.slot.write().await;
        let slot = &mut *guard;
        let Some(enc) = slot.encounter.as_mut() else {
            return Err(CommandError::NoActiveEncounter);
        };
        if enc.state != EncounterState::RoundActive {
            return Err(CommandError::NoActiveRound);
        }
        if enc.roster.is_disqualified(player) {
            return Err(CommandError::Disqualified);
        }
        if !enc.roster.is_active(player) {
            return Err(CommandError::NotInBattle);
        }
        if enc.roster.is_asset_used(player, asset) {
            return Err(CommandError::AssetAlreadyUsed(asset));
        }
        enc.submit_action(RoundAction {
            player,
            asset,
            attack: stats.attack,
            health: stats.health,
            label: snapshot.label,
        });
        Ok(())
    }

    /// Disqualify a participant, or reverse a disqualification. Idempotent;
    /// `undo` only clears the flag and never re-adds to the roster.
    pub async fn disqualify(
        &self,
        admin: UserId,
        player: PlayerId,
        undo: bool,
    ) -> Result<(), CommandError> {
        self.authorize(admin, AdminAction::Disqualify)?;

        let mut guard = self.inner.slot.write().await;
        let Some(enc) = guard.encounter.as_mut() else {
            return Err(CommandError::NoActiveEncounter);
        };
        enc.roster.disqualify(player, undo);
        info!(player, undo, "disqualification updated");
        Ok(())
    }

    /// Administrative join: bypasses the join-window restriction and clears
    /// any disqualification flag. Recomputes HP like a normal join.
    pub async fn force_join(
        &self,
        admin: UserId,
        user: UserId,
        name: impl Into<String>,
    ) -> Result<(), CommandError> {
        self.authorize(admin, AdminAction::ForceJoin)?;
        let name = name.into();
        let player = self.inner.host.get_or_create_player(user).await?;

        let mut guard = self.inner.slot.write().await;
        let Some(enc) = guard.encounter.as_mut() else {
            return Err(CommandError::NoActiveEncounter);
        };
        enc.roster.force_join(Participant::new(player, user, name));
        enc.recompute_hp(&self.inner.config);
        info!(player, user, hp = enc.hp_pool, "participant force-joined");
        Ok(())
    }

    /// Override the damage draw for subsequent Attack rounds
    pub async fn set_attack_damage(&self, admin: UserId, amount: i64) -> Result<(), CommandError> {
        self.authorize(admin, AdminAction::SetAttackDamage)?;
        let config = &self.inner.config;
        if amount < config.damage_min || amount > config.damage_max {
            return Err(CommandError::DamageOutOfRange {
                amount,
                min: config.damage_min,
                max: config.damage_max,
            });
        }

        let mut guard = self.inner.slot.write().await;
        let Some(enc) = guard.encounter.as_mut() else {
            return Err(CommandError::NoActiveEncounter);
        };
        enc.forced_attack_damage = Some(amount);
        info!(amount, "attack damage override set");
        Ok(())
    }

    /// External ids of active participants, optionally only those without a
    /// submission this round. The host does the actual pinging.
    pub async fn ping_unresponsive(
        &self,
        admin: UserId,
        only_unselected: bool,
    ) -> Result<Vec<UserId>, CommandError> {
        self.authorize(admin, AdminAction::Ping)?;

        let guard = self.inner.slot.read().await;
        let Some(enc) = guard.encounter.as_ref() else {
            return Err(CommandError::NoActiveEncounter);
        };
        Ok(enc
            .roster
            .active_ids()
            .into_iter()
            .filter(|p| !only_unselected || !enc.has_action(*p))
            .filter_map(|p| enc.roster.participant(p).map(|part| part.user))
            .collect())
    }

    /// The caller's damage standing in the current fight
    pub async fn ongoing_damage(&self, user: UserId) -> Result<DamageSummary, CommandError> {
        let player = self.inner.host.get_or_create_player(user).await?;

        let guard = self.inner.slot.read().await;
        let Some(enc) = guard.encounter.as_ref() else {
            return Err(CommandError::NoActiveEncounter);
        };
        let entries = enc
            .roster
            .entries()
            .iter()
            .filter(|e| e.player == player)
            .map(|e| (e.label.clone(), e.amount))
            .collect();
        let status = enc
            .roster
            .participant(player)
            .map(|p| p.status)
            .or_else(|| {
                enc.roster
                    .is_disqualified(player)
                    .then_some(ParticipantStatus::Disqualified)
            });
        Ok(DamageSummary {
            total: enc.roster.total_damage(player),
            entries,
            status,
        })
    }

    /// Debug dump of the running encounter, for admin inspection
    pub async fn stats_snapshot(&self, admin: UserId) -> Result<String, CommandError> {
        self.authorize(admin, AdminAction::Inspect)?;

        let guard = self.inner.slot.read().await;
        let Some(enc) = guard.encounter.as_ref() else {
            return Err(CommandError::NoActiveEncounter);
        };
        Ok(format!(
            "boss: {} (tier {})\nstate: {:?}\nround: {} ({:?})\nhp: {}\nactive: {}\nledger entries: {}\nlast hitter: {:?}",
            enc.boss.name,
            enc.boss.tier,
            enc.state,
            enc.round,
            enc.round_type,
            enc.hp_display(),
            enc.roster.active_len(),
            enc.roster.entries().len(),
            enc.roster.last_hitter(),
        ))
    }

    /// Conclude immediately, picking a winner by policy.
    ///
    /// Cancels any pending timers before the encounter leaves the slot;
    /// reward grants and the summary broadcast happen after.
    pub async fn force_conclude(
        &self,
        admin: UserId,
        policy: ConcludePolicy,
    ) -> Result<RaidSummary, CommandError> {
        self.authorize(admin, AdminAction::Conclude)?;

        let enc = {
            let mut guard = self.inner.slot.write().await;
            let slot = &mut *guard;
            let Some(mut enc) = slot.encounter.take() else {
                return Err(CommandError::NoActiveEncounter);
            };
            slot.abort_timers();
            enc.state = EncounterState::Concluded;
            enc.clear_deadline();
            enc
        };

        let winner = {
            let mut rng = rand::thread_rng();
            rewards::pick_winner(&enc, policy, &mut rng)
        };
        info!(?policy, ?winner, "boss battle concluded administratively");

        let summary =
            rewards::distribute(&self.inner.host, &enc, Disposition::Forced { winner }, &self.inner.config)
                .await;
        self.inner.host.broadcast(summary.render(), None).await;
        Ok(summary)
    }

    /// Whether an encounter currently occupies the slot
    pub async fn is_running(&self) -> bool {
        self.inner.slot.read().await.encounter.is_some()
    }

    /// Verify the timer/state invariant; used by tests and health checks
    pub async fn check_timer_invariant(&self) -> Result<(), InvariantViolation> {
        let guard = self.inner.slot.read().await;
        let round_active = guard
            .encounter
            .as_ref()
            .is_some_and(|e| e.state == EncounterState::RoundActive);
        match (guard.round_timer.is_some(), round_active) {
            (true, false) => Err(InvariantViolation::TimerWithoutRound),
            (false, true) => Err(InvariantViolation::MissingTimer),
            _ => Ok(()),
        }
    }

    // ─── Timer-driven transitions ───────────────────────────────────────────

    /// Join window elapsed: begin round 1 (always Defense)
    async fn close_join_window(self, generation: u64) {
        let mut guard = self.inner.slot.write().await;
        let slot = &mut *guard;
        if slot.generation != generation {
            return;
        }
        let Some(enc) = slot.encounter.as_mut() else {
            return;
        };
        if enc.state != EncounterState::Joining {
            return;
        }
        // Our own (finished) handle
        slot.join_timer.take();

        let round_len = self.inner.config.round_secs;
        let deadline = now() + chrono::Duration::seconds(round_len as i64);
        let mut rng = rand::thread_rng();
        round::advance_round(enc, &mut rng, &self.inner.config, deadline);
        let round = enc.round;
        info!(generation, joined = enc.roster.active_len(), "join window closed");

        let handle = self.spawn_round_cycle(generation, round, Duration::ZERO);
        let _ = slot.install_round_timer(handle);
    }

    /// One round from announcement to resolution. Spawned as the round
    /// deadline timer; holds the slot's `round_timer` handle for its
    /// lifetime.
    fn spawn_round_cycle(&self, generation: u64, round: u32, pause: Duration) -> JoinHandle<()> {
        let sched = self.clone();
        let round_len = Duration::from_secs(self.inner.config.round_secs);
        tokio::spawn(async move {
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            let Some((event, imagery)) = sched.round_announcement(generation, round).await else {
                return;
            };
            sched.inner.host.broadcast(event.render(), imagery).await;

            tokio::time::sleep(round_len).await;
            sched.resolve_due_round(generation, round).await;
        })
    }

    /// Snapshot the current round for its opening announcement; `None` when
    /// the cycle lost a race with a conclusion.
    async fn round_announcement(
        &self,
        generation: u64,
        round: u32,
    ) -> Option<(RaidEvent, Option<String>)> {
        let guard = self.inner.slot.read().await;
        let enc = guard.encounter.as_ref()?;
        if guard.generation != generation
            || enc.state != EncounterState::RoundActive
            || enc.round != round
        {
            return None;
        }
        let imagery = match enc.round_type {
            RoundType::Defense => enc.boss.imagery.defense.clone(),
            RoundType::Attack => enc.boss.imagery.attack.clone(),
        };
        Some((
            RaidEvent::RoundOpened {
                round,
                boss: enc.boss.name.clone(),
                round_type: enc.round_type,
                boss_damage: enc.boss_damage,
            },
            imagery,
        ))
    }

    /// Deadline hit: auto-fill the idle participants and resolve the round
    /// as one batch.
    async fn resolve_due_round(&self, generation: u64, round: u32) {
        // Snapshot who still owes an action, then fetch inventories without
        // holding the lock. Resolution re-validates afterwards.
        let (round_type, idle) = {
            let guard = self.inner.slot.read().await;
            let Some(enc) = guard.encounter.as_ref() else {
                return;
            };
            if guard.generation != generation
                || enc.state != EncounterState::RoundActive
                || enc.round != round
            {
                return;
            }
            let idle: Vec<(PlayerId, HashSet<AssetId>)> = enc
                .roster
                .active_ids()
                .into_iter()
                .filter(|p| !enc.has_action(*p))
                .map(|p| (p, enc.roster.used_assets(p)))
                .collect();
            (enc.round_type, idle)
        };

        let mut auto_fills = Vec::with_capacity(idle.len());
        for (player, used) in idle {
            let assets = match self.inner.host.list_eligible_assets(player).await {
                Ok(assets) => assets,
                Err(err) => {
                    // Degrades to "nothing eligible": the participant is
                    // eliminated rather than the round failing.
                    warn!(player, %err, "inventory unavailable at deadline");
                    Vec::new()
                }
            };
            let action = select_fallback(&assets, round_type, &used, &self.inner.config).map(
                |pick| RoundAction {
                    player,
                    asset: pick.asset,
                    attack: pick.stats.attack,
                    health: pick.stats.health,
                    label: pick.label,
                },
            );
            auto_fills.push(AutoFill { player, action });
        }

        let (event, concluded) = {
            let mut guard = self.inner.slot.write().await;
            let slot = &mut *guard;
            let Some(enc) = slot.encounter.as_mut() else {
                return;
            };
            if slot.generation != generation
                || enc.state != EncounterState::RoundActive
                || enc.round != round
            {
                return;
            }
            let Some(resolved) = round::resolve_round(enc, auto_fills) else {
                return;
            };
            let boss_name = enc.boss.name.clone();

            let concluded = match resolved.outcome {
                RoundOutcome::Continue => {
                    let pause = Duration::from_secs(self.inner.config.interround_pause_secs);
                    let deadline = now()
                        + chrono::Duration::seconds(
                            (self.inner.config.interround_pause_secs + self.inner.config.round_secs)
                                as i64,
                        );
                    let mut rng = rand::thread_rng();
                    round::advance_round(enc, &mut rng, &self.inner.config, deadline);
                    let next_round = enc.round;

                    // Our own finished handle; dropping detaches it
                    slot.round_timer.take();
                    let handle = self.spawn_round_cycle(generation, next_round, pause);
                    if slot.install_round_timer(handle).is_err() {
                        return;
                    }
                    None
                }
                RoundOutcome::Victory | RoundOutcome::Defeat => {
                    slot.round_timer.take();
                    slot.abort_timers();
                    slot.encounter.take().map(|enc| (enc, resolved.outcome))
                }
            };

            (
                RaidEvent::RoundResolved {
                    boss: boss_name,
                    resolved,
                },
                concluded,
            )
        };

        self.inner.host.broadcast(event.render(), None).await;

        if let Some((enc, outcome)) = concluded {
            let disposition = match outcome {
                RoundOutcome::Victory => Disposition::Victory,
                _ => Disposition::Defeat,
            };
            let summary =
                rewards::distribute(&self.inner.host, &enc, disposition, &self.inner.config).await;
            self.inner.host.broadcast(summary.render(), None).await;
        }
    }
}
