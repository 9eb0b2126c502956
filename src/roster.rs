//! Roster and damage ledger
//!
//! Tracks who is in the fight, who has been disqualified, and an append-only
//! record of every damage contribution. The ledger is the sole input to
//! reward ranking, so entries are never mutated or deleted; eliminated and
//! disqualified participants keep their entries.

use hashbrown::{HashMap, HashSet};

use crate::error::CommandError;
use crate::external::{AssetId, PlayerId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Active,
    Disqualified,
    Eliminated,
}

/// One joined participant
#[derive(Debug, Clone)]
pub struct Participant {
    pub player: PlayerId,
    /// External chat identity, kept for pings and display
    pub user: UserId,
    pub name: String,
    pub status: ParticipantStatus,
}

impl Participant {
    pub fn new(player: PlayerId, user: UserId, name: impl Into<String>) -> Self {
        Self {
            player,
            user,
            name: name.into(),
            status: ParticipantStatus::Active,
        }
    }
}

/// Append-only damage attribution record
#[derive(Debug, Clone)]
pub struct DamageLedgerEntry {
    pub player: PlayerId,
    pub amount: i64,
    pub round: u32,
    /// Label of the asset that dealt the damage
    pub label: String,
}

/// Participants, disqualifications, and the damage ledger for one encounter
#[derive(Debug, Clone, Default)]
pub struct RosterLedger {
    participants: HashMap<PlayerId, Participant>,
    /// Join order, for deterministic iteration during resolution
    join_order: Vec<PlayerId>,
    disqualified: HashSet<PlayerId>,
    ledger: Vec<DamageLedgerEntry>,
    last_hitter: Option<PlayerId>,
    used_assets: HashMap<PlayerId, HashSet<AssetId>>,
}

impl RosterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant to the active roster
    pub fn join(&mut self, participant: Participant) -> Result<(), CommandError> {
        if self.disqualified.contains(&participant.player) {
            return Err(CommandError::Disqualified);
        }
        if self.participants.contains_key(&participant.player) {
            return Err(CommandError::AlreadyJoined);
        }
        self.join_order.push(participant.player);
        self.participants.insert(participant.player, participant);
        Ok(())
    }

    /// Administrative join: clears any disqualification flag and reactivates
    /// a previously removed participant instead of rejecting them.
    pub fn force_join(&mut self, participant: Participant) {
        self.disqualified.remove(&participant.player);
        match self.participants.get_mut(&participant.player) {
            Some(existing) => existing.status = ParticipantStatus::Active,
            None => {
                self.join_order.push(participant.player);
                self.participants.insert(participant.player, participant);
            }
        }
    }

    /// Disqualify (or un-disqualify) a participant; idempotent.
    ///
    /// `undo` reverses only the flag. It does not re-add the participant to
    /// the active roster; rejoining is a separate action.
    pub fn disqualify(&mut self, player: PlayerId, undo: bool) {
        if undo {
            self.disqualified.remove(&player);
            return;
        }
        self.disqualified.insert(player);
        if let Some(p) = self.participants.get_mut(&player)
            && p.status == ParticipantStatus::Active
        {
            p.status = ParticipantStatus::Disqualified;
        }
    }

    pub fn is_disqualified(&self, player: PlayerId) -> bool {
        self.disqualified.contains(&player)
    }

    /// Mark a participant eliminated. No-op for unknown ids.
    pub fn eliminate(&mut self, player: PlayerId) {
        if let Some(p) = self.participants.get_mut(&player) {
            p.status = ParticipantStatus::Eliminated;
        }
    }

    pub fn participant(&self, player: PlayerId) -> Option<&Participant> {
        self.participants.get(&player)
    }

    pub fn is_active(&self, player: PlayerId) -> bool {
        self.participants
            .get(&player)
            .is_some_and(|p| p.status == ParticipantStatus::Active)
    }

    /// Active participants in join order
    pub fn active_ids(&self) -> Vec<PlayerId> {
        self.join_order
            .iter()
            .copied()
            .filter(|id| self.is_active(*id))
            .collect()
    }

    pub fn active_len(&self) -> usize {
        self.join_order
            .iter()
            .filter(|id| self.is_active(**id))
            .count()
    }

    /// Append a damage contribution. Never fails.
    pub fn record_damage(
        &mut self,
        player: PlayerId,
        amount: i64,
        round: u32,
        label: impl Into<String>,
    ) {
        self.ledger.push(DamageLedgerEntry {
            player,
            amount,
            round,
            label: label.into(),
        });
    }

    pub fn entries(&self) -> &[DamageLedgerEntry] {
        &self.ledger
    }

    pub fn total_damage(&self, player: PlayerId) -> i64 {
        self.ledger
            .iter()
            .filter(|e| e.player == player)
            .map(|e| e.amount)
            .sum()
    }

    /// Every damage dealer with their total, highest first.
    /// Ties break by join order so ranking is deterministic.
    pub fn damage_totals(&self) -> Vec<(PlayerId, i64)> {
        let mut totals: HashMap<PlayerId, i64> = HashMap::new();
        for entry in &self.ledger {
            *totals.entry(entry.player).or_insert(0) += entry.amount;
        }

        let mut ranked: Vec<(PlayerId, i64)> = self
            .join_order
            .iter()
            .filter_map(|id| totals.get(id).map(|total| (*id, *total)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn last_hitter(&self) -> Option<PlayerId> {
        self.last_hitter
    }

    pub fn set_last_hitter(&mut self, player: PlayerId) {
        self.last_hitter = Some(player);
    }

    pub fn mark_asset_used(&mut self, player: PlayerId, asset: AssetId) {
        self.used_assets.entry(player).or_default().insert(asset);
    }

    pub fn is_asset_used(&self, player: PlayerId, asset: AssetId) -> bool {
        self.used_assets
            .get(&player)
            .is_some_and(|set| set.contains(&asset))
    }

    /// Snapshot of one participant's consumed assets
    pub fn used_assets(&self, player: PlayerId) -> HashSet<AssetId> {
        self.used_assets.get(&player).cloned().unwrap_or_default()
    }
}
