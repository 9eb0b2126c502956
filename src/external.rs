//! External collaborator interfaces
//!
//! The engine owns encounter state and nothing else. Inventory, player
//! records, announcements, and permissions belong to the surrounding bot and
//! are reached through these traits. A host implements all four; the
//! scheduler is generic over one [`RaidHost`] bundle so tests can plug in a
//! single mock.
//!
//! Futures are `Send` so collaborator calls can run inside spawned timer
//! tasks.

use std::future::Future;

use thiserror::Error;

/// External chat identity (e.g. a Discord user id)
pub type UserId = u64;

/// Internal player record id, as issued by the player directory
pub type PlayerId = i64;

/// Inventory asset id
pub type AssetId = i64;

/// One owned creature asset, as reported by the inventory store
#[derive(Debug, Clone)]
pub struct AssetSnapshot {
    pub id: AssetId,
    pub base_attack: i64,
    pub base_health: i64,
    /// Special tags ("shiny", "mythic", ...); unknown tags are ignored
    pub tags: Vec<String>,
    /// Short display label for round reports
    pub label: String,
    /// Non-tradeable assets are never eligible for deployment
    pub tradeable: bool,
}

/// Administrative commands, for authorization checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Start,
    Conclude,
    Disqualify,
    ForceJoin,
    SetAttackDamage,
    Ping,
    Inspect,
}

/// Collaborator call failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("no such record: {0}")]
    NotFound(String),
}

/// Lookup and creation of collectible assets
pub trait InventoryStore {
    /// All assets the participant could deploy. The engine additionally
    /// filters non-tradeable entries and assets already used this encounter.
    fn list_eligible_assets(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<Vec<AssetSnapshot>, StoreError>> + Send;

    /// Mint a reward asset tied to the boss identity. `distinguished` marks
    /// the last-hitter reward.
    fn create_asset(
        &self,
        player: PlayerId,
        boss_id: &str,
        distinguished: bool,
    ) -> impl Future<Output = Result<AssetId, StoreError>> + Send;
}

/// Maps external chat identities to internal player records
pub trait PlayerDirectory {
    fn get_or_create_player(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<PlayerId, StoreError>> + Send;
}

/// Fire-and-forget broadcast channel for round announcements
///
/// Implementations handle (and log) their own delivery failures; a dropped
/// announcement never blocks round progression.
pub trait AnnouncementSink {
    fn broadcast(&self, text: String, imagery: Option<String>) -> impl Future<Output = ()> + Send;
}

/// Gate for administrative commands
///
/// Synchronous: hosts answer role checks from cached member data.
pub trait AuthorizationGate {
    fn is_authorized(&self, user: UserId, action: AdminAction) -> bool;
}

/// Everything the scheduler needs from its host, as one bound
pub trait RaidHost:
    InventoryStore + PlayerDirectory + AnnouncementSink + AuthorizationGate + Send + Sync + 'static
{
}

impl<T> RaidHost for T where
    T: InventoryStore + PlayerDirectory + AnnouncementSink + AuthorizationGate + Send + Sync + 'static
{
}
