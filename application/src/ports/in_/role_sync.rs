use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, info};

use domain::{GuildId, MemberId, RankTable, Rating, ReconcileError, RoleId, RoleReconciliation, plan};

use super::member_locks::MemberLocks;
use crate::ServiceError;
use crate::ports::out_::{GuildDirectory, PlatformError};

/// Arrival order of a rating observation. Later observations win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Observation(u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Updated {
        tier: Option<String>,
        added: Vec<RoleId>,
        removed: Vec<RoleId>,
    },
    Unchanged {
        tier: Option<String>,
    },
    /// The member is not in the guild.
    NotMember,
    /// A newer rating for this member was already applied.
    Superseded,
}

impl SyncOutcome {
    pub fn tier(&self) -> Option<&str> {
        match self {
            SyncOutcome::Updated { tier, .. } | SyncOutcome::Unchanged { tier } => tier.as_deref(),
            SyncOutcome::NotMember | SyncOutcome::Superseded => None,
        }
    }
}

pub struct RoleSyncService {
    table: Arc<RankTable>,
    directory: Arc<dyn GuildDirectory>,
    locks: MemberLocks,
    observations: AtomicU64,
}

impl RoleSyncService {
    pub fn new(
        table: Arc<RankTable>,
        directory: Arc<dyn GuildDirectory>,
        locks: MemberLocks,
    ) -> Self {
        Self {
            table,
            directory,
            locks,
            observations: AtomicU64::new(0),
        }
    }

    pub fn table(&self) -> &RankTable {
        &self.table
    }

    /// Stamps a rating observation at the moment it is received.
    pub fn observe(&self) -> Observation {
        Observation(self.observations.fetch_add(1, Ordering::SeqCst))
    }

    /// Brings the member's rank badge in `guild_id` in line with `rating`.
    ///
    /// Holds the member's lock from reading their roles until the write
    /// completes.
    pub async fn sync_member(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        rating: Option<Rating>,
        observation: Observation,
    ) -> Result<SyncOutcome, ServiceError> {
        let mut slot = self.locks.acquire(guild_id, member_id).await?;
        if slot.last_applied.is_some_and(|last| last > observation.0) {
            debug!(%guild_id, %member_id, "Skipping stale rating observation");
            return Ok(SyncOutcome::Superseded);
        }

        let Some(current) = self.directory.member_roles(guild_id, member_id).await? else {
            debug!(%guild_id, %member_id, "Member not in guild");
            return Ok(SyncOutcome::NotMember);
        };
        let catalog = self.directory.role_catalog(guild_id).await?;

        let reconciliation = plan(&self.table, &current, rating, &catalog).map_err(|err| match err {
            ReconcileError::MissingRole { tier } => ServiceError::Configuration { guild_id, tier },
        })?;

        let written = self.apply(guild_id, member_id, &reconciliation).await?;
        slot.last_applied = Some(observation.0);

        let tier = reconciliation.target().map(|t| t.name().to_string());
        if !written {
            return Ok(SyncOutcome::Unchanged { tier });
        }
        info!(%guild_id, %member_id, tier = ?tier, "Updated rank role");
        Ok(SyncOutcome::Updated {
            tier,
            added: reconciliation.added().iter().copied().collect(),
            removed: reconciliation.removed().iter().copied().collect(),
        })
    }

    /// Writes the reconciled role set in one replacement, or nothing when the
    /// member already holds it. Returns whether a write happened.
    pub async fn apply(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        reconciliation: &RoleReconciliation,
    ) -> Result<bool, PlatformError> {
        if reconciliation.is_noop() {
            return Ok(false);
        }
        self.directory
            .replace_member_roles(guild_id, member_id, reconciliation.resulting())
            .await?;
        Ok(true)
    }
}
