use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

use domain::{GuildId, MemberId};

use crate::ServiceError;

pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(30);

/// Bookkeeping guarded by a member's lock.
#[derive(Debug, Default)]
pub struct MemberSlot {
    /// Observation number of the last rating written for this member.
    pub last_applied: Option<u64>,
}

/// One async lock per (guild, member) so role edits for the same member never
/// interleave.
///
/// Slots are never pruned: the map holds one entry per (guild, member) ever
/// synced, bounded by the member population.
pub struct MemberLocks {
    slots: Mutex<HashMap<(GuildId, MemberId), Arc<TokioMutex<MemberSlot>>>>,
    wait: Duration,
}

impl Default for MemberLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WAIT)
    }
}

impl MemberLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            wait,
        }
    }

    pub async fn acquire(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
    ) -> Result<OwnedMutexGuard<MemberSlot>, ServiceError> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry((guild_id, member_id)).or_default())
        };

        tokio::time::timeout(self.wait, slot.lock_owned())
            .await
            .map_err(|_| ServiceError::ConcurrencyConflict { guild_id, member_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_member_waits_for_holder() {
        let locks = MemberLocks::new(Duration::from_millis(20));
        let _held = locks.acquire(GuildId(1), MemberId(1)).await.unwrap();

        let err = locks.acquire(GuildId(1), MemberId(1)).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::ConcurrencyConflict {
                guild_id: GuildId(1),
                member_id: MemberId(1)
            }
        );
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = MemberLocks::new(Duration::from_millis(20));
        let _a = locks.acquire(GuildId(1), MemberId(1)).await.unwrap();

        assert!(locks.acquire(GuildId(1), MemberId(2)).await.is_ok());
        assert!(locks.acquire(GuildId(2), MemberId(1)).await.is_ok());
    }

    #[tokio::test]
    async fn slot_state_survives_release() {
        let locks = MemberLocks::default();
        {
            let mut slot = locks.acquire(GuildId(1), MemberId(1)).await.unwrap();
            slot.last_applied = Some(7);
        }

        let slot = locks.acquire(GuildId(1), MemberId(1)).await.unwrap();
        assert_eq!(slot.last_applied, Some(7));
    }
}
