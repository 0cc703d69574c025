use std::collections::BTreeSet;

use crate::{RankTable, RankTier, Rating, RoleAssignment, RoleCatalog, RoleId};

use super::ReconcileError;

/// The role delta that brings a member's rank badge in line with a rating.
///
/// Built in full before anything is written, so a missing guild role is
/// reported without any role having been removed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleReconciliation {
    target: Option<RankTier>,
    removed: BTreeSet<RoleId>,
    added: BTreeSet<RoleId>,
    current: RoleAssignment,
    resulting: RoleAssignment,
}

impl RoleReconciliation {
    pub fn target(&self) -> Option<&RankTier> {
        self.target.as_ref()
    }

    pub fn removed(&self) -> &BTreeSet<RoleId> {
        &self.removed
    }

    pub fn added(&self) -> &BTreeSet<RoleId> {
        &self.added
    }

    pub fn current(&self) -> &RoleAssignment {
        &self.current
    }

    /// The complete role set to write in a single replacement.
    pub fn resulting(&self) -> &RoleAssignment {
        &self.resulting
    }

    /// Applying this reconciliation would not change anything.
    pub fn is_noop(&self) -> bool {
        self.resulting == self.current
    }
}

pub fn plan(
    table: &RankTable,
    current: &RoleAssignment,
    rating: Option<Rating>,
    catalog: &RoleCatalog,
) -> Result<RoleReconciliation, ReconcileError> {
    let target = table.tier_for(rating).cloned();

    let target_role = match &target {
        Some(tier) => Some(catalog.lookup(tier.name()).ok_or_else(|| ReconcileError::MissingRole {
            tier: tier.name().to_string(),
        })?),
        None => None,
    };

    let removed: BTreeSet<RoleId> = current
        .iter()
        .filter(|id| Some(*id) != target_role)
        .filter(|id| catalog.name_of(*id).is_some_and(|name| table.is_rank_name(name)))
        .collect();

    let added: BTreeSet<RoleId> = target_role.into_iter().filter(|id| !current.contains(*id)).collect();

    let resulting = current.with_delta(&removed, &added);

    Ok(RoleReconciliation {
        target,
        removed,
        added,
        current: current.clone(),
        resulting,
    })
}
