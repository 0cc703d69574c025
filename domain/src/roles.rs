use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::RoleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRole {
    pub id: RoleId,
    pub name: String,
}

/// The roles a guild defines, in the platform's order.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: Vec<GuildRole>,
}

impl RoleCatalog {
    pub fn new(roles: Vec<GuildRole>) -> Self {
        Self { roles }
    }

    /// First role whose name equals `name`, ignoring ASCII case.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<RoleId> {
        self.roles
            .iter()
            .find(|role| role.name.eq_ignore_ascii_case(name))
            .map(|role| role.id)
    }

    pub fn name_of(
        &self,
        id: RoleId,
    ) -> Option<&str> {
        self.roles.iter().find(|role| role.id == id).map(|role| role.name.as_str())
    }

    pub fn roles(&self) -> &[GuildRole] {
        &self.roles
    }
}

/// The set of roles one member holds in one guild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment(BTreeSet<RoleId>);

impl RoleAssignment {
    pub fn new(roles: impl IntoIterator<Item = RoleId>) -> Self {
        Self(roles.into_iter().collect())
    }

    pub fn contains(
        &self,
        id: RoleId,
    ) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn with_delta(
        &self,
        removed: &BTreeSet<RoleId>,
        added: &BTreeSet<RoleId>,
    ) -> Self {
        let kept = self.0.difference(removed).copied();
        Self(kept.chain(added.iter().copied()).collect())
    }
}

impl FromIterator<RoleId> for RoleAssignment {
    fn from_iter<I: IntoIterator<Item = RoleId>>(iter: I) -> Self {
        Self::new(iter)
    }
}
