use crate::*;

const ADMIN: RoleId = RoleId(1);
const EARTH: RoleId = RoleId(10);
const STARDUST: RoleId = RoleId(11);
const MOON: RoleId = RoleId(14);
const SUPERNOVA: RoleId = RoleId(20);

struct Guild {
    table: RankTable,
    catalog: RoleCatalog,
}

impl Guild {
    fn standard() -> Self {
        Self::with_roles(&[
            (ADMIN, "Admin"),
            (EARTH, "Earth"),
            (STARDUST, "stardust"),
            (MOON, "MOON"),
            (SUPERNOVA, "Supernova"),
        ])
    }

    fn with_roles(roles: &[(RoleId, &str)]) -> Self {
        let roles = roles
            .iter()
            .map(|(id, name)| GuildRole {
                id: *id,
                name: name.to_string(),
            })
            .collect();
        Self {
            table: RankTable::standard().unwrap(),
            catalog: RoleCatalog::new(roles),
        }
    }

    fn plan(
        &self,
        held: &[RoleId],
        rating: Option<f64>,
    ) -> Result<RoleReconciliation, ReconcileError> {
        plan(
            &self.table,
            &RoleAssignment::new(held.iter().copied()),
            rating.map(Rating),
            &self.catalog,
        )
    }

    fn rank_roles_in(
        &self,
        roles: &RoleAssignment,
    ) -> usize {
        roles
            .iter()
            .filter(|id| self.catalog.name_of(*id).is_some_and(|name| self.table.is_rank_name(name)))
            .count()
    }
}

fn set(ids: &[RoleId]) -> RoleAssignment {
    RoleAssignment::new(ids.iter().copied())
}

#[test]
fn grants_tier_role_to_member_without_rank() {
    let guild = Guild::standard();
    let result = guild.plan(&[ADMIN], Some(1200.0)).unwrap();

    assert_eq!(result.target().map(RankTier::name), Some("Moon"));
    assert!(result.removed().is_empty());
    assert_eq!(result.added().iter().copied().collect::<Vec<_>>(), vec![MOON]);
    assert_eq!(result.resulting(), &set(&[ADMIN, MOON]));
    assert!(!result.is_noop());
}

#[test]
fn swaps_old_badge_for_new_one() {
    let guild = Guild::standard();
    let result = guild.plan(&[ADMIN, EARTH], Some(600.0)).unwrap();

    assert_eq!(result.removed().iter().copied().collect::<Vec<_>>(), vec![EARTH]);
    assert_eq!(result.added().iter().copied().collect::<Vec<_>>(), vec![STARDUST]);
    assert_eq!(result.resulting(), &set(&[ADMIN, STARDUST]));
}

#[test]
fn strips_every_stale_badge() {
    let guild = Guild::standard();
    let result = guild.plan(&[EARTH, STARDUST, MOON, SUPERNOVA], Some(3000.0)).unwrap();

    assert_eq!(result.resulting(), &set(&[SUPERNOVA]));
    assert_eq!(guild.rank_roles_in(result.resulting()), 1);
}

#[test]
fn already_correct_badge_is_a_noop() {
    let guild = Guild::standard();
    let result = guild.plan(&[ADMIN, MOON], Some(1250.0)).unwrap();

    assert!(result.removed().is_empty());
    assert!(result.added().is_empty());
    assert!(result.is_noop());
}

#[test]
fn second_reconciliation_is_a_noop() {
    let guild = Guild::standard();
    for rating in [-5.0, 0.0, 499.0, 650.0, 1100.5, 2600.0] {
        let first = guild.plan(&[ADMIN, EARTH, SUPERNOVA], Some(rating)).unwrap();
        let held: Vec<RoleId> = first.resulting().iter().collect();
        let second = guild.plan(&held, Some(rating)).unwrap();
        assert!(second.is_noop(), "rating {rating}");
        assert_eq!(second.resulting(), first.resulting());
    }
}

#[test]
fn zero_rating_earns_lowest_badge() {
    let guild = Guild::standard();
    let result = guild.plan(&[], Some(0.0)).unwrap();
    assert_eq!(result.resulting(), &set(&[EARTH]));
}

#[test]
fn unranked_member_loses_rank_badges_only() {
    let guild = Guild::standard();
    let result = guild.plan(&[ADMIN, MOON], None).unwrap();

    assert!(result.target().is_none());
    assert!(result.added().is_empty());
    assert_eq!(result.resulting(), &set(&[ADMIN]));
}

#[test]
fn roles_outside_the_catalog_are_kept() {
    let guild = Guild::standard();
    let unknown = RoleId(999);
    let result = guild.plan(&[unknown, EARTH], Some(1200.0)).unwrap();
    assert_eq!(result.resulting(), &set(&[unknown, MOON]));
}

#[test]
fn missing_guild_role_is_reported_before_any_change() {
    let guild = Guild::with_roles(&[(ADMIN, "Admin"), (EARTH, "Earth")]);
    let err = guild.plan(&[ADMIN, EARTH], Some(1600.0)).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::MissingRole {
            tier: "Nebula".to_string()
        }
    );
}

#[test]
fn never_more_than_one_badge_after_reconciliation() {
    let guild = Guild::standard();
    let starting_sets: [&[RoleId]; 4] = [&[], &[ADMIN], &[EARTH, MOON], &[EARTH, STARDUST, MOON, SUPERNOVA]];
    for held in starting_sets {
        for rating in [None, Some(0.0), Some(650.0), Some(1200.0), Some(9000.0)] {
            let result = guild.plan(held, rating).unwrap();
            assert!(guild.rank_roles_in(result.resulting()) <= 1, "{held:?} at {rating:?}");
        }
    }
}
