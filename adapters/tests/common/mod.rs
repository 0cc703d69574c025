//! Shared fixture: one rating authority, a handful of guilds and the
//! services wired over the in-memory adapters.

#![allow(dead_code)]

use std::sync::Arc;

use adapters::{InMemoryGuilds, InMemoryRatingService, InMemoryReportChannels};
use application::ports::in_::{CommandService, LeaderboardService, MatchReportProcessor, MemberLocks, RoleSyncService};
use domain::{ExternalPlayerId, GuildId, MatchReport, MemberId, PlayerResult, RankTable, Rating, RoleId};

pub const EARTH: RoleId = RoleId(100);
pub const STARDUST: RoleId = RoleId(101);
pub const METEOR: RoleId = RoleId(102);
pub const COMET: RoleId = RoleId(103);
pub const MOON: RoleId = RoleId(104);
pub const MODERATOR: RoleId = RoleId(900);

/// Roles for the lower half of the standard table plus one unrelated role.
pub const LOWER_RANKS: &[(RoleId, &str)] = &[
    (EARTH, "Earth"),
    (STARDUST, "Stardust"),
    (METEOR, "Meteor"),
    (COMET, "Comet"),
    (MOON, "Moon"),
    (MODERATOR, "Moderator"),
];

pub struct World {
    pub rating: Arc<InMemoryRatingService>,
    pub guilds: Arc<InMemoryGuilds>,
    pub channels: Arc<InMemoryReportChannels>,
    pub role_sync: Arc<RoleSyncService>,
    pub processor: Arc<MatchReportProcessor>,
    pub commands: Arc<CommandService>,
}

impl World {
    pub fn new() -> Self {
        Self::with_locks(MemberLocks::default())
    }

    pub fn with_locks(locks: MemberLocks) -> Self {
        let rating = Arc::new(InMemoryRatingService::new());
        let guilds = Arc::new(InMemoryGuilds::new());
        let channels = Arc::new(InMemoryReportChannels::new());
        let table = Arc::new(RankTable::standard().unwrap());

        let role_sync = Arc::new(RoleSyncService::new(table, guilds.clone(), locks));
        let processor = Arc::new(MatchReportProcessor::new(
            rating.clone(),
            guilds.clone(),
            guilds.clone(),
            channels.clone(),
            role_sync.clone(),
        ));
        let leaderboard = Arc::new(LeaderboardService::new(rating.clone()));
        let commands = Arc::new(CommandService::new(
            rating.clone(),
            channels.clone(),
            role_sync.clone(),
            leaderboard,
        ));

        Self {
            rating,
            guilds,
            channels,
            role_sync,
            processor,
            commands,
        }
    }
}

pub fn report(
    winner: (&str, &str, f64, f64),
    loser: (&str, &str, f64, f64),
) -> MatchReport {
    let player = |(name, id, before, current): (&str, &str, f64, f64)| PlayerResult {
        display_name: name.to_string(),
        player_id: ExternalPlayerId(id.to_string()),
        rating_before: Rating(before),
        rating_current: Rating(current),
    };
    MatchReport::new(player(winner), player(loser)).unwrap()
}

pub fn roles(
    world: &World,
    guild_id: GuildId,
    member_id: MemberId,
) -> Vec<RoleId> {
    world
        .guilds
        .roles_of(guild_id, member_id)
        .map(|roles| roles.iter().collect())
        .unwrap_or_default()
}
