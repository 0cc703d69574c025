use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;

use application::ports::out_::{
    ChannelMessenger, GuildDirectory, PlatformError, RatingError, RatingService, ReportChannelRegistry, StoreError,
};
use domain::{
    ChannelId, ExternalPlayerId, GuildId, GuildRole, LeaderboardEntry, MemberId, Rating, RoleAssignment, RoleCatalog,
    RoleId,
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct GuildState {
    roles: Vec<GuildRole>,
    members: HashMap<MemberId, RoleAssignment>,
}

/// Guilds, roles and channels held in memory, recording every write.
pub struct InMemoryGuilds {
    guilds: RwLock<BTreeMap<GuildId, GuildState>>,
    messages: RwLock<Vec<(ChannelId, String)>>,
    role_writes: RwLock<Vec<(GuildId, MemberId, RoleAssignment)>>,
    failing_channels: RwLock<HashSet<ChannelId>>,
    write_delay: RwLock<Duration>,
    unavailable: RwLock<bool>,
}

impl InMemoryGuilds {
    pub fn new() -> Self {
        Self {
            guilds: RwLock::new(BTreeMap::new()),
            messages: RwLock::new(Vec::new()),
            role_writes: RwLock::new(Vec::new()),
            failing_channels: RwLock::new(HashSet::new()),
            write_delay: RwLock::new(Duration::ZERO),
            unavailable: RwLock::new(false),
        }
    }

    pub fn add_guild(
        &self,
        guild_id: GuildId,
        roles: &[(RoleId, &str)],
    ) {
        let roles = roles
            .iter()
            .map(|(id, name)| GuildRole {
                id: *id,
                name: name.to_string(),
            })
            .collect();
        write(&self.guilds).insert(
            guild_id,
            GuildState {
                roles,
                members: HashMap::new(),
            },
        );
    }

    pub fn add_member(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        roles: &[RoleId],
    ) {
        if let Some(guild) = write(&self.guilds).get_mut(&guild_id) {
            guild.members.insert(member_id, RoleAssignment::new(roles.iter().copied()));
        }
    }

    pub fn roles_of(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
    ) -> Option<RoleAssignment> {
        read(&self.guilds)
            .get(&guild_id)
            .and_then(|guild| guild.members.get(&member_id).cloned())
    }

    pub fn messages(&self) -> Vec<(ChannelId, String)> {
        read(&self.messages).clone()
    }

    pub fn role_writes(&self) -> Vec<(GuildId, MemberId, RoleAssignment)> {
        read(&self.role_writes).clone()
    }

    pub fn fail_channel(
        &self,
        channel_id: ChannelId,
    ) {
        write(&self.failing_channels).insert(channel_id);
    }

    /// Holds every role write for `delay` between reading and storing.
    pub fn set_write_delay(
        &self,
        delay: Duration,
    ) {
        *write(&self.write_delay) = delay;
    }

    pub fn set_unavailable(
        &self,
        unavailable: bool,
    ) {
        *write(&self.unavailable) = unavailable;
    }

    fn check_available(&self) -> Result<(), PlatformError> {
        if *read(&self.unavailable) {
            return Err(PlatformError::Unavailable("in-memory platform switched off".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryGuilds {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuildDirectory for InMemoryGuilds {
    async fn guilds(&self) -> Result<Vec<GuildId>, PlatformError> {
        self.check_available()?;
        Ok(read(&self.guilds).keys().copied().collect())
    }

    async fn role_catalog(
        &self,
        guild_id: GuildId,
    ) -> Result<RoleCatalog, PlatformError> {
        self.check_available()?;
        read(&self.guilds)
            .get(&guild_id)
            .map(|guild| RoleCatalog::new(guild.roles.clone()))
            .ok_or(PlatformError::Rejected {
                status: 404,
                message: format!("unknown guild {guild_id}"),
            })
    }

    async fn member_roles(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
    ) -> Result<Option<RoleAssignment>, PlatformError> {
        self.check_available()?;
        Ok(self.roles_of(guild_id, member_id))
    }

    async fn replace_member_roles(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        roles: &RoleAssignment,
    ) -> Result<(), PlatformError> {
        self.check_available()?;
        let delay = *read(&self.write_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut guilds = write(&self.guilds);
        let Some(member) = guilds.get_mut(&guild_id).and_then(|g| g.members.get_mut(&member_id)) else {
            return Err(PlatformError::Rejected {
                status: 404,
                message: format!("unknown member {member_id}"),
            });
        };
        *member = roles.clone();
        write(&self.role_writes).push((guild_id, member_id, roles.clone()));
        Ok(())
    }
}

#[async_trait]
impl ChannelMessenger for InMemoryGuilds {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<(), PlatformError> {
        self.check_available()?;
        if read(&self.failing_channels).contains(&channel_id) {
            return Err(PlatformError::Rejected {
                status: 403,
                message: "missing access".into(),
            });
        }
        write(&self.messages).push((channel_id, content.to_string()));
        Ok(())
    }
}

pub struct InMemoryReportChannels {
    channels: RwLock<HashMap<GuildId, ChannelId>>,
    failing: RwLock<bool>,
}

impl InMemoryReportChannels {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            failing: RwLock::new(false),
        }
    }

    pub fn set_failing(
        &self,
        failing: bool,
    ) {
        *write(&self.failing) = failing;
    }

    fn check(&self) -> Result<(), StoreError> {
        if *read(&self.failing) {
            return Err(StoreError("in-memory store switched off".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryReportChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportChannelRegistry for InMemoryReportChannels {
    async fn report_channel(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<ChannelId>, StoreError> {
        self.check()?;
        Ok(read(&self.channels).get(&guild_id).copied())
    }

    async fn set_report_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        self.check()?;
        write(&self.channels).insert(guild_id, channel_id);
        Ok(())
    }
}

#[derive(Default)]
struct RatingState {
    hashes: HashMap<ExternalPlayerId, String>,
    links: HashMap<ExternalPlayerId, MemberId>,
    ratings: HashMap<ExternalPlayerId, Rating>,
    leaderboard: Vec<LeaderboardEntry>,
    unavailable: bool,
}

/// A rating authority held in memory. Players are known once they have a
/// rating; `link` mimics a completed `claimsteam`.
pub struct InMemoryRatingService {
    state: RwLock<RatingState>,
}

impl InMemoryRatingService {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RatingState::default()),
        }
    }

    pub fn add_player(
        &self,
        player_id: &str,
        rating: f64,
    ) {
        let mut state = write(&self.state);
        let player_id = ExternalPlayerId(player_id.to_string());
        state.hashes.insert(player_id.clone(), format!("hash-{player_id}"));
        state.ratings.insert(player_id, Rating(rating));
    }

    pub fn link(
        &self,
        player_id: &str,
        member_id: MemberId,
    ) {
        write(&self.state)
            .links
            .insert(ExternalPlayerId(player_id.to_string()), member_id);
    }

    pub fn set_leaderboard(
        &self,
        entries: Vec<LeaderboardEntry>,
    ) {
        write(&self.state).leaderboard = entries;
    }

    pub fn set_unavailable(
        &self,
        unavailable: bool,
    ) {
        write(&self.state).unavailable = unavailable;
    }

    pub fn linked_member(
        &self,
        player_id: &str,
    ) -> Option<MemberId> {
        read(&self.state)
            .links
            .get(&ExternalPlayerId(player_id.to_string()))
            .copied()
    }

    fn state(&self) -> Result<RwLockReadGuard<'_, RatingState>, RatingError> {
        let state = read(&self.state);
        if state.unavailable {
            return Err(RatingError::Unavailable("connection refused".into()));
        }
        Ok(state)
    }
}

impl Default for InMemoryRatingService {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(reason: &str) -> RatingError {
    RatingError::NotFound { reason: reason.into() }
}

#[async_trait]
impl RatingService for InMemoryRatingService {
    async fn steam_hash(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<String, RatingError> {
        if player_id.as_str().len() > 20 {
            return Err(RatingError::Invalid {
                reason: "too long".into(),
            });
        }
        self.state()?
            .hashes
            .get(player_id)
            .cloned()
            .ok_or_else(|| not_found("player not found"))
    }

    async fn register_member(
        &self,
        steam_hash: &str,
        member_id: MemberId,
    ) -> Result<(), RatingError> {
        let player_id = self
            .state()?
            .hashes
            .iter()
            .find(|(_, hash)| hash.as_str() == steam_hash)
            .map(|(player_id, _)| player_id.clone())
            .ok_or_else(|| not_found("unknown hash"))?;
        write(&self.state).links.insert(player_id, member_id);
        Ok(())
    }

    async fn player_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<ExternalPlayerId, RatingError> {
        self.state()?
            .links
            .iter()
            .find(|(_, linked)| **linked == member_id)
            .map(|(player_id, _)| player_id.clone())
            .ok_or_else(|| not_found("discord account not linked"))
    }

    async fn member_for_player(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<MemberId, RatingError> {
        self.state()?
            .links
            .get(player_id)
            .copied()
            .ok_or_else(|| not_found("steam account not linked"))
    }

    async fn rating(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<Rating, RatingError> {
        self.state()?
            .ratings
            .get(player_id)
            .copied()
            .ok_or_else(|| not_found("player not found"))
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RatingError> {
        Ok(self.state()?.leaderboard.clone())
    }
}
