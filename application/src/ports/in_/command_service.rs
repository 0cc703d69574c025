use std::sync::Arc;

use tracing::{info, warn};

use domain::{ChannelId, ExternalPlayerId, GuildId, MemberId, PageDirection, channel_mention};

use super::leaderboard_service::{LeaderboardService, LeaderboardSessionId};
use super::role_sync::{RoleSyncService, SyncOutcome};
use crate::ServiceError;
use crate::ports::out_::{RatingError, RatingService, ReportChannelRegistry};

/// Longest SteamID64 accepted by `claimsteam`.
pub const MAX_STEAM_ID_LEN: usize = 20;

const TOO_LONG: &str = "This SteamID is too long; are you sure you got it right?";
const NOT_PLAYED: &str = "Your SteamID doesn't seem to have played Ranked yet.";
const NOT_LINKED: &str = "Your Discord account is not connected to any Steam account. Use /claimsteam [steamid64].";
const UNAVAILABLE: &str = "The ranked server can't be reached right now. Please try again in a few minutes.";

/// Reply to the member who invoked a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReply {
    pub content: String,
    pub ephemeral: bool,
    /// Set when the reply is a leaderboard view that accepts navigation.
    pub leaderboard: Option<LeaderboardSessionId>,
}

impl CommandReply {
    fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            leaderboard: None,
        }
    }

    fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
            leaderboard: None,
        }
    }
}

/// The slash commands, independent of how the platform delivers them.
pub struct CommandService {
    rating: Arc<dyn RatingService>,
    channels: Arc<dyn ReportChannelRegistry>,
    role_sync: Arc<RoleSyncService>,
    leaderboard: Arc<LeaderboardService>,
}

impl CommandService {
    pub fn new(
        rating: Arc<dyn RatingService>,
        channels: Arc<dyn ReportChannelRegistry>,
        role_sync: Arc<RoleSyncService>,
        leaderboard: Arc<LeaderboardService>,
    ) -> Self {
        Self {
            rating,
            channels,
            role_sync,
            leaderboard,
        }
    }

    /// `claimsteam`: link the invoking member to a SteamID64.
    pub async fn claim_steam(
        &self,
        member_id: MemberId,
        steam_id: &str,
    ) -> CommandReply {
        match self.try_claim_steam(member_id, steam_id).await {
            Ok(()) => {
                info!(%member_id, "Linked Steam account");
                CommandReply::private("Your SteamID is now connected to your Discord!")
            }
            Err(ServiceError::Validation(reason)) if reason.contains("too long") => CommandReply::private(TOO_LONG),
            Err(ServiceError::Validation(_)) => {
                CommandReply::private("A SteamID64 is a number like 76561198000000000; please check it and try again.")
            }
            Err(ServiceError::NotFound(_)) => CommandReply::private(NOT_PLAYED),
            Err(err) => failure_reply(&err),
        }
    }

    async fn try_claim_steam(
        &self,
        member_id: MemberId,
        steam_id: &str,
    ) -> Result<(), ServiceError> {
        let steam_id = steam_id.trim();
        if steam_id.len() > MAX_STEAM_ID_LEN {
            return Err(ServiceError::Validation("steam id is too long".into()));
        }
        if steam_id.is_empty() || !steam_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ServiceError::Validation("steam id must be decimal digits".into()));
        }

        let hash = self.rating.steam_hash(&ExternalPlayerId(steam_id.to_string())).await?;
        self.rating.register_member(&hash, member_id).await?;
        Ok(())
    }

    /// `updaterole`: reconcile the invoking member's badge in this guild.
    pub async fn update_role(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
    ) -> CommandReply {
        let observation = self.role_sync.observe();
        let result = async {
            let player_id = self.rating.player_for_member(member_id).await.map_err(|err| not_linked(err, member_id))?;
            let rating = self.rating.rating(&player_id).await.map_err(|err| not_linked(err, member_id))?;
            self.role_sync
                .sync_member(guild_id, member_id, Some(rating), observation)
                .await
        }
        .await;

        match result {
            Ok(SyncOutcome::Updated { tier: Some(tier), .. }) => {
                CommandReply::private(format!("You have been given the **{tier}** role."))
            }
            Ok(SyncOutcome::Unchanged { tier: Some(tier) }) => {
                CommandReply::private(format!("You already have the **{tier}** role."))
            }
            Ok(SyncOutcome::Updated { tier: None, .. } | SyncOutcome::Unchanged { tier: None }) => {
                CommandReply::private("You don't have a rank yet. Play a ranked match first!")
            }
            Ok(SyncOutcome::NotMember) => CommandReply::private("You need to be a member of this server to get a role."),
            Ok(SyncOutcome::Superseded) => {
                CommandReply::private("Your role was just updated from a newer match result.")
            }
            Err(err) => {
                warn!(%guild_id, %member_id, error = %err, "updaterole failed");
                failure_reply(&err)
            }
        }
    }

    /// `setreportchannel`: post this guild's match reports in `channel_id`.
    pub async fn set_report_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> CommandReply {
        match self.channels.set_report_channel(guild_id, channel_id).await {
            Ok(()) => {
                info!(%guild_id, %channel_id, "Report channel set");
                CommandReply::private(format!(
                    "Match reports will now be posted in {}.",
                    channel_mention(channel_id)
                ))
            }
            Err(err) => {
                warn!(%guild_id, error = %err, "setreportchannel failed");
                failure_reply(&ServiceError::from(err))
            }
        }
    }

    /// `leaderboard`: open a paged view on the first page.
    pub async fn leaderboard(&self) -> CommandReply {
        match self.leaderboard.open().await {
            Ok((session_id, page)) => CommandReply {
                leaderboard: Some(session_id),
                ..CommandReply::public(page.render())
            },
            Err(err) => failure_reply(&err),
        }
    }

    /// A previous/next click on a leaderboard view. `None` once the view has
    /// expired, so the click does nothing.
    pub async fn navigate_leaderboard(
        &self,
        session_id: LeaderboardSessionId,
        direction: PageDirection,
    ) -> Option<CommandReply> {
        match self.leaderboard.navigate(session_id, direction).await {
            Ok(page) => page.map(|page| CommandReply {
                leaderboard: Some(session_id),
                ..CommandReply::public(page.render())
            }),
            Err(err) => Some(failure_reply(&err)),
        }
    }
}

fn not_linked(
    err: RatingError,
    member_id: MemberId,
) -> ServiceError {
    match err {
        RatingError::NotFound { .. } | RatingError::Invalid { .. } => ServiceError::NotLinked(member_id),
        other => other.into(),
    }
}

fn failure_reply(err: &ServiceError) -> CommandReply {
    let content = match err {
        ServiceError::Validation(reason) => format!("That doesn't look right: {reason}."),
        ServiceError::NotFound(_) => NOT_PLAYED.to_string(),
        ServiceError::NotLinked(_) => NOT_LINKED.to_string(),
        ServiceError::UpstreamUnavailable(_) => UNAVAILABLE.to_string(),
        ServiceError::Configuration { tier, .. } => {
            format!("The role for the **{tier}** rank is missing. Ask a server admin to create it.")
        }
        ServiceError::ConcurrencyConflict { .. } => {
            "Your roles are being updated right now. Please try again shortly.".to_string()
        }
        ServiceError::Platform(_) => {
            "Discord refused the change. Make sure the bot's role sits above the rank roles.".to_string()
        }
        ServiceError::Store(_) => "Couldn't save that setting. Please try again.".to_string(),
    };
    CommandReply::private(content)
}
