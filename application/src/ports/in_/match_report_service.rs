use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use domain::{GuildId, MatchReport, PlayerLink, PlayerResult, RoleId, compose_notification};

use super::role_sync::{Observation, RoleSyncService, SyncOutcome};
use crate::ServiceError;
use crate::ports::out_::{ChannelMessenger, GuildDirectory, RatingError, RatingService, ReportChannelRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    /// No report channel is configured for the guild.
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerSync {
    /// No member is linked to the player, so nothing was reconciled.
    Unlinked,
    Updated {
        tier: Option<String>,
        added: Vec<RoleId>,
        removed: Vec<RoleId>,
    },
    Unchanged {
        tier: Option<String>,
    },
    NotMember,
    Superseded,
    Failed {
        error: String,
    },
}

impl PlayerSync {
    pub fn is_failure(&self) -> bool {
        matches!(self, PlayerSync::Failed { .. })
    }
}

impl From<SyncOutcome> for PlayerSync {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Updated { tier, added, removed } => PlayerSync::Updated { tier, added, removed },
            SyncOutcome::Unchanged { tier } => PlayerSync::Unchanged { tier },
            SyncOutcome::NotMember => PlayerSync::NotMember,
            SyncOutcome::Superseded => PlayerSync::Superseded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuildReport {
    pub guild_id: GuildId,
    pub notification: NotificationStatus,
    pub winner: PlayerSync,
    pub loser: PlayerSync,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReportSummary {
    pub winner: PlayerLink,
    pub loser: PlayerLink,
    pub guilds: Vec<GuildReport>,
}

impl MatchReportSummary {
    pub fn guild(
        &self,
        guild_id: GuildId,
    ) -> Option<&GuildReport> {
        self.guilds.iter().find(|g| g.guild_id == guild_id)
    }
}

/// Fans one finished match out to every served guild: a notification in the
/// guild's report channel and a role sync for each linked player.
pub struct MatchReportProcessor {
    rating: Arc<dyn RatingService>,
    directory: Arc<dyn GuildDirectory>,
    messenger: Arc<dyn ChannelMessenger>,
    channels: Arc<dyn ReportChannelRegistry>,
    role_sync: Arc<RoleSyncService>,
}

impl MatchReportProcessor {
    pub fn new(
        rating: Arc<dyn RatingService>,
        directory: Arc<dyn GuildDirectory>,
        messenger: Arc<dyn ChannelMessenger>,
        channels: Arc<dyn ReportChannelRegistry>,
        role_sync: Arc<RoleSyncService>,
    ) -> Self {
        Self {
            rating,
            directory,
            messenger,
            channels,
            role_sync,
        }
    }

    /// Fails only when identities or the guild list cannot be fetched;
    /// everything after that is isolated per guild and per player.
    pub async fn process(
        &self,
        report: &MatchReport,
    ) -> Result<MatchReportSummary, ServiceError> {
        let observation = self.role_sync.observe();

        let (winner, loser) = tokio::try_join!(self.resolve(report.winner()), self.resolve(report.loser()))?;
        let guilds = self.directory.guilds().await?;

        let guilds = join_all(
            guilds
                .into_iter()
                .map(|guild_id| self.process_guild(guild_id, report, winner, loser, observation)),
        )
        .await;

        info!(
            winner = %report.winner().display_name,
            loser = %report.loser().display_name,
            guilds = guilds.len(),
            "Processed match report"
        );
        Ok(MatchReportSummary { winner, loser, guilds })
    }

    async fn resolve(
        &self,
        player: &PlayerResult,
    ) -> Result<PlayerLink, ServiceError> {
        match self.rating.member_for_player(&player.player_id).await {
            Ok(member_id) => Ok(PlayerLink::Linked(member_id)),
            Err(RatingError::NotFound { .. } | RatingError::Invalid { .. }) => {
                info!(player_id = %player.player_id, "Player has no linked member");
                Ok(PlayerLink::Unlinked)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn process_guild(
        &self,
        guild_id: GuildId,
        report: &MatchReport,
        winner: PlayerLink,
        loser: PlayerLink,
        observation: Observation,
    ) -> GuildReport {
        let (notification, winner_sync, loser_sync) = tokio::join!(
            self.notify(guild_id, report, winner, loser),
            self.sync_player(guild_id, winner, report.winner(), observation),
            self.sync_player(guild_id, loser, report.loser(), observation),
        );
        GuildReport {
            guild_id,
            notification,
            winner: winner_sync,
            loser: loser_sync,
        }
    }

    async fn notify(
        &self,
        guild_id: GuildId,
        report: &MatchReport,
        winner: PlayerLink,
        loser: PlayerLink,
    ) -> NotificationStatus {
        let channel_id = match self.channels.report_channel(guild_id).await {
            Ok(Some(channel_id)) => channel_id,
            Ok(None) => return NotificationStatus::Skipped,
            Err(err) => {
                warn!(%guild_id, error = %err, "Failed to read report channel");
                return NotificationStatus::Failed { error: err.to_string() };
            }
        };

        let content = compose_notification(report, winner, loser);
        match self.messenger.send_message(channel_id, &content).await {
            Ok(()) => NotificationStatus::Sent,
            Err(err) => {
                warn!(%guild_id, %channel_id, error = %err, "Failed to post match report");
                NotificationStatus::Failed { error: err.to_string() }
            }
        }
    }

    async fn sync_player(
        &self,
        guild_id: GuildId,
        link: PlayerLink,
        player: &PlayerResult,
        observation: Observation,
    ) -> PlayerSync {
        let Some(member_id) = link.member() else {
            return PlayerSync::Unlinked;
        };
        match self
            .role_sync
            .sync_member(guild_id, member_id, Some(player.rating_current), observation)
            .await
        {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                warn!(%guild_id, %member_id, error = %err, "Role sync failed");
                PlayerSync::Failed { error: err.to_string() }
            }
        }
    }
}
