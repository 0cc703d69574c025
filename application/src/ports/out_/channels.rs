use async_trait::async_trait;
use thiserror::Error;

use domain::{ChannelId, GuildId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("report channel store failed: {0}")]
pub struct StoreError(pub String);

#[async_trait]
pub trait ReportChannelRegistry: Send + Sync {
    async fn report_channel(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<ChannelId>, StoreError>;

    /// Inserts or replaces the guild's report channel.
    async fn set_report_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError>;
}
