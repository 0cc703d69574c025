use async_trait::async_trait;
use thiserror::Error;

use domain::{ChannelId, GuildId, MemberId, RoleAssignment, RoleCatalog};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("chat platform unreachable: {0}")]
    Unavailable(String),

    #[error("chat platform rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Guild membership and roles as the chat platform owns them.
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    /// Every guild the bot currently serves.
    async fn guilds(&self) -> Result<Vec<GuildId>, PlatformError>;

    async fn role_catalog(
        &self,
        guild_id: GuildId,
    ) -> Result<RoleCatalog, PlatformError>;

    /// `None` when the member is not in the guild.
    async fn member_roles(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
    ) -> Result<Option<RoleAssignment>, PlatformError>;

    /// Replaces the member's whole role set in one call.
    async fn replace_member_roles(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        roles: &RoleAssignment,
    ) -> Result<(), PlatformError>;
}

#[async_trait]
pub trait ChannelMessenger: Send + Sync {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<(), PlatformError>;
}
