use thiserror::Error;

use domain::{GuildId, MemberId};

use crate::ports::out_::{PlatformError, RatingError, StoreError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("member {0} has no linked player account")]
    NotLinked(MemberId),

    #[error("rating service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("guild {guild_id} has no role for the {tier} rank")]
    Configuration { guild_id: GuildId, tier: String },

    #[error("timed out waiting for another role update of member {member_id} in guild {guild_id}")]
    ConcurrencyConflict { guild_id: GuildId, member_id: MemberId },

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RatingError> for ServiceError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::NotFound { reason } => ServiceError::NotFound(reason),
            RatingError::Invalid { reason } => ServiceError::Validation(reason),
            RatingError::Unavailable(reason) => ServiceError::UpstreamUnavailable(reason),
        }
    }
}
