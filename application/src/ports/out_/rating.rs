use async_trait::async_trait;
use thiserror::Error;

use domain::{ExternalPlayerId, LeaderboardEntry, MemberId, Rating};

/// Outcome of a failed call to the rating authority.
///
/// `NotFound` and `Invalid` are answers from the service; `Unavailable`
/// covers transport failures, timeouts and unexpected statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("rejected: {reason}")]
    Invalid { reason: String },

    #[error("rating service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RatingService: Send + Sync {
    async fn steam_hash(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<String, RatingError>;

    async fn register_member(
        &self,
        steam_hash: &str,
        member_id: MemberId,
    ) -> Result<(), RatingError>;

    async fn player_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<ExternalPlayerId, RatingError>;

    async fn member_for_player(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<MemberId, RatingError>;

    async fn rating(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<Rating, RatingError>;

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RatingError>;
}
