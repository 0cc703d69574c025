mod leaderboard;
mod match_report;
mod rank;
mod reconcile;
mod roles;
mod types;

pub use leaderboard::{
    DEFAULT_PAGE_SIZE, LeaderboardEntry, LeaderboardPage, LeaderboardPager, PageDirection, RankedEntry,
};
pub use match_report::{
    MAX_DISPLAY_NAME_LEN, MAX_PLAYER_ID_LEN, MatchReport, MatchReportError, PlayerLink, PlayerResult,
    compose_notification,
};
pub use rank::{RankTable, RankTableError, RankTier, standard_tiers};
pub use reconcile::{ReconcileError, RoleReconciliation, plan};
pub use roles::{GuildRole, RoleAssignment, RoleCatalog};
pub use types::{ChannelId, ExternalPlayerId, GuildId, MemberId, Rating, RoleId, channel_mention, mention};
