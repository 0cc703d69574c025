mod command_service;
mod leaderboard_service;
mod match_report_service;
mod member_locks;
mod role_sync;

pub use command_service::{CommandReply, CommandService};
pub use leaderboard_service::{DEFAULT_SESSION_TTL, LeaderboardService, LeaderboardSessionId};
pub use match_report_service::{GuildReport, MatchReportProcessor, MatchReportSummary, NotificationStatus, PlayerSync};
pub use member_locks::{MemberLocks, MemberSlot};
pub use role_sync::{Observation, RoleSyncService, SyncOutcome};
