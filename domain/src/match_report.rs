use serde::Serialize;
use thiserror::Error;

use crate::{ExternalPlayerId, MemberId, Rating, mention};

/// Longest external player id accepted from the match-report webhook.
pub const MAX_PLAYER_ID_LEN: usize = 32;
pub const MAX_DISPLAY_NAME_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchReportError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is {len} characters long, at most {max} are allowed")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("winner and loser are the same player")]
    SamePlayer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerResult {
    pub display_name: String,
    pub player_id: ExternalPlayerId,
    pub rating_before: Rating,
    pub rating_current: Rating,
}

impl PlayerResult {
    pub fn rating_delta(&self) -> f64 {
        self.rating_current.value() - self.rating_before.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    winner: PlayerResult,
    loser: PlayerResult,
}

impl MatchReport {
    pub fn new(
        winner: PlayerResult,
        loser: PlayerResult,
    ) -> Result<Self, MatchReportError> {
        check_player(&winner, "winnerName", "winnerSteamId", ["winnerEloBefore", "winnerEloCurrent"])?;
        check_player(&loser, "loserName", "loserSteamId", ["loserEloBefore", "loserEloCurrent"])?;
        if winner.player_id == loser.player_id {
            return Err(MatchReportError::SamePlayer);
        }
        Ok(Self { winner, loser })
    }

    pub fn winner(&self) -> &PlayerResult {
        &self.winner
    }

    pub fn loser(&self) -> &PlayerResult {
        &self.loser
    }
}

fn check_player(
    player: &PlayerResult,
    name_field: &'static str,
    id_field: &'static str,
    rating_fields: [&'static str; 2],
) -> Result<(), MatchReportError> {
    check_text(&player.display_name, name_field, MAX_DISPLAY_NAME_LEN)?;
    check_text(player.player_id.as_str(), id_field, MAX_PLAYER_ID_LEN)?;
    for (rating, field) in [player.rating_before, player.rating_current].into_iter().zip(rating_fields) {
        if !rating.value().is_finite() {
            return Err(MatchReportError::NonFinite { field });
        }
    }
    Ok(())
}

fn check_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<(), MatchReportError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(MatchReportError::Empty { field });
    }
    if len > max {
        return Err(MatchReportError::TooLong { field, len, max });
    }
    Ok(())
}

/// Whether the rating authority knows which chat member plays under an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "member_id", rename_all = "snake_case")]
pub enum PlayerLink {
    Linked(MemberId),
    Unlinked,
}

impl PlayerLink {
    pub fn member(self) -> Option<MemberId> {
        match self {
            PlayerLink::Linked(member_id) => Some(member_id),
            PlayerLink::Unlinked => None,
        }
    }

    fn mention(self) -> String {
        match self {
            PlayerLink::Linked(member_id) => mention(member_id),
            PlayerLink::Unlinked => "unlinked".to_string(),
        }
    }
}

/// Text posted to a guild's report channel for one finished match.
pub fn compose_notification(
    report: &MatchReport,
    winner: PlayerLink,
    loser: PlayerLink,
) -> String {
    format!(
        "**{}** ({}) defeated **{}** ({})\n{}\n{}",
        report.winner.display_name,
        winner.mention(),
        report.loser.display_name,
        loser.mention(),
        rating_line(&report.winner),
        rating_line(&report.loser),
    )
}

fn rating_line(player: &PlayerResult) -> String {
    format!(
        "{}: {} -> {} ({})",
        player.display_name,
        player.rating_before,
        player.rating_current,
        signed(player.rating_delta()),
    )
}

fn signed(delta: f64) -> String {
    let magnitude = Rating(delta.abs());
    if delta < 0.0 {
        format!("-{magnitude}")
    } else {
        format!("+{magnitude}")
    }
}
