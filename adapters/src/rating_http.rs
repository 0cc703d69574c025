use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use application::ports::out_::{RatingError, RatingService};
use domain::{ExternalPlayerId, LeaderboardEntry, MemberId, Rating};

const USER_AGENT: &str = "StarlightRankBot/0.1";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardRow {
    steam_name: String,
    rating: f64,
    #[serde(default)]
    banned: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDiscord<'a> {
    steam_hash: &'a str,
    discord_id: u64,
}

/// Client for the ranked server's HTTP API.
///
/// Every call is bounded by the client timeout. A 400 carries a short reason
/// and is the service's "no" answer; any other non-200 status, a transport
/// error, or a timeout is reported as `Unavailable`.
pub struct HttpRatingService {
    client: Client,
    base_url: String,
}

impl HttpRatingService {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Self::build_client(timeout)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_client(timeout: Duration) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build rating service HTTP client")
    }

    fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RatingError> {
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RatingError> {
        let response = request.send().await.map_err(unavailable)?;
        let response = check_status(response).await?;
        response.json().await.map_err(unavailable)
    }
}

fn unavailable(err: reqwest::Error) -> RatingError {
    RatingError::Unavailable(err.to_string())
}

async fn check_status(response: Response) -> Result<Response, RatingError> {
    let status = response.status();
    debug!(url = %response.url(), %status, "Rating service response");
    match status {
        StatusCode::OK => Ok(response),
        StatusCode::BAD_REQUEST => {
            let reason = response.text().await.unwrap_or_default();
            let reason = reason.trim().trim_matches('"').to_string();
            if reason.contains("too long") {
                Err(RatingError::Invalid { reason })
            } else {
                Err(RatingError::NotFound { reason })
            }
        }
        other => Err(RatingError::Unavailable(format!("unexpected status {other}"))),
    }
}

/// Ids arrive either as JSON numbers or numeric strings.
fn id_text(value: Value) -> Result<String, RatingError> {
    match value {
        Value::Number(n) if n.is_u64() => Ok(n.to_string()),
        Value::String(s) if !s.is_empty() => Ok(s),
        other => Err(RatingError::Unavailable(format!("malformed id in response: {other}"))),
    }
}

#[async_trait]
impl RatingService for HttpRatingService {
    async fn steam_hash(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<String, RatingError> {
        self.get("gethash", &[("id", player_id.as_str())]).await
    }

    async fn register_member(
        &self,
        steam_hash: &str,
        member_id: MemberId,
    ) -> Result<(), RatingError> {
        let body = RegisterDiscord {
            steam_hash,
            discord_id: member_id.0,
        };
        let request = self.client.post(self.url("registerdiscord")).json(&body);
        let response = request.send().await.map_err(unavailable)?;
        check_status(response).await?;
        Ok(())
    }

    async fn player_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<ExternalPlayerId, RatingError> {
        let member = member_id.to_string();
        let value: Value = self.get("disc2steam", &[("discordId", &member)]).await?;
        id_text(value).map(ExternalPlayerId)
    }

    async fn member_for_player(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<MemberId, RatingError> {
        let value: Value = self.get("steam2disc", &[("steamId", player_id.as_str())]).await?;
        let text = id_text(value)?;
        text.parse()
            .map(MemberId)
            .map_err(|_| RatingError::Unavailable(format!("malformed discord id in response: {text}")))
    }

    async fn rating(
        &self,
        player_id: &ExternalPlayerId,
    ) -> Result<Rating, RatingError> {
        let rating: f64 = self.get("getrank", &[("player", player_id.as_str())]).await?;
        Ok(Rating(rating))
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RatingError> {
        let rows: Vec<LeaderboardRow> = self.get("leaderboard", &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                display_name: row.steam_name,
                rating: Rating(row.rating),
                excluded: row.banned,
            })
            .collect())
    }
}
