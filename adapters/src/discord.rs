use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use application::ports::out_::{ChannelMessenger, GuildDirectory, PlatformError};
use domain::{ChannelId, GuildId, GuildRole, MemberId, RoleAssignment, RoleCatalog, RoleId};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = "DiscordBot (rank-bot, 0.1.0)";
/// Largest page `/users/@me/guilds` returns.
const GUILD_PAGE_LIMIT: usize = 200;

/// Discord ids travel as decimal strings.
#[derive(Debug, Clone, Copy)]
struct Snowflake(u64);

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map(Snowflake).map_err(serde::de::Error::custom)
    }
}

#[derive(Deserialize)]
struct PartialGuild {
    id: Snowflake,
}

#[derive(Deserialize)]
struct Role {
    id: Snowflake,
    name: String,
}

#[derive(Deserialize)]
struct Member {
    roles: Vec<Snowflake>,
}

#[derive(Serialize)]
struct ModifyMember {
    roles: Vec<String>,
}

#[derive(Serialize)]
struct AllowedMentions {
    parse: [&'static str; 1],
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    allowed_mentions: AllowedMentions,
}

/// Guild directory and messenger backed by the Discord REST API.
pub struct DiscordRest {
    client: Client,
    base_url: String,
}

impl DiscordRest {
    pub fn new(
        token: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Self::with_base_url(token, timeout, DISCORD_API_BASE)
    }

    pub fn with_base_url(
        token: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {token}")).context("Bot token is not a valid header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build Discord HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<Response, PlatformError> {
        let response = request
            .send()
            .await
            .map_err(|err| PlatformError::Unavailable(err.to_string()))?;
        let status = response.status();
        debug!(url = %response.url(), %status, "Discord response");
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(PlatformError::Unavailable(format!("status {status}")));
        }
        let message = response.text().await.unwrap_or_default();
        Err(PlatformError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, PlatformError> {
        let response = self.send(self.client.get(self.url(path))).await?;
        response
            .json()
            .await
            .map_err(|err| PlatformError::Unavailable(format!("malformed response: {err}")))
    }
}

#[async_trait]
impl GuildDirectory for DiscordRest {
    async fn guilds(&self) -> Result<Vec<GuildId>, PlatformError> {
        let mut guilds = Vec::new();
        let mut after = None;
        loop {
            let path = match after {
                Some(last) => format!("/users/@me/guilds?limit={GUILD_PAGE_LIMIT}&after={last}"),
                None => format!("/users/@me/guilds?limit={GUILD_PAGE_LIMIT}"),
            };
            let page: Vec<PartialGuild> = self.get_json(&path).await?;
            let full = page.len() >= GUILD_PAGE_LIMIT;
            after = page.last().map(|g| g.id.0);
            guilds.extend(page.into_iter().map(|g| GuildId(g.id.0)));
            if !full || after.is_none() {
                return Ok(guilds);
            }
        }
    }

    async fn role_catalog(
        &self,
        guild_id: GuildId,
    ) -> Result<RoleCatalog, PlatformError> {
        let roles: Vec<Role> = self.get_json(&format!("/guilds/{guild_id}/roles")).await?;
        Ok(RoleCatalog::new(
            roles
                .into_iter()
                .map(|r| GuildRole {
                    id: RoleId(r.id.0),
                    name: r.name,
                })
                .collect(),
        ))
    }

    async fn member_roles(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
    ) -> Result<Option<RoleAssignment>, PlatformError> {
        match self
            .get_json::<Member>(&format!("/guilds/{guild_id}/members/{member_id}"))
            .await
        {
            Ok(member) => Ok(Some(member.roles.into_iter().map(|r| RoleId(r.0)).collect())),
            Err(PlatformError::Rejected { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn replace_member_roles(
        &self,
        guild_id: GuildId,
        member_id: MemberId,
        roles: &RoleAssignment,
    ) -> Result<(), PlatformError> {
        let body = ModifyMember {
            roles: roles.iter().map(|r| r.to_string()).collect(),
        };
        let request = self
            .client
            .patch(self.url(&format!("/guilds/{guild_id}/members/{member_id}")))
            .json(&body);
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelMessenger for DiscordRest {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<(), PlatformError> {
        let body = CreateMessage {
            content,
            allowed_mentions: AllowedMentions { parse: ["users"] },
        };
        let request = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .json(&body);
        self.send(request).await?;
        Ok(())
    }
}
