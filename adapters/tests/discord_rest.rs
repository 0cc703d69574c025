//! `DiscordRest` against a stand-in Discord API on a local port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use adapters::DiscordRest;
use application::ports::out_::{ChannelMessenger, GuildDirectory, PlatformError};
use domain::{ChannelId, GuildId, MemberId, RoleAssignment, RoleId};

#[derive(Default)]
struct Recorded {
    guild_count: u64,
    guild_queries: Vec<HashMap<String, String>>,
    auth: Vec<String>,
    patches: Vec<(String, Value)>,
    messages: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<Recorded>>;

/// Serves guilds `1..=guild_count` in id order, honouring `limit` and `after`.
async fn guilds(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let after: u64 = query.get("after").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit: usize = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(200).min(200);

    let mut shared = shared.lock().unwrap();
    shared.auth.push(auth);
    shared.guild_queries.push(query);
    let page: Vec<Value> = (after + 1..=shared.guild_count)
        .take(limit)
        .map(|id| json!({ "id": id.to_string(), "name": format!("guild {id}") }))
        .collect();
    Json(Value::Array(page))
}

async fn roles(Path(guild): Path<String>) -> Response {
    match guild.as_str() {
        "1" => Json(json!([
            { "id": "100", "name": "Earth", "position": 1 },
            { "id": "101", "name": "Stardust", "position": 2 },
        ]))
        .into_response(),
        "3" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        _ => (StatusCode::FORBIDDEN, r#"{"message": "Missing Access", "code": 50001}"#).into_response(),
    }
}

async fn member(Path((_guild, member)): Path<(String, String)>) -> Response {
    match member.as_str() {
        "42" => Json(json!({ "roles": ["101", "900"], "nick": null })).into_response(),
        "429" => StatusCode::TOO_MANY_REQUESTS.into_response(),
        _ => (StatusCode::NOT_FOUND, r#"{"message": "Unknown Member", "code": 10007}"#).into_response(),
    }
}

async fn patch_member(
    State(shared): State<Shared>,
    Path((guild, member)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    shared.lock().unwrap().patches.push((format!("{guild}/{member}"), body.clone()));
    Json(body)
}

async fn create_message(
    State(shared): State<Shared>,
    Path(channel): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    shared.lock().unwrap().messages.push((channel, body));
    Json(json!({ "id": "1" }))
}

async fn serve() -> (DiscordRest, Shared) {
    let shared = Shared::default();
    shared.lock().unwrap().guild_count = 2;
    let app = Router::new()
        .route("/users/@me/guilds", get(guilds))
        .route("/guilds/{guild}/roles", get(roles))
        .route("/guilds/{guild}/members/{member}", get(member).patch(patch_member))
        .route("/channels/{channel}/messages", post(create_message))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let client = DiscordRest::with_base_url("secret", Duration::from_secs(2), &format!("http://{addr}")).unwrap();
    (client, shared)
}

#[tokio::test]
async fn lists_guilds_with_bot_token() {
    let (client, shared) = serve().await;

    let guilds = client.guilds().await.unwrap();

    assert_eq!(guilds, vec![GuildId(1), GuildId(2)]);
    assert_eq!(shared.lock().unwrap().auth, vec!["Bot secret".to_string()]);
}

#[tokio::test]
async fn follows_guild_pages_past_the_first_two_hundred() {
    let (client, shared) = serve().await;
    shared.lock().unwrap().guild_count = 250;

    let guilds = client.guilds().await.unwrap();

    assert_eq!(guilds.len(), 250);
    assert_eq!(guilds.first(), Some(&GuildId(1)));
    assert_eq!(guilds.last(), Some(&GuildId(250)));
    let queries = shared.lock().unwrap().guild_queries.clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].get("after"), None);
    assert_eq!(queries[1].get("after").map(String::as_str), Some("200"));
}

#[tokio::test]
async fn exactly_one_full_page_ends_on_an_empty_page() {
    let (client, shared) = serve().await;
    shared.lock().unwrap().guild_count = 200;

    let guilds = client.guilds().await.unwrap();

    assert_eq!(guilds.len(), 200);
    assert_eq!(shared.lock().unwrap().guild_queries.len(), 2);
}

#[tokio::test]
async fn reads_role_catalog() {
    let (client, _) = serve().await;

    let catalog = client.role_catalog(GuildId(1)).await.unwrap();

    assert_eq!(catalog.lookup("stardust"), Some(RoleId(101)));
    assert_eq!(catalog.lookup("Meteor"), None);
}

#[tokio::test]
async fn classifies_failures() {
    let (client, _) = serve().await;

    assert!(matches!(
        client.role_catalog(GuildId(2)).await,
        Err(PlatformError::Rejected { status: 403, .. })
    ));
    assert!(matches!(
        client.role_catalog(GuildId(3)).await,
        Err(PlatformError::Unavailable(_))
    ));
    assert!(matches!(
        client.member_roles(GuildId(1), MemberId(429)).await,
        Err(PlatformError::Unavailable(_))
    ));
}

#[tokio::test]
async fn member_roles_and_absent_member() {
    let (client, _) = serve().await;

    let roles = client.member_roles(GuildId(1), MemberId(42)).await.unwrap().unwrap();
    assert_eq!(roles, RoleAssignment::new([RoleId(101), RoleId(900)]));

    assert_eq!(client.member_roles(GuildId(1), MemberId(7)).await.unwrap(), None);
}

#[tokio::test]
async fn replaces_roles_in_one_patch() {
    let (client, shared) = serve().await;

    client
        .replace_member_roles(GuildId(1), MemberId(42), &RoleAssignment::new([RoleId(102), RoleId(900)]))
        .await
        .unwrap();

    assert_eq!(
        shared.lock().unwrap().patches,
        vec![("1/42".to_string(), json!({ "roles": ["102", "900"] }))]
    );
}

#[tokio::test]
async fn posts_message_pinging_users_only() {
    let (client, shared) = serve().await;

    client.send_message(ChannelId(500), "**A** (<@1>) defeated **B** (unlinked)").await.unwrap();

    assert_eq!(
        shared.lock().unwrap().messages,
        vec![(
            "500".to_string(),
            json!({
                "content": "**A** (<@1>) defeated **B** (unlinked)",
                "allowed_mentions": { "parse": ["users"] },
            })
        )]
    );
}
