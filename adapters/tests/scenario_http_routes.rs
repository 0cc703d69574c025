//! The ingress router, driven in-process through `tower::ServiceExt::oneshot`
//! and over a real socket where the connection itself matters.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tower::ServiceExt;

use adapters::web::{AppState, build_router};
use domain::{ChannelId, GuildId, MemberId};

use common::*;

const GUILD: GuildId = GuildId(1);

fn router(world: &World) -> axum::Router {
    build_router(Arc::new(AppState::new(world.processor.clone(), world.commands.clone())))
}

async fn call(
    router: axum::Router,
    request: Request<Body>,
) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn post_report(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/reportmatch")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn report_body() -> Value {
    json!({
        "winnerName": "Alice",
        "loserName": "Bob",
        "winnerEloBefore": 690.0,
        "loserEloBefore": 905.0,
        "winnerEloCurrent": 710.0,
        "loserEloCurrent": 895.0,
        "winnerSteamId": "76561198000000001",
        "loserSteamId": "76561198000000002",
    })
}

#[tokio::test]
async fn index_greets() {
    let world = World::new();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let (status, body) = call(router(&world), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Hello, Yomi Ranked!");
}

#[tokio::test]
async fn report_returns_per_guild_summary() {
    let world = World::new();
    world.rating.link("76561198000000001", MemberId(11));
    world.guilds.add_guild(GUILD, LOWER_RANKS);
    world.guilds.add_member(GUILD, MemberId(11), &[STARDUST]);
    world.commands.set_report_channel(GUILD, ChannelId(500)).await;

    let (status, body) = call(router(&world), post_report(&report_body().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["winner"], json!({ "status": "linked", "member_id": 11 }));
    assert_eq!(json["loser"], json!({ "status": "unlinked" }));
    assert_eq!(json["guilds"][0]["guild_id"], 1);
    assert_eq!(json["guilds"][0]["notification"]["status"], "sent");
    assert_eq!(json["guilds"][0]["winner"]["status"], "updated");
    assert_eq!(json["guilds"][0]["winner"]["tier"], "Meteor");
    assert_eq!(json["guilds"][0]["loser"]["status"], "unlinked");
    assert_eq!(roles(&world, GUILD, MemberId(11)), vec![METEOR]);
}

#[tokio::test]
async fn missing_field_is_bad_request() {
    let world = World::new();
    let mut body = report_body();
    body.as_object_mut().unwrap().remove("loserSteamId");

    let (status, body) = call(router(&world), post_report(&body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "error");
    assert!(json["error"].as_str().unwrap().contains("loserSteamId"), "{json}");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let world = World::new();

    let (status, _) = call(router(&world), post_report("{\"winnerName\":")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_player_id_is_bad_request() {
    let world = World::new();
    let mut body = report_body();
    body["winnerSteamId"] = json!("   ");

    let (status, _) = call(router(&world), post_report(&body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(world.guilds.messages().is_empty());
}

#[tokio::test]
async fn same_player_on_both_sides_is_bad_request() {
    let world = World::new();
    let mut body = report_body();
    body["loserSteamId"] = json!("76561198000000001");

    let (status, _) = call(router(&world), post_report(&body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rating_outage_is_bad_gateway() {
    let world = World::new();
    world.rating.set_unavailable(true);
    world.guilds.add_guild(GUILD, LOWER_RANKS);

    let (status, body) = call(router(&world), post_report(&report_body().to_string())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "error");
    assert!(world.guilds.role_writes().is_empty());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let world = World::new();
    let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();

    let (status, _) = call(router(&world), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn report_completes_after_sender_hangs_up() {
    let world = World::new();
    world.rating.link("76561198000000001", MemberId(11));
    world.guilds.add_guild(GUILD, LOWER_RANKS);
    world.guilds.add_member(GUILD, MemberId(11), &[STARDUST]);
    world.guilds.set_write_delay(Duration::from_millis(300));

    let state = Arc::new(AppState::new(world.processor.clone(), world.commands.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let body = report_body().to_string();
    let request = format!(
        "POST /reportmatch HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    for _ in 0..100 {
        if !state.in_flight.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(state.in_flight.len(), 1);
    drop(stream);

    state.in_flight.drain().await;

    assert_eq!(roles(&world, GUILD, MemberId(11)), vec![METEOR]);
    assert_eq!(world.guilds.role_writes().len(), 1);
}
