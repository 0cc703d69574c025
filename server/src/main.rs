mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use adapters::web::{AppState, build_router};
use adapters::{DiscordRest, HttpRatingService, SqliteReportChannels};
use application::ports::in_::{
    CommandService, LeaderboardService, MatchReportProcessor, MemberLocks, RoleSyncService,
};
use application::ports::out_::{ChannelMessenger, GuildDirectory, RatingService, ReportChannelRegistry};
use domain::{DEFAULT_PAGE_SIZE, RankTable};

use config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = Settings::from_env()?;
    let table = Arc::new(RankTable::standard().context("Rank table is invalid")?);
    info!(tiers = table.tiers().len(), "Rank table loaded");

    let rating: Arc<dyn RatingService> = Arc::new(HttpRatingService::new(
        &settings.ranked_api_url,
        settings.http_timeout,
    )?);
    let discord = Arc::new(DiscordRest::new(&settings.discord_token, settings.http_timeout)?);
    let directory: Arc<dyn GuildDirectory> = discord.clone();
    let messenger: Arc<dyn ChannelMessenger> = discord;
    let channels: Arc<dyn ReportChannelRegistry> = Arc::new(
        SqliteReportChannels::open(&settings.report_channels_db)
            .with_context(|| format!("Failed to open {}", settings.report_channels_db))?,
    );

    let role_sync = Arc::new(RoleSyncService::new(table, directory.clone(), MemberLocks::default()));
    let leaderboard = Arc::new(LeaderboardService::with_settings(
        rating.clone(),
        DEFAULT_PAGE_SIZE,
        settings.leaderboard_ttl,
    ));
    let commands = Arc::new(CommandService::new(
        rating.clone(),
        channels.clone(),
        role_sync.clone(),
        leaderboard,
    ));
    let processor = Arc::new(MatchReportProcessor::new(rating, directory, messenger, channels, role_sync));

    let state = Arc::new(AppState::new(processor, commands));
    let app = build_router(state.clone()).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    info!("Server listening on {}", settings.bind_addr);

    let grace = settings.shutdown_grace;
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = shutdown_tx.send(true);
            })
            .await
            .context("Server crashed")?;
        if !state.in_flight.is_empty() {
            info!(reports = state.in_flight.len(), "Waiting for in-flight match reports");
        }
        state.in_flight.drain().await;
        anyhow::Ok(())
    };
    let deadline = async move {
        if shutdown_rx.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result?,
        () = deadline => warn!(
            grace_secs = grace.as_secs(),
            "Shutdown deadline passed with match reports still in flight"
        ),
    }

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received, draining in-flight requests");
}

