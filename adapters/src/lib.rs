mod discord;
mod in_memory;
mod rating_http;
mod sqlite_channels;
pub mod web;

pub use discord::{DISCORD_API_BASE, DiscordRest};
pub use in_memory::{InMemoryGuilds, InMemoryRatingService, InMemoryReportChannels};
pub use rating_http::HttpRatingService;
pub use sqlite_channels::SqliteReportChannels;
