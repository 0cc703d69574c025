mod channels;
mod guild;
mod rating;

pub use channels::{ReportChannelRegistry, StoreError};
pub use guild::{ChannelMessenger, GuildDirectory, PlatformError};
pub use rating::{RatingError, RatingService};
