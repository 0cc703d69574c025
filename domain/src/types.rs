use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake_id {
    ($name:ident) => {
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut fmt::Formatter<'_>,
            ) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(GuildId);
snowflake_id!(MemberId);
snowflake_id!(ChannelId);
snowflake_id!(RoleId);

/// Opaque identifier the rating authority uses for a player (a SteamID64 in practice).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
pub struct ExternalPlayerId(pub String);

impl ExternalPlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalPlayerId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, PartialOrd, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(pub f64);

impl Rating {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{:.1}", self.0)
        }
    }
}

/// Mention markup understood by the chat platform.
pub fn mention(member_id: MemberId) -> String {
    format!("<@{member_id}>")
}

pub fn channel_mention(channel_id: ChannelId) -> String {
    format!("<#{channel_id}>")
}
