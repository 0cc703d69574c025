use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use domain::{DEFAULT_PAGE_SIZE, LeaderboardPage, LeaderboardPager, PageDirection};

use crate::ServiceError;
use crate::ports::out_::RatingService;

/// Idle time after which a leaderboard view stops responding to navigation.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct LeaderboardSessionId(pub Uuid);

impl LeaderboardSessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LeaderboardSessionId {
    fn default() -> Self {
        LeaderboardSessionId::new()
    }
}

impl fmt::Display for LeaderboardSessionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Session {
    pager: LeaderboardPager,
    last_active: Instant,
}

/// Interactive leaderboard views. Each navigation fetches a fresh snapshot;
/// nothing here outlives the process.
pub struct LeaderboardService {
    rating: Arc<dyn RatingService>,
    sessions: Mutex<HashMap<LeaderboardSessionId, Session>>,
    page_size: usize,
    ttl: Duration,
}

impl LeaderboardService {
    pub fn new(rating: Arc<dyn RatingService>) -> Self {
        Self::with_settings(rating, DEFAULT_PAGE_SIZE, DEFAULT_SESSION_TTL)
    }

    pub fn with_settings(
        rating: Arc<dyn RatingService>,
        page_size: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            rating,
            sessions: Mutex::new(HashMap::new()),
            page_size,
            ttl,
        }
    }

    pub async fn open(&self) -> Result<(LeaderboardSessionId, LeaderboardPage), ServiceError> {
        let snapshot = self.rating.leaderboard().await?;
        let pager = LeaderboardPager::new(self.page_size);
        let page = pager.page(&snapshot);

        let session_id = LeaderboardSessionId::new();
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, session| !self.expired(session, now));
        sessions.insert(session_id, Session { pager, last_active: now });
        Ok((session_id, page))
    }

    /// `Ok(None)` when the view is unknown or has expired.
    pub async fn navigate(
        &self,
        session_id: LeaderboardSessionId,
        direction: PageDirection,
    ) -> Result<Option<LeaderboardPage>, ServiceError> {
        if !self.is_live(session_id) {
            debug!(%session_id, "Ignoring navigation on expired leaderboard");
            return Ok(None);
        }

        let snapshot = self.rating.leaderboard().await?;

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(session) = sessions.get_mut(&session_id) else {
            return Ok(None);
        };
        session.last_active = Instant::now();
        Ok(Some(session.pager.advance(direction, &snapshot)))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn is_live(
        &self,
        session_id: LeaderboardSessionId,
    ) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        match sessions.get(&session_id) {
            Some(session) if self.expired(session, now) => {
                sessions.remove(&session_id);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn expired(
        &self,
        session: &Session,
        now: Instant,
    ) -> bool {
        now.saturating_duration_since(session.last_active) >= self.ttl
    }
}
