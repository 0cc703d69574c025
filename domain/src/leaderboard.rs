use serde::{Deserialize, Serialize};

use crate::Rating;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub rating: Rating,
    /// Banned players stay in the snapshot but are never shown.
    pub excluded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageDirection {
    Previous,
    Next,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub position: usize,
    pub display_name: String,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardPage {
    pub first_index: usize,
    pub page_number: usize,
    pub page_count: usize,
    pub entries: Vec<RankedEntry>,
}

impl LeaderboardPage {
    pub fn render(&self) -> String {
        let mut text = String::from("**Leaderboard**\n");
        if self.entries.is_empty() {
            text.push_str("No ranked players yet.\n");
        }
        for entry in &self.entries {
            text.push_str(&format!("{}. {} - {}\n", entry.position, entry.display_name, entry.rating));
        }
        text.push_str(&format!("Page {}/{}", self.page_number, self.page_count));
        text
    }
}

/// Paging cursor over the visible (non-excluded) entries of a snapshot.
#[derive(Debug, Clone)]
pub struct LeaderboardPager {
    first_index: usize,
    page_size: usize,
}

impl Default for LeaderboardPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl LeaderboardPager {
    pub fn new(page_size: usize) -> Self {
        Self {
            first_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn first_index(&self) -> usize {
        self.first_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Moves one page in `direction` against a fresh snapshot, clamped to the
    /// first and last pages, and renders the page landed on.
    pub fn advance(
        &mut self,
        direction: PageDirection,
        snapshot: &[LeaderboardEntry],
    ) -> LeaderboardPage {
        let last = self.last_page_start(visible_count(snapshot));
        self.first_index = match direction {
            PageDirection::Next => self.first_index.saturating_add(self.page_size),
            PageDirection::Previous => self.first_index.saturating_sub(self.page_size),
        }
        .min(last);
        self.page(snapshot)
    }

    pub fn page(
        &self,
        snapshot: &[LeaderboardEntry],
    ) -> LeaderboardPage {
        let visible = visible_count(snapshot);
        let first_index = self.first_index.min(self.last_page_start(visible));
        let entries = snapshot
            .iter()
            .filter(|entry| !entry.excluded)
            .enumerate()
            .skip(first_index)
            .take(self.page_size)
            .map(|(i, entry)| RankedEntry {
                position: i + 1,
                display_name: entry.display_name.clone(),
                rating: entry.rating,
            })
            .collect();

        LeaderboardPage {
            first_index,
            page_number: first_index / self.page_size + 1,
            page_count: visible.div_ceil(self.page_size).max(1),
            entries,
        }
    }

    // Start of the last non-empty page.
    fn last_page_start(
        &self,
        visible: usize,
    ) -> usize {
        visible.saturating_sub(1) / self.page_size * self.page_size
    }
}

fn visible_count(snapshot: &[LeaderboardEntry]) -> usize {
    snapshot.iter().filter(|entry| !entry.excluded).count()
}
