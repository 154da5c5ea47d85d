use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngagementConfig;
use crate::models::PostView;

/// Feed ordering.
///
/// `Shuffle` is what any unrecognized sort string falls back to; it is a named
/// mode so the fallback can be changed in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    Recency,
    Popularity,
    Shuffle,
}

impl SortMode {
    /// Absent means recency. Matching is case-insensitive.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            None => SortMode::Recency,
            Some(s) if s == "recency" => SortMode::Recency,
            Some(s) if s == "popularity" => SortMode::Popularity,
            Some(_) => SortMode::Shuffle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Recency => "recency",
            SortMode::Popularity => "popularity",
            SortMode::Shuffle => "shuffle",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything the ranker can order
pub trait Rankable {
    fn created_at(&self) -> DateTime<Utc>;
    fn popularity(&self) -> i64;
}

impl Rankable for PostView {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn popularity(&self) -> i64 {
        self.popularity
    }
}

/// Order `items` in place. Recency and popularity are stable sorts, so equal
/// keys keep their input order.
pub fn rank<T: Rankable>(items: &mut [T], mode: SortMode) {
    match mode {
        SortMode::Recency => items.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        SortMode::Popularity => items.sort_by(|a, b| b.popularity().cmp(&a.popularity())),
        SortMode::Shuffle => items.shuffle(&mut rand::thread_rng()),
    }
}

/// Take the 1-based `page` of `size` items, clamped to what is available
pub fn paginate<T>(items: Vec<T>, page: usize, size: usize) -> Vec<T> {
    let start = page.max(1).saturating_sub(1).saturating_mul(size);
    items.into_iter().skip(start).take(size).collect()
}

/// Page size limits applied to incoming feed requests
#[derive(Debug, Clone, Copy)]
pub struct FeedRankingConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl FeedRankingConfig {
    /// Resolve a requested page size against the configured default and cap
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Default for FeedRankingConfig {
    fn default() -> Self {
        Self::from(&EngagementConfig::default())
    }
}

impl From<&EngagementConfig> for FeedRankingConfig {
    fn from(config: &EngagementConfig) -> Self {
        FeedRankingConfig {
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        created_at: DateTime<Utc>,
        popularity: i64,
    }

    impl Rankable for Item {
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn popularity(&self) -> i64 {
            self.popularity
        }
    }

    fn items() -> Vec<Item> {
        let t0 = Utc::now();
        vec![
            Item {
                name: "a",
                created_at: t0,
                popularity: 10,
            },
            Item {
                name: "b",
                created_at: t0 + Duration::minutes(2),
                popularity: 5,
            },
            Item {
                name: "c",
                created_at: t0 + Duration::minutes(1),
                popularity: 10,
            },
        ]
    }

    fn names(items: &[Item]) -> Vec<&'static str> {
        items.iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_parse_sort_mode() {
        assert_eq!(SortMode::parse(None), SortMode::Recency);
        assert_eq!(SortMode::parse(Some("Recency")), SortMode::Recency);
        assert_eq!(SortMode::parse(Some("POPULARITY")), SortMode::Popularity);
        assert_eq!(SortMode::parse(Some("popularty")), SortMode::Shuffle);
        assert_eq!(SortMode::parse(Some("")), SortMode::Shuffle);
    }

    #[test]
    fn test_popularity_keeps_input_order_on_ties() {
        let mut ranked = items();
        rank(&mut ranked, SortMode::Popularity);
        assert_eq!(names(&ranked), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_recency_puts_newest_first() {
        let mut ranked = items();
        rank(&mut ranked, SortMode::Recency);
        assert_eq!(names(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_shuffle_reaches_every_permutation() {
        let mut seen = HashSet::new();
        for _ in 0..600 {
            let mut ranked = items();
            rank(&mut ranked, SortMode::Shuffle);
            assert_eq!(ranked.len(), 3);
            seen.insert(names(&ranked));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_empty_input() {
        let mut empty: Vec<Item> = Vec::new();
        rank(&mut empty, SortMode::Popularity);
        assert!(paginate(empty, 1, 10).is_empty());
    }

    #[test]
    fn test_paginate_bounds() {
        let all: Vec<u32> = (1..=7).collect();
        assert_eq!(paginate(all.clone(), 1, 3), vec![1, 2, 3]);
        assert_eq!(paginate(all.clone(), 3, 3), vec![7]);
        assert!(paginate(all.clone(), 4, 3).is_empty());
        assert_eq!(paginate(all.clone(), 0, 3), vec![1, 2, 3]);
        assert!(paginate(all, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn test_page_size_clamp() {
        let config = FeedRankingConfig {
            default_page_size: 10,
            max_page_size: 50,
        };
        assert_eq!(config.page_size(None), 10);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(500)), 50);
    }
}
