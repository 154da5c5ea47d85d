//! Dashboard Aggregator
//!
//! Pulls every active post, vote and comment once, scores each post from that
//! snapshot and rolls the scores up into post and author leaderboards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::authors::AuthorResolver;
use super::scoring::{popularity_score, PopularityInputs};
use crate::db::{CommentFilter, EntityStore, PostFilter, VoteFilter};
use crate::error::Result;
use crate::metrics::engagement::DASHBOARD_DURATION_SECONDS;
use crate::models::{
    DashboardCounts, DashboardSummary, PopularAuthor, PopularPost, Post, VoteKind,
};

/// Top `limit` posts by descending popularity; ties keep input order
pub fn top_posts(scored: &[PopularPost], limit: usize) -> Vec<PopularPost> {
    let mut ranked = scored.to_vec();
    ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    ranked.truncate(limit);
    ranked
}

/// Sum popularity per author and keep the top `limit`.
///
/// Authors are grouped in order of first appearance, so equal totals keep the
/// order in which their first post was seen.
pub fn top_authors(scored: &[PopularPost], limit: usize) -> Vec<(Uuid, i64)> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut totals: HashMap<Uuid, i64> = HashMap::new();
    for post in scored {
        let total = totals.entry(post.author_id).or_insert_with(|| {
            order.push(post.author_id);
            0
        });
        *total += post.popularity;
    }

    let mut ranked: Vec<(Uuid, i64)> = order
        .into_iter()
        .map(|id| (id, totals.get(&id).copied().unwrap_or_default()))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

#[derive(Clone)]
pub struct DashboardAggregator {
    store: Arc<dyn EntityStore>,
    authors: AuthorResolver,
    leaderboard_size: usize,
}

impl DashboardAggregator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        authors: AuthorResolver,
        leaderboard_size: usize,
    ) -> Self {
        Self {
            store,
            authors,
            leaderboard_size: leaderboard_size.max(1),
        }
    }

    pub async fn summarize(&self) -> Result<DashboardSummary> {
        let start = Instant::now();

        let posts = self.store.find_active_posts(&PostFilter::all()).await?;
        let votes = self.store.find_active_votes(&VoteFilter::all()).await?;
        let comments = self.store.find_active_comments(&CommentFilter::all()).await?;

        let counts = DashboardCounts {
            posts: posts.len(),
            comments: comments.len(),
            up_votes: votes.iter().filter(|v| v.kind == VoteKind::Up).count(),
            down_votes: votes.iter().filter(|v| v.kind == VoteKind::Down).count(),
        };

        let scored: Vec<PopularPost> = posts
            .iter()
            .map(|post: &Post| PopularPost {
                post_id: post.id,
                title: post.title.clone(),
                author_id: post.author_id,
                author_name: String::new(),
                popularity: popularity_score(&PopularityInputs::from_snapshot(
                    post.id, &votes, &comments,
                )),
            })
            .collect();

        // Names are resolved only for entries that survive truncation
        let mut names = HashMap::new();
        let mut popular_posts = top_posts(&scored, self.leaderboard_size);
        for entry in popular_posts.iter_mut() {
            let author = self
                .authors
                .resolve_cached(entry.author_id, &mut names)
                .await?;
            entry.author_name = author.display_name;
        }

        let mut popular_authors = Vec::new();
        for (author_id, popularity) in top_authors(&scored, self.leaderboard_size) {
            let author = self.authors.resolve_cached(author_id, &mut names).await?;
            popular_authors.push(PopularAuthor {
                author_id,
                display_name: author.display_name,
                popularity,
            });
        }

        let elapsed = start.elapsed().as_secs_f64();
        DASHBOARD_DURATION_SECONDS.observe(elapsed);
        debug!(
            posts = counts.posts,
            comments = counts.comments,
            elapsed_ms = elapsed * 1000.0,
            "Dashboard summarized"
        );

        Ok(DashboardSummary {
            counts,
            popular_posts,
            popular_authors,
        })
    }
}
