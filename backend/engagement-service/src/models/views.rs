//! Read-side projections returned by the feed, post detail and dashboard paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthorSummary;

/// One node of a materialized discussion tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub comment_id: Uuid,
    pub text: String,
    pub author: AuthorSummary,
    pub created_at: DateTime<Utc>,
    pub is_edited: bool,
    pub up_votes: usize,
    pub down_votes: usize,
    pub upvoted_by_viewer: bool,
    pub downvoted_by_viewer: bool,
    pub age_label: String,
    pub replies: Vec<CommentNode>,
}

/// A post with its vote rollup, popularity score and discussion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub post_id: Uuid,
    pub title: String,
    pub body: String,
    pub location: String,
    pub reaction: String,
    pub author: AuthorSummary,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub is_edited: bool,
    pub up_votes: usize,
    pub down_votes: usize,
    pub upvoted_by_viewer: bool,
    pub downvoted_by_viewer: bool,
    pub popularity: i64,
    /// Direct comments plus second-level replies
    pub comment_count: usize,
    pub age_label: String,
    pub comments: Vec<CommentNode>,
}

/// One page of a ranked feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPage {
    pub items: Vec<PostView>,
    /// Number of active posts considered before pagination
    pub total_count: usize,
    pub page: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub posts: usize,
    pub comments: usize,
    pub up_votes: usize,
    pub down_votes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularPost {
    pub post_id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    /// Display name from the Author Summary, or the placeholder name
    pub author_name: String,
    pub popularity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularAuthor {
    pub author_id: Uuid,
    pub display_name: String,
    pub popularity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub counts: DashboardCounts,
    pub popular_posts: Vec<PopularPost>,
    pub popular_authors: Vec<PopularAuthor>,
}
