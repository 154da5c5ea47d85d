/// Business logic layer for engagement-service
///
/// This module provides:
/// - Authors: Author Summary lookup with the placeholder fallback
/// - Vote ledger: exclusive up/down votes on posts and comments
/// - Scoring: the popularity formula and per-post vote rollups
/// - Comment trees: shallow and full discussion materialization
/// - Feed ranking: sort modes and pagination
/// - Dashboard: counts and post/author leaderboards
/// - `EngagementService`: the facade tying them together
pub mod authors;
pub mod comment_tree;
pub mod dashboard;
pub mod engagement;
pub mod feed_ranking;
pub mod scoring;
pub mod time_label;
pub mod vote_ledger;

// Re-export commonly used services
pub use authors::AuthorResolver;
pub use comment_tree::{CommentTreeAssembler, TreeMode};
pub use dashboard::DashboardAggregator;
pub use engagement::{EngagementService, FeedQuery};
pub use feed_ranking::{FeedRankingConfig, SortMode};
pub use scoring::{popularity_score, PopularityInputs, PostStats};
pub use time_label::relative_age_label;
pub use vote_ledger::{VoteLedger, VoteTally};
