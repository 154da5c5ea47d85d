/// Entity Store access layer
///
/// This module provides:
/// - `EntityStore`: the read/write surface the engagement engine needs from
///   the platform's entity storage
/// - `PgEntityStore`: PostgreSQL implementation backed by the repositories below
/// - `MemoryEntityStore`: in-process implementation for tests and local runs
///
/// Finders only return active rows. By-id getters return inactive rows too so
/// callers can tell "absent" from "soft-deleted".
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AuthorSummary, Comment, Post, Revision, Target, Vote, VoteKind};

pub mod comment_repo;
pub mod memory;
pub mod pg_store;
pub mod post_repo;
pub mod vote_repo;

pub use memory::MemoryEntityStore;
pub use pg_store::PgEntityStore;

/// Filter for active posts
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        post.is_active && self.author_id.map_or(true, |id| post.author_id == id)
    }
}

/// Filter for active comments. `targets: None` selects every active comment.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub targets: Option<Vec<Target>>,
}

impl CommentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn on(target: Target) -> Self {
        Self {
            targets: Some(vec![target]),
        }
    }

    pub fn on_any(targets: Vec<Target>) -> Self {
        Self {
            targets: Some(targets),
        }
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        comment.is_active
            && self
                .targets
                .as_ref()
                .map_or(true, |targets| targets.contains(&comment.target))
    }

    /// Split the target list into (post ids, comment ids) for SQL `ANY` binds
    pub(crate) fn split_targets(&self) -> (Vec<Uuid>, Vec<Uuid>) {
        let mut post_ids = Vec::new();
        let mut comment_ids = Vec::new();
        for target in self.targets.iter().flatten() {
            match target {
                Target::Post(id) => post_ids.push(*id),
                Target::Comment(id) => comment_ids.push(*id),
            }
        }
        (post_ids, comment_ids)
    }
}

/// Filter for active votes. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct VoteFilter {
    pub target: Option<Target>,
    pub voter_id: Option<Uuid>,
    pub kind: Option<VoteKind>,
}

impl VoteFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn on(target: Target) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn by_voter(mut self, voter_id: Uuid) -> Self {
        self.voter_id = Some(voter_id);
        self
    }

    pub fn matches(&self, vote: &Vote) -> bool {
        vote.is_active
            && self.target.map_or(true, |t| vote.target == t)
            && self.voter_id.map_or(true, |id| vote.voter_id == id)
            && self.kind.map_or(true, |k| vote.kind == k)
    }
}

/// Storage contract consumed by the engagement engine.
///
/// `supersede_votes`, `retract_votes` and `apply_post_edit` are atomic units:
/// implementations must not let a concurrent writer observe or interleave with
/// their intermediate state.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_active_posts(&self, filter: &PostFilter) -> Result<Vec<Post>>;
    async fn find_active_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>>;
    async fn find_active_votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>>;

    async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>>;
    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;
    async fn get_author(&self, user_id: Uuid) -> Result<Option<AuthorSummary>>;
    async fn revisions_for_post(&self, post_id: Uuid) -> Result<Vec<Revision>>;

    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    async fn update_post(&self, post: &Post) -> Result<()>;
    async fn update_comment(&self, comment: &Comment) -> Result<()>;

    /// Deactivate every active counted vote `vote.voter_id` holds on
    /// `vote.target`, then insert `vote`. Returns how many votes were retired.
    async fn supersede_votes(&self, vote: &Vote) -> Result<u64>;

    /// Deactivate every active vote on `target`, whoever cast it.
    async fn retract_votes(&self, target: Target) -> Result<u64>;

    /// Append `revision` and persist `post` in one unit.
    async fn apply_post_edit(&self, revision: &Revision, post: &Post) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_comment_filter_split() {
        let p = Uuid::new_v4();
        let c = Uuid::new_v4();
        let filter = CommentFilter::on_any(vec![Target::Post(p), Target::Comment(c)]);
        let (posts, comments) = filter.split_targets();
        assert_eq!(posts, vec![p]);
        assert_eq!(comments, vec![c]);
    }

    #[test]
    fn test_vote_filter_matches() {
        let voter = Uuid::new_v4();
        let target = Target::Post(Uuid::new_v4());
        let mut vote = Vote::new(voter, target, VoteKind::Up, Utc::now());

        assert!(VoteFilter::on(target).by_voter(voter).matches(&vote));
        assert!(!VoteFilter::on(Target::Comment(target.id())).matches(&vote));
        assert!(!VoteFilter::all().by_voter(Uuid::new_v4()).matches(&vote));

        vote.is_active = false;
        assert!(!VoteFilter::all().matches(&vote));
    }
}
