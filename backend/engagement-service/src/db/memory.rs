//! In-process `EntityStore`.
//!
//! All state sits behind one `RwLock`; every atomic unit holds the write guard
//! for its whole duration. Rows keep insertion order, which the ranker relies
//! on for stable tie-breaks.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CommentFilter, EntityStore, PostFilter, VoteFilter};
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, Comment, Post, Revision, Target, Vote};

#[derive(Default)]
struct State {
    authors: HashMap<Uuid, AuthorSummary>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    revisions: Vec<Revision>,
}

#[derive(Default)]
pub struct MemoryEntityStore {
    state: RwLock<State>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so it resolves as an author/voter
    pub async fn insert_author(&self, author: AuthorSummary) {
        self.state.write().await.authors.insert(author.id, author);
    }

    /// Seed a post. Post creation belongs to the platform's CRUD layer.
    pub async fn insert_post(&self, post: Post) {
        self.state.write().await.posts.push(post);
    }

    /// Seed a vote row as-is, bypassing exclusivity (fixtures and imports)
    pub async fn insert_vote(&self, vote: Vote) {
        self.state.write().await.votes.push(vote);
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn find_active_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn find_active_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn find_active_votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect())
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == comment_id).cloned())
    }

    async fn get_author(&self, user_id: Uuid) -> Result<Option<AuthorSummary>> {
        let state = self.state.read().await;
        Ok(state.authors.get(&user_id).cloned())
    }

    async fn revisions_for_post(&self, post_id: Uuid) -> Result<Vec<Revision>> {
        let state = self.state.read().await;
        Ok(state
            .revisions
            .iter()
            .filter(|r| r.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut state = self.state.write().await;
        if state.comments.iter().any(|c| c.id == comment.id) {
            return Err(AppError::Conflict(format!(
                "comment {} already exists",
                comment.id
            )));
        }
        state.comments.push(comment.clone());
        Ok(())
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        let mut state = self.state.write().await;
        let slot = state
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))?;
        *slot = post.clone();
        Ok(())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        let mut state = self.state.write().await;
        let slot = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment.id)))?;
        if slot.target != comment.target {
            return Err(AppError::InvalidArgument(
                "a comment's parent cannot be reassigned".to_string(),
            ));
        }
        *slot = comment.clone();
        Ok(())
    }

    async fn supersede_votes(&self, vote: &Vote) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut retired = 0;
        for existing in state.votes.iter_mut().filter(|v| {
            v.is_active && v.kind.is_counted() && v.voter_id == vote.voter_id && v.target == vote.target
        }) {
            existing.is_active = false;
            retired += 1;
        }
        state.votes.push(vote.clone());
        Ok(retired)
    }

    async fn retract_votes(&self, target: Target) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut retracted = 0;
        for existing in state
            .votes
            .iter_mut()
            .filter(|v| v.is_active && v.target == target)
        {
            existing.is_active = false;
            retracted += 1;
        }
        Ok(retracted)
    }

    async fn apply_post_edit(&self, revision: &Revision, post: &Post) -> Result<()> {
        let mut state = self.state.write().await;
        let slot = state
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))?;
        *slot = post.clone();
        state.revisions.push(revision.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoteKind;
    use chrono::Utc;

    #[tokio::test]
    async fn test_supersede_keeps_one_active_vote() {
        let store = MemoryEntityStore::new();
        let voter = Uuid::new_v4();
        let target = Target::Post(Uuid::new_v4());

        let first = Vote::new(voter, target, VoteKind::Up, Utc::now());
        assert_eq!(store.supersede_votes(&first).await.unwrap(), 0);

        let second = Vote::new(voter, target, VoteKind::Down, Utc::now());
        assert_eq!(store.supersede_votes(&second).await.unwrap(), 1);

        let active = store
            .find_active_votes(&VoteFilter::on(target).by_voter(voter))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }

    #[tokio::test]
    async fn test_supersede_leaves_neutral_rows_alone() {
        let store = MemoryEntityStore::new();
        let voter = Uuid::new_v4();
        let target = Target::Comment(Uuid::new_v4());

        store
            .insert_vote(Vote::new(voter, target, VoteKind::Neutral, Utc::now()))
            .await;
        let vote = Vote::new(voter, target, VoteKind::Up, Utc::now());
        assert_eq!(store.supersede_votes(&vote).await.unwrap(), 0);

        let active = store.find_active_votes(&VoteFilter::on(target)).await.unwrap();
        assert_eq!(active.len(), 2);
    }

    #[tokio::test]
    async fn test_update_comment_rejects_reparenting() {
        let store = MemoryEntityStore::new();
        let mut comment = Comment {
            id: Uuid::new_v4(),
            target: Target::Post(Uuid::new_v4()),
            text: "first".into(),
            author_id: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
            edited_at: None,
        };
        store.insert_comment(&comment).await.unwrap();

        comment.target = Target::Comment(Uuid::new_v4());
        let err = store.update_comment(&comment).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }
}
