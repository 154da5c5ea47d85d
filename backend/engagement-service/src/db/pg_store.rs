//! PostgreSQL-backed `EntityStore`.
//!
//! Vote exclusivity is enforced twice: the supersede transaction serializes
//! writers on a (voter, target) advisory lock, and the partial unique indexes in
//! `migrations/` reject a second active counted vote if anything slips past.

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{comment_repo, post_repo, vote_repo};
use super::{CommentFilter, EntityStore, PostFilter, VoteFilter};
use crate::error::{AppError, Result};
use crate::models::{AuthorSummary, Comment, Post, Revision, Target, Vote};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn find_active_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        Ok(post_repo::find_active_posts(&self.pool, filter.author_id).await?)
    }

    async fn find_active_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        let targets = filter.targets.as_ref().map(|_| filter.split_targets());
        Ok(comment_repo::find_active_comments(&self.pool, targets).await?)
    }

    async fn find_active_votes(&self, filter: &VoteFilter) -> Result<Vec<Vote>> {
        Ok(
            vote_repo::find_active_votes(&self.pool, filter.target, filter.voter_id, filter.kind)
                .await?,
        )
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(comment_repo::get_comment_by_id(&self.pool, comment_id).await?)
    }

    async fn get_author(&self, user_id: Uuid) -> Result<Option<AuthorSummary>> {
        Ok(post_repo::find_author(&self.pool, user_id).await?)
    }

    async fn revisions_for_post(&self, post_id: Uuid) -> Result<Vec<Revision>> {
        Ok(post_repo::find_revisions(&self.pool, post_id).await?)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        Ok(comment_repo::insert_comment(&self.pool, comment).await?)
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        match post_repo::update_post(&mut conn, post).await? {
            0 => Err(AppError::NotFound(format!("post {}", post.id))),
            _ => Ok(()),
        }
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if comment_repo::update_comment(&mut conn, comment).await? == 0 {
            return match comment_repo::get_comment_by_id(&self.pool, comment.id).await? {
                Some(_) => Err(AppError::InvalidArgument(
                    "a comment's parent cannot be reassigned".to_string(),
                )),
                None => Err(AppError::NotFound(format!("comment {}", comment.id))),
            };
        }
        Ok(())
    }

    async fn supersede_votes(&self, vote: &Vote) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        vote_repo::lock_pair(&mut tx, vote.voter_id, vote.target).await?;
        let retired = vote_repo::deactivate_voter_votes(&mut tx, vote.voter_id, vote.target).await?;
        vote_repo::insert_vote(&mut tx, vote).await?;

        tx.commit().await?;
        debug!(
            voter_id = %vote.voter_id,
            target = %vote.target,
            retired,
            "Vote superseded"
        );
        Ok(retired)
    }

    async fn retract_votes(&self, target: Target) -> Result<u64> {
        Ok(vote_repo::deactivate_target_votes(&self.pool, target).await?)
    }

    async fn apply_post_edit(&self, revision: &Revision, post: &Post) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        post_repo::insert_revision(&mut tx, revision).await?;
        if post_repo::update_post(&mut tx, post).await? == 0 {
            return Err(AppError::NotFound(format!("post {}", post.id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
