//! Engagement service facade
//!
//! The single entry point the HTTP layer and integration tests use. Every read
//! path scores posts through `PostStats` and builds discussions through the
//! shared `CommentTreeAssembler`.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::authors::AuthorResolver;
use super::comment_tree::{CommentTreeAssembler, TreeMode};
use super::dashboard::DashboardAggregator;
use super::feed_ranking::{paginate, rank, FeedRankingConfig, SortMode};
use super::scoring::PostStats;
use super::time_label::relative_age_label;
use super::vote_ledger::{ensure_target_active, VoteLedger};
use crate::config::EngagementConfig;
use crate::db::{EntityStore, PostFilter};
use crate::error::{AppError, Result};
use crate::metrics::engagement::{FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL};
use crate::models::{
    AuthorSummary, Comment, DashboardSummary, FeedPage, Post, PostEdit, PostView, Revision,
    Target, Vote, VoteKind,
};

/// Paging and ordering of a feed request
#[derive(Debug, Clone, Copy)]
pub struct FeedQuery {
    pub page: usize,
    pub size: Option<usize>,
    pub sort: SortMode,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: None,
            sort: SortMode::Recency,
        }
    }
}

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn EntityStore>,
    ledger: VoteLedger,
    authors: AuthorResolver,
    trees: CommentTreeAssembler,
    dashboard: DashboardAggregator,
    ranking: FeedRankingConfig,
}

impl EngagementService {
    pub fn new(store: Arc<dyn EntityStore>, config: &EngagementConfig) -> Self {
        let placeholder = AuthorSummary {
            id: Uuid::nil(),
            display_name: config.placeholder_author_name.clone(),
            avatar: config.placeholder_avatar.clone(),
        };
        let authors = AuthorResolver::new(store.clone(), placeholder);

        Self {
            ledger: VoteLedger::new(store.clone()),
            trees: CommentTreeAssembler::new(store.clone(), authors.clone()),
            dashboard: DashboardAggregator::new(
                store.clone(),
                authors.clone(),
                config.leaderboard_size,
            ),
            authors,
            ranking: FeedRankingConfig::from(config),
            store,
        }
    }

    /// Ranked page of every active post, each with its newest top-level comment
    pub async fn get_feed(&self, viewer_id: Option<Uuid>, query: FeedQuery) -> Result<FeedPage> {
        self.feed(PostFilter::all(), viewer_id, query).await
    }

    /// Ranked page of one author's active posts
    pub async fn get_author_feed(
        &self,
        author_id: Uuid,
        viewer_id: Option<Uuid>,
        query: FeedQuery,
    ) -> Result<FeedPage> {
        if self.store.get_author(author_id).await?.is_none() {
            return Err(AppError::NotFound(format!("author {} not found", author_id)));
        }
        self.feed(PostFilter::by_author(author_id), viewer_id, query)
            .await
    }

    async fn feed(
        &self,
        filter: PostFilter,
        viewer_id: Option<Uuid>,
        query: FeedQuery,
    ) -> Result<FeedPage> {
        let start = Instant::now();
        let now = Utc::now();
        let size = self.ranking.page_size(query.size);

        let posts = self.store.find_active_posts(&filter).await?;
        let total_count = posts.len();

        let mut views = Vec::with_capacity(posts.len());
        for post in &posts {
            views.push(self.post_view(post, viewer_id, now).await?);
        }

        rank(&mut views, query.sort);
        let mut items = paginate(views, query.page, size);

        // Previews only for the posts actually returned
        for item in &mut items {
            item.comments = self
                .trees
                .build(Target::Post(item.post_id), TreeMode::Shallow, viewer_id, now)
                .await?;
        }

        let elapsed = start.elapsed().as_secs_f64();
        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[query.sort.as_str()])
            .observe(elapsed);
        FEED_REQUEST_TOTAL
            .with_label_values(&[query.sort.as_str()])
            .inc();
        debug!(
            sort = %query.sort,
            page = query.page,
            size,
            total_count,
            returned = items.len(),
            "Feed served"
        );

        Ok(FeedPage {
            items,
            total_count,
            page: query.page.max(1),
            size,
        })
    }

    /// One active post with its full discussion
    pub async fn get_post_detail(&self, viewer_id: Option<Uuid>, post_id: Uuid) -> Result<PostView> {
        let post = self.active_post(post_id).await?;
        let now = Utc::now();

        let mut view = self.post_view(&post, viewer_id, now).await?;
        view.comments = self
            .trees
            .build(Target::Post(post_id), TreeMode::Full, viewer_id, now)
            .await?;
        Ok(view)
    }

    pub async fn cast_vote(&self, voter_id: Uuid, target: Target, kind: VoteKind) -> Result<Vote> {
        self.ledger.cast(voter_id, target, kind).await
    }

    pub async fn retract_votes(&self, target: Target) -> Result<u64> {
        self.ledger.retract(target).await
    }

    /// Clear every reaction on a post or comment the actor authored
    pub async fn retract_votes_as_author(&self, actor_id: Uuid, target: Target) -> Result<u64> {
        let author_id = match target {
            Target::Post(id) => self.store.get_post(id).await?.map(|p| p.author_id),
            Target::Comment(id) => self.store.get_comment(id).await?.map(|c| c.author_id),
        }
        .ok_or_else(|| AppError::NotFound(format!("{} not found", target)))?;

        if author_id != actor_id {
            return Err(AppError::Forbidden(
                "only the author can clear reactions".to_string(),
            ));
        }
        self.ledger.retract(target).await
    }

    pub async fn add_comment(&self, author_id: Uuid, target: Target, text: &str) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidArgument(
                "comment text must not be empty".to_string(),
            ));
        }
        if self.store.get_author(author_id).await?.is_none() {
            return Err(AppError::NotFound(format!("author {} not found", author_id)));
        }
        ensure_target_active(self.store.as_ref(), target).await?;

        let comment = Comment {
            id: Uuid::new_v4(),
            target,
            text: text.to_string(),
            author_id,
            is_active: true,
            created_at: Utc::now(),
            edited_at: None,
        };
        self.store.insert_comment(&comment).await?;

        info!(comment_id = %comment.id, target = %target, author_id = %author_id, "Comment added");
        Ok(comment)
    }

    /// Soft-delete a comment. Its replies stay stored but drop out of every tree.
    pub async fn delete_comment(&self, actor_id: Uuid, comment_id: Uuid) -> Result<()> {
        let mut comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {} not found", comment_id)))?;
        if !comment.is_active {
            return Err(AppError::InvalidState(format!(
                "comment {} is already deleted",
                comment_id
            )));
        }
        if comment.author_id != actor_id {
            return Err(AppError::Forbidden(
                "only the author can delete a comment".to_string(),
            ));
        }

        comment.is_active = false;
        self.store.update_comment(&comment).await?;

        info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    /// Apply an author's edit, recording the previous content as a revision
    pub async fn edit_post(&self, actor_id: Uuid, post_id: Uuid, edit: PostEdit) -> Result<Post> {
        if edit.title.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "post title must not be empty".to_string(),
            ));
        }
        let mut post = self.owned_active_post(actor_id, post_id).await?;

        let now = Utc::now();
        let revision = Revision::snapshot(&post, actor_id, now);
        post.title = edit.title;
        post.body = edit.body;
        post.location = edit.location;
        post.reaction = edit.reaction;
        post.edited_at = Some(now);

        self.store.apply_post_edit(&revision, &post).await?;

        info!(post_id = %post_id, revision_id = %revision.id, "Post edited");
        Ok(post)
    }

    pub async fn delete_post(&self, actor_id: Uuid, post_id: Uuid) -> Result<()> {
        let mut post = self.owned_active_post(actor_id, post_id).await?;

        post.is_active = false;
        post.deleted_at = Some(Utc::now());
        self.store.update_post(&post).await?;

        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Edit history of a post, oldest first
    pub async fn post_revisions(&self, post_id: Uuid) -> Result<Vec<Revision>> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("post {} not found", post_id)));
        }
        self.store.revisions_for_post(post_id).await
    }

    pub async fn get_dashboard_summary(&self) -> Result<DashboardSummary> {
        self.dashboard.summarize().await
    }

    async fn active_post(&self, post_id: Uuid) -> Result<Post> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {} not found", post_id)))?;
        if !post.is_active {
            return Err(AppError::InvalidState(format!("post {} is deleted", post_id)));
        }
        Ok(post)
    }

    async fn owned_active_post(&self, actor_id: Uuid, post_id: Uuid) -> Result<Post> {
        let post = self.active_post(post_id).await?;
        if post.author_id != actor_id {
            return Err(AppError::Forbidden(
                "only the author can change a post".to_string(),
            ));
        }
        Ok(post)
    }

    /// Post with score and vote rollup; `comments` is left empty for the caller
    async fn post_view(
        &self,
        post: &Post,
        viewer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<PostView> {
        let stats = PostStats::collect(self.store.as_ref(), post.id, viewer_id).await?;
        let author = self.authors.resolve(post.author_id).await?;

        Ok(PostView {
            post_id: post.id,
            title: post.title.clone(),
            body: post.body.clone(),
            location: post.location.clone(),
            reaction: post.reaction.clone(),
            author,
            images: post.images.clone(),
            created_at: post.created_at,
            is_edited: post.edited_at.is_some(),
            up_votes: stats.inputs.up_votes,
            down_votes: stats.inputs.down_votes,
            upvoted_by_viewer: stats.upvoted_by_viewer,
            downvoted_by_viewer: stats.downvoted_by_viewer,
            popularity: stats.popularity(),
            comment_count: stats.comment_count(),
            age_label: relative_age_label(post.created_at, now),
            comments: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEntityStore;

    struct Fixture {
        store: Arc<MemoryEntityStore>,
        service: EngagementService,
        author: Uuid,
        post_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryEntityStore::new());
        let author = Uuid::new_v4();
        store
            .insert_author(AuthorSummary {
                id: author,
                display_name: "Author".into(),
                avatar: "a.png".into(),
            })
            .await;
        let post = Post {
            id: Uuid::new_v4(),
            title: "Original".into(),
            body: "body".into(),
            location: "Kathmandu".into(),
            reaction: "happy".into(),
            author_id: author,
            created_at: Utc::now(),
            edited_at: None,
            deleted_at: None,
            is_active: true,
            images: vec!["one.png".into(), "two.png".into()],
        };
        let post_id = post.id;
        store.insert_post(post).await;

        let service = EngagementService::new(store.clone(), &EngagementConfig::default());
        Fixture {
            store,
            service,
            author,
            post_id,
        }
    }

    fn edit(title: &str) -> PostEdit {
        PostEdit {
            title: title.into(),
            body: "new body".into(),
            location: "Pokhara".into(),
            reaction: "excited".into(),
        }
    }

    #[tokio::test]
    async fn test_edit_post_records_revision() {
        let f = fixture().await;

        let edited = f
            .service
            .edit_post(f.author, f.post_id, edit("Updated"))
            .await
            .unwrap();
        assert_eq!(edited.title, "Updated");
        assert!(edited.edited_at.is_some());

        let revisions = f.service.post_revisions(f.post_id).await.unwrap();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].title, "Original");
        assert_eq!(revisions[0].location, "Kathmandu");
        assert_eq!(revisions[0].created_by, f.author);

        let view = f.service.get_post_detail(None, f.post_id).await.unwrap();
        assert!(view.is_edited);
        assert_eq!(view.images, vec!["one.png", "two.png"]);
    }

    #[tokio::test]
    async fn test_only_author_can_change_post() {
        let f = fixture().await;
        let stranger = Uuid::new_v4();

        let err = f
            .service
            .edit_post(stranger, f.post_id, edit("Hijacked"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = f.service.delete_post(stranger, f.post_id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(f.store.revisions_for_post(f.post_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_post_leaves_feed_and_detail() {
        let f = fixture().await;
        f.service.delete_post(f.author, f.post_id).await.unwrap();

        let page = f.service.get_feed(None, FeedQuery::default()).await.unwrap();
        assert_eq!(page.total_count, 0);

        let err = f.service.get_post_detail(None, f.post_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let stored = f.store.get_post(f.post_id).await.unwrap().unwrap();
        assert!(stored.deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_add_and_delete_comment() {
        let f = fixture().await;
        let target = Target::Post(f.post_id);

        let err = f.service.add_comment(f.author, target, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        let comment = f.service.add_comment(f.author, target, " hello ").await.unwrap();
        assert_eq!(comment.text, "hello");

        let err = f
            .service
            .delete_comment(Uuid::new_v4(), comment.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        f.service.delete_comment(f.author, comment.id).await.unwrap();
        let view = f.service.get_post_detail(None, f.post_id).await.unwrap();
        assert!(view.comments.is_empty());
        assert_eq!(view.comment_count, 0);

        let err = f
            .service
            .add_comment(f.author, Target::Comment(comment.id), "reply")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_author_feed_requires_author() {
        let f = fixture().await;

        let page = f
            .service
            .get_author_feed(f.author, None, FeedQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].author.display_name, "Author");

        let err = f
            .service
            .get_author_feed(Uuid::new_v4(), None, FeedQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
