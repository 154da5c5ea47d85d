//! Popularity scoring.
//!
//! `popularity_score` is the only place the weighting lives; every read path
//! (feed, author feed, post detail, dashboard) goes through `PostStats`.

use std::collections::HashSet;
use uuid::Uuid;

use crate::db::{CommentFilter, EntityStore, VoteFilter};
use crate::error::Result;
use crate::models::{Comment, Target, Vote, VoteKind};

const UP_VOTE_WEIGHT: i64 = 2;
const DOWN_VOTE_WEIGHT: i64 = 1;

/// Active counts a post's score is computed from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopularityInputs {
    pub up_votes: usize,
    pub down_votes: usize,
    pub direct_comments: usize,
    /// Replies to direct comments only; deeper replies are not counted
    pub second_level_replies: usize,
}

impl PopularityInputs {
    /// Count the inputs for `post_id` out of an active-only snapshot.
    /// Rows about other posts or comments are ignored.
    pub fn from_snapshot(post_id: Uuid, votes: &[Vote], comments: &[Comment]) -> Self {
        let target = Target::Post(post_id);
        let direct: HashSet<Uuid> = comments
            .iter()
            .filter(|c| c.target == target)
            .map(|c| c.id)
            .collect();

        Self {
            up_votes: votes
                .iter()
                .filter(|v| v.target == target && v.kind == VoteKind::Up)
                .count(),
            down_votes: votes
                .iter()
                .filter(|v| v.target == target && v.kind == VoteKind::Down)
                .count(),
            direct_comments: direct.len(),
            second_level_replies: comments
                .iter()
                .filter(|c| matches!(c.target, Target::Comment(parent) if direct.contains(&parent)))
                .count(),
        }
    }
}

pub fn popularity_score(inputs: &PopularityInputs) -> i64 {
    UP_VOTE_WEIGHT * inputs.up_votes as i64 - DOWN_VOTE_WEIGHT * inputs.down_votes as i64
        + inputs.direct_comments as i64
        + inputs.second_level_replies as i64
}

/// Vote rollup and score of one post, optionally from a viewer's perspective
#[derive(Debug, Clone, Copy, Default)]
pub struct PostStats {
    pub inputs: PopularityInputs,
    pub upvoted_by_viewer: bool,
    pub downvoted_by_viewer: bool,
}

impl PostStats {
    /// Snapshot the active votes and the first two comment levels of a post
    pub async fn collect(
        store: &dyn EntityStore,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<Self> {
        let target = Target::Post(post_id);

        let votes = store.find_active_votes(&VoteFilter::on(target)).await?;
        let mut comments = store
            .find_active_comments(&CommentFilter::on(target))
            .await?;
        if !comments.is_empty() {
            let parents = comments.iter().map(|c| Target::Comment(c.id)).collect();
            let replies = store
                .find_active_comments(&CommentFilter::on_any(parents))
                .await?;
            comments.extend(replies);
        }

        let by_viewer = |kind: VoteKind| {
            viewer_id.map_or(false, |viewer| {
                votes.iter().any(|v| v.kind == kind && v.voter_id == viewer)
            })
        };

        Ok(Self {
            inputs: PopularityInputs::from_snapshot(post_id, &votes, &comments),
            upvoted_by_viewer: by_viewer(VoteKind::Up),
            downvoted_by_viewer: by_viewer(VoteKind::Down),
        })
    }

    pub fn popularity(&self) -> i64 {
        popularity_score(&self.inputs)
    }

    /// Direct comments plus second-level replies
    pub fn comment_count(&self) -> usize {
        self.inputs.direct_comments + self.inputs.second_level_replies
    }
}
