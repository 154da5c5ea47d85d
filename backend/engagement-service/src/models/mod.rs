/// Data models for engagement-service
///
/// This module defines structures for:
/// - Post / Revision: blog posts and their append-only edit history
/// - Comment: a node in the discussion forest, attached to a post or another comment
/// - Vote: an up/down reaction on a post or comment
/// - AuthorSummary: read-only projection of a user resolved at read time
///
/// Comments and votes attach to exactly one `Target`, so the "both parents set"
/// and "no parent set" states cannot be represented.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub mod views;

pub use views::*;

/// Whether a vote or comment attaches to a post or to another comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCategory {
    Post,
    Comment,
}

impl TargetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCategory::Post => "post",
            TargetCategory::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single parent of a comment, or the subject of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "id", rename_all = "snake_case")]
pub enum Target {
    Post(Uuid),
    Comment(Uuid),
}

impl Target {
    pub fn new(category: TargetCategory, id: Uuid) -> Self {
        match category {
            TargetCategory::Post => Target::Post(id),
            TargetCategory::Comment => Target::Comment(id),
        }
    }

    /// Build a target from the two nullable references used on the wire and in
    /// storage. Exactly one of them must be set.
    pub fn from_parts(post_id: Option<Uuid>, comment_id: Option<Uuid>) -> Result<Self> {
        match (post_id, comment_id) {
            (Some(id), None) => Ok(Target::Post(id)),
            (None, Some(id)) => Ok(Target::Comment(id)),
            (Some(_), Some(_)) => Err(AppError::InvalidArgument(
                "target must reference either a post or a comment, not both".to_string(),
            )),
            (None, None) => Err(AppError::InvalidArgument(
                "target must reference a post or a comment".to_string(),
            )),
        }
    }

    pub fn category(&self) -> TargetCategory {
        match self {
            Target::Post(_) => TargetCategory::Post,
            Target::Comment(_) => TargetCategory::Comment,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Target::Post(id) | Target::Comment(id) => *id,
        }
    }

    pub fn post_id(&self) -> Option<Uuid> {
        match self {
            Target::Post(id) => Some(*id),
            Target::Comment(_) => None,
        }
    }

    pub fn comment_id(&self) -> Option<Uuid> {
        match self {
            Target::Comment(id) => Some(*id),
            Target::Post(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category(), self.id())
    }
}

/// Reaction kind carried by a vote.
///
/// `Neutral` is reserved for bookkeeping rows; it is never counted and can
/// never be cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    Up,
    Down,
    Neutral,
}

impl VoteKind {
    pub fn code(&self) -> i16 {
        match self {
            VoteKind::Up => 1,
            VoteKind::Down => 2,
            VoteKind::Neutral => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Up => "up",
            VoteKind::Down => "down",
            VoteKind::Neutral => "neutral",
        }
    }

    pub fn is_counted(&self) -> bool {
        !matches!(self, VoteKind::Neutral)
    }
}

impl TryFrom<i16> for VoteKind {
    type Error = AppError;

    fn try_from(code: i16) -> Result<Self> {
        match code {
            1 => Ok(VoteKind::Up),
            2 => Ok(VoteKind::Down),
            3 => Ok(VoteKind::Neutral),
            other => Err(AppError::InvalidArgument(format!(
                "unknown vote kind code {}",
                other
            ))),
        }
    }
}

impl FromStr for VoteKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "upvote" | "1" => Ok(VoteKind::Up),
            "down" | "downvote" | "2" => Ok(VoteKind::Down),
            "neutral" | "3" => Ok(VoteKind::Neutral),
            other => Err(AppError::InvalidArgument(format!(
                "unknown vote kind '{}'",
                other
            ))),
        }
    }
}

/// Blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub location: String,
    /// Author-chosen reaction label shown with the post
    pub reaction: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Image references in display order
    pub images: Vec<String>,
}

/// Snapshot of a post taken right before an edit. Never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub id: Uuid,
    pub post_id: Uuid,
    pub title: String,
    pub body: String,
    pub location: String,
    pub reaction: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

impl Revision {
    pub fn snapshot(post: &Post, editor_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id: post.id,
            title: post.title.clone(),
            body: post.body.clone(),
            location: post.location.clone(),
            reaction: post.reaction.clone(),
            created_at: at,
            created_by: editor_id,
        }
    }
}

/// Fields an author may change on an existing post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEdit {
    pub title: String,
    pub body: String,
    pub location: String,
    pub reaction: String,
}

/// Comment on a post (depth 1) or reply to another comment (depth >= 2).
///
/// `target` is write-once: the tree assembler relies on it never being
/// reassigned, which keeps the discussion a forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub target: Target,
    pub text: String,
    pub author_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
}

/// Up/down reaction on a post or comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub kind: VoteKind,
    pub target: Target,
    pub voter_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(voter_id: Uuid, target: Target, kind: VoteKind, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target,
            voter_id,
            is_active: true,
            created_at: at,
        }
    }
}

/// Display projection of a user, resolved per author at read time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub display_name: String,
    pub avatar: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_parts() {
        let id = Uuid::new_v4();
        assert_eq!(Target::from_parts(Some(id), None).unwrap(), Target::Post(id));
        assert_eq!(
            Target::from_parts(None, Some(id)).unwrap(),
            Target::Comment(id)
        );
        assert!(matches!(
            Target::from_parts(Some(id), Some(id)),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            Target::from_parts(None, None),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_target_accessors() {
        let id = Uuid::new_v4();
        let target = Target::Comment(id);
        assert_eq!(target.category(), TargetCategory::Comment);
        assert_eq!(target.id(), id);
        assert_eq!(target.comment_id(), Some(id));
        assert_eq!(target.post_id(), None);
    }

    #[test]
    fn test_vote_kind_parsing() {
        assert_eq!(VoteKind::try_from(1).unwrap(), VoteKind::Up);
        assert_eq!(VoteKind::try_from(2).unwrap(), VoteKind::Down);
        assert_eq!(VoteKind::try_from(3).unwrap(), VoteKind::Neutral);
        assert!(VoteKind::try_from(7).is_err());
        assert_eq!("Up".parse::<VoteKind>().unwrap(), VoteKind::Up);
        assert_eq!("downvote".parse::<VoteKind>().unwrap(), VoteKind::Down);
        assert!("sideways".parse::<VoteKind>().is_err());
        assert!(!VoteKind::Neutral.is_counted());
    }

    #[test]
    fn test_target_serde_shape() {
        let id = Uuid::nil();
        let json = serde_json::to_value(Target::Post(id)).unwrap();
        assert_eq!(json["category"], "post");
        assert_eq!(json["id"], id.to_string());
    }
}
