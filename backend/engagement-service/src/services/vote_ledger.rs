//! Vote Ledger
//!
//! Keeps at most one active counted vote per (voter, target). A cast always
//! retires the voter's prior votes on the target and records a fresh row, even
//! when the kind is unchanged.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{EntityStore, VoteFilter};
use crate::error::{AppError, Result};
use crate::metrics::engagement::{VOTES_CAST_TOTAL, VOTES_RETRACTED_TOTAL};
use crate::models::{Target, Vote, VoteKind};

/// Vote counts on one target plus the viewer's own reaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub up_votes: usize,
    pub down_votes: usize,
    pub upvoted_by_viewer: bool,
    pub downvoted_by_viewer: bool,
}

impl VoteTally {
    pub fn from_votes(votes: &[Vote], viewer_id: Option<Uuid>) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            let is_viewer = viewer_id == Some(vote.voter_id);
            match vote.kind {
                VoteKind::Up => {
                    tally.up_votes += 1;
                    tally.upvoted_by_viewer |= is_viewer;
                }
                VoteKind::Down => {
                    tally.down_votes += 1;
                    tally.downvoted_by_viewer |= is_viewer;
                }
                VoteKind::Neutral => {}
            }
        }
        tally
    }
}

/// Check that `target` exists and is active
pub(crate) async fn ensure_target_active(store: &dyn EntityStore, target: Target) -> Result<()> {
    let is_active = match target {
        Target::Post(id) => store.get_post(id).await?.map(|p| p.is_active),
        Target::Comment(id) => store.get_comment(id).await?.map(|c| c.is_active),
    };

    match is_active {
        None => Err(AppError::NotFound(format!("{} not found", target))),
        Some(false) => Err(AppError::InvalidState(format!("{} is inactive", target))),
        Some(true) => Ok(()),
    }
}

#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn EntityStore>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Record `kind` as the voter's only active vote on `target`.
    ///
    /// All validation happens before the store is touched, so a rejected cast
    /// leaves the voter's previous vote in place.
    pub async fn cast(&self, voter_id: Uuid, target: Target, kind: VoteKind) -> Result<Vote> {
        if !kind.is_counted() {
            return Err(AppError::InvalidArgument(
                "only up and down votes can be cast".to_string(),
            ));
        }
        if self.store.get_author(voter_id).await?.is_none() {
            return Err(AppError::NotFound(format!("voter {} not found", voter_id)));
        }
        ensure_target_active(self.store.as_ref(), target).await?;

        let vote = Vote::new(voter_id, target, kind, Utc::now());
        let retired = match self.store.supersede_votes(&vote).await {
            Ok(retired) => retired,
            Err(AppError::Conflict(msg)) => {
                warn!(
                    voter_id = %voter_id,
                    target = %target,
                    "Vote exclusivity conflict: {}",
                    msg
                );
                return Err(AppError::Conflict(msg));
            }
            Err(e) => return Err(e),
        };

        VOTES_CAST_TOTAL
            .with_label_values(&[kind.as_str(), target.category().as_str()])
            .inc();
        info!(
            voter_id = %voter_id,
            target = %target,
            kind = kind.as_str(),
            retired,
            "Vote cast"
        );

        Ok(vote)
    }

    /// Deactivate every active vote on `target`, whoever cast it
    pub async fn retract(&self, target: Target) -> Result<u64> {
        match target {
            Target::Post(id) if self.store.get_post(id).await?.is_none() => {
                return Err(AppError::NotFound(format!("{} not found", target)));
            }
            Target::Comment(id) if self.store.get_comment(id).await?.is_none() => {
                return Err(AppError::NotFound(format!("{} not found", target)));
            }
            _ => {}
        }

        let retracted = self.store.retract_votes(target).await?;
        VOTES_RETRACTED_TOTAL
            .with_label_values(&[target.category().as_str()])
            .inc();
        info!(target = %target, retracted, "Votes retracted");

        Ok(retracted)
    }

    /// Current active vote counts on `target`
    pub async fn tally(&self, target: Target, viewer_id: Option<Uuid>) -> Result<VoteTally> {
        let votes = self.store.find_active_votes(&VoteFilter::on(target)).await?;
        Ok(VoteTally::from_votes(&votes, viewer_id))
    }
}
