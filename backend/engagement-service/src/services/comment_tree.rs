//! Comment Tree Assembler
//!
//! Materializes the discussion under a post or a comment. The full tree is
//! walked breadth-first with an explicit queue and assembled bottom-up, so
//! discussion depth never translates into call-stack depth. Termination relies
//! on a comment's parent being write-once.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::authors::AuthorResolver;
use super::time_label::relative_age_label;
use super::vote_ledger::VoteTally;
use crate::db::{CommentFilter, EntityStore, VoteFilter};
use crate::error::Result;
use crate::metrics::engagement::COMMENT_TREE_NODES;
use crate::models::{AuthorSummary, Comment, CommentNode, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeMode {
    /// The single newest top-level comment, replies not expanded
    Shallow,
    /// Every reachable active comment at any depth
    Full,
}

impl TreeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeMode::Shallow => "shallow",
            TreeMode::Full => "full",
        }
    }
}

#[derive(Clone)]
pub struct CommentTreeAssembler {
    store: Arc<dyn EntityStore>,
    authors: AuthorResolver,
}

impl CommentTreeAssembler {
    pub fn new(store: Arc<dyn EntityStore>, authors: AuthorResolver) -> Self {
        Self { store, authors }
    }

    pub async fn build(
        &self,
        root: Target,
        mode: TreeMode,
        viewer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CommentNode>> {
        let nodes = match mode {
            TreeMode::Shallow => self.build_shallow(root, viewer_id, now).await?,
            TreeMode::Full => self.build_full(root, viewer_id, now).await?,
        };

        let total = count_nodes(&nodes);
        COMMENT_TREE_NODES
            .with_label_values(&[mode.as_str()])
            .observe(total as f64);
        debug!(root = %root, mode = mode.as_str(), nodes = total, "Comment tree built");

        Ok(nodes)
    }

    async fn build_shallow(
        &self,
        root: Target,
        viewer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CommentNode>> {
        let top_level = self
            .store
            .find_active_comments(&CommentFilter::on(root))
            .await?;

        // max_by_key keeps the last of equal maxima: the later insert wins ties
        let newest = top_level.into_iter().max_by_key(|c| c.created_at);
        let mut cache = HashMap::new();
        match newest {
            Some(comment) => Ok(vec![
                self.node(&comment, viewer_id, now, &mut cache).await?,
            ]),
            None => Ok(Vec::new()),
        }
    }

    async fn build_full(
        &self,
        root: Target,
        viewer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CommentNode>> {
        // Breadth-first discovery into a flat arena; children always land at
        // higher indices than their parent.
        let mut arena: Vec<Comment> = Vec::new();
        let mut children: Vec<Vec<usize>> = Vec::new();
        let mut roots: Vec<usize> = Vec::new();
        let mut queue: VecDeque<(Target, Option<usize>)> = VecDeque::from([(root, None)]);

        while let Some((target, parent)) = queue.pop_front() {
            let mut level = self
                .store
                .find_active_comments(&CommentFilter::on(target))
                .await?;
            level.sort_by_key(|c| c.created_at);

            for comment in level {
                let index = arena.len();
                queue.push_back((Target::Comment(comment.id), Some(index)));
                arena.push(comment);
                children.push(Vec::new());
                match parent {
                    Some(p) => children[p].push(index),
                    None => roots.push(index),
                }
            }
        }

        let mut cache = HashMap::new();
        let mut built: Vec<Option<CommentNode>> = Vec::with_capacity(arena.len());
        for comment in &arena {
            built.push(Some(self.node(comment, viewer_id, now, &mut cache).await?));
        }

        for index in (0..arena.len()).rev() {
            let replies: Vec<CommentNode> = children[index]
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            if let Some(node) = built[index].as_mut() {
                node.replies = replies;
            }
        }

        Ok(roots
            .into_iter()
            .filter_map(|index| built[index].take())
            .collect())
    }

    /// One node without replies. Votes are looked up per node.
    async fn node(
        &self,
        comment: &Comment,
        viewer_id: Option<Uuid>,
        now: DateTime<Utc>,
        cache: &mut HashMap<Uuid, AuthorSummary>,
    ) -> Result<CommentNode> {
        let votes = self
            .store
            .find_active_votes(&VoteFilter::on(Target::Comment(comment.id)))
            .await?;
        let tally = VoteTally::from_votes(&votes, viewer_id);

        let author = self
            .authors
            .resolve_cached(comment.author_id, cache)
            .await?;

        Ok(CommentNode {
            comment_id: comment.id,
            text: comment.text.clone(),
            author,
            created_at: comment.created_at,
            is_edited: comment.edited_at.is_some(),
            up_votes: tally.up_votes,
            down_votes: tally.down_votes,
            upvoted_by_viewer: tally.upvoted_by_viewer,
            downvoted_by_viewer: tally.downvoted_by_viewer,
            age_label: relative_age_label(comment.created_at, now),
            replies: Vec::new(),
        })
    }
}

fn count_nodes(nodes: &[CommentNode]) -> usize {
    let mut total = 0;
    let mut stack: Vec<&CommentNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        total += 1;
        stack.extend(node.replies.iter());
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEntityStore;
    use crate::models::{Vote, VoteKind};
    use chrono::Duration;

    fn placeholder() -> AuthorSummary {
        AuthorSummary {
            id: Uuid::nil(),
            display_name: "Unknown".into(),
            avatar: "dummy.svg".into(),
        }
    }

    fn resolver(store: Arc<MemoryEntityStore>) -> AuthorResolver {
        AuthorResolver::new(store, placeholder())
    }

    fn comment(target: Target, author_id: Uuid, at: DateTime<Utc>) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            target,
            text: format!("on {}", target),
            author_id,
            is_active: true,
            created_at: at,
            edited_at: None,
        }
    }

    #[tokio::test]
    async fn test_full_tree_nests_replies() {
        let store = Arc::new(MemoryEntityStore::new());
        let author = Uuid::new_v4();
        let post = Target::Post(Uuid::new_v4());
        let t0 = Utc::now() - Duration::minutes(10);

        let a = comment(post, author, t0);
        let b = comment(Target::Comment(a.id), author, t0 + Duration::minutes(1));
        let c = comment(Target::Comment(b.id), author, t0 + Duration::minutes(2));
        for node in [&a, &b, &c] {
            store.insert_comment(node).await.unwrap();
        }

        let assembler = CommentTreeAssembler::new(store.clone(), resolver(store.clone()));
        let tree = assembler
            .build(post, TreeMode::Full, None, Utc::now())
            .await
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment_id, a.id);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].comment_id, b.id);
        assert_eq!(tree[0].replies[0].replies[0].comment_id, c.id);
        assert!(tree[0].replies[0].replies[0].replies.is_empty());
        assert_eq!(tree[0].author.display_name, "Unknown");
        assert_eq!(tree[0].author.id, author);
    }

    #[tokio::test]
    async fn test_shallow_tree_takes_newest_top_level() {
        let store = Arc::new(MemoryEntityStore::new());
        let author = Uuid::new_v4();
        let post = Target::Post(Uuid::new_v4());
        let t0 = Utc::now() - Duration::hours(2);

        let older = comment(post, author, t0);
        let newer = comment(post, author, t0 + Duration::minutes(30));
        let reply = comment(Target::Comment(newer.id), author, t0 + Duration::hours(1));
        for node in [&older, &newer, &reply] {
            store.insert_comment(node).await.unwrap();
        }

        let assembler = CommentTreeAssembler::new(store.clone(), resolver(store.clone()));
        let tree = assembler
            .build(post, TreeMode::Shallow, None, Utc::now())
            .await
            .unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment_id, newer.id);
        assert!(tree[0].replies.is_empty());
    }

    #[tokio::test]
    async fn test_node_counts_only_its_own_votes() {
        let store = Arc::new(MemoryEntityStore::new());
        let viewer = Uuid::new_v4();
        let post_id = Uuid::new_v4();
        let post = Target::Post(post_id);

        let first = comment(post, viewer, Utc::now());
        let second = comment(post, viewer, Utc::now());
        store.insert_comment(&first).await.unwrap();
        store.insert_comment(&second).await.unwrap();

        let now = Utc::now();
        store
            .insert_vote(Vote::new(viewer, Target::Comment(first.id), VoteKind::Up, now))
            .await;
        store
            .insert_vote(Vote::new(
                Uuid::new_v4(),
                Target::Comment(first.id),
                VoteKind::Down,
                now,
            ))
            .await;
        // Same id, post category: must not leak into the comment's counts
        store
            .insert_vote(Vote::new(viewer, Target::Post(second.id), VoteKind::Up, now))
            .await;

        let assembler = CommentTreeAssembler::new(store.clone(), resolver(store.clone()));
        let tree = assembler
            .build(post, TreeMode::Full, Some(viewer), now)
            .await
            .unwrap();

        let first_node = tree.iter().find(|n| n.comment_id == first.id).unwrap();
        assert_eq!((first_node.up_votes, first_node.down_votes), (1, 1));
        assert!(first_node.upvoted_by_viewer);
        assert!(!first_node.downvoted_by_viewer);

        let second_node = tree.iter().find(|n| n.comment_id == second.id).unwrap();
        assert_eq!((second_node.up_votes, second_node.down_votes), (0, 0));
    }

    #[tokio::test]
    async fn test_inactive_comment_hides_its_subtree() {
        let store = Arc::new(MemoryEntityStore::new());
        let author = Uuid::new_v4();
        let post = Target::Post(Uuid::new_v4());

        let mut a = comment(post, author, Utc::now());
        let b = comment(Target::Comment(a.id), author, Utc::now());
        store.insert_comment(&a).await.unwrap();
        store.insert_comment(&b).await.unwrap();
        a.is_active = false;
        store.update_comment(&a).await.unwrap();

        let assembler = CommentTreeAssembler::new(store.clone(), resolver(store.clone()));
        let tree = assembler
            .build(post, TreeMode::Full, None, Utc::now())
            .await
            .unwrap();
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_deep_chain_does_not_recurse() {
        let store = Arc::new(MemoryEntityStore::new());
        let author = Uuid::new_v4();
        let post = Target::Post(Uuid::new_v4());

        let mut parent = post;
        for _ in 0..2_000 {
            let node = comment(parent, author, Utc::now());
            store.insert_comment(&node).await.unwrap();
            parent = Target::Comment(node.id);
        }

        let assembler = CommentTreeAssembler::new(store.clone(), resolver(store.clone()));
        let tree = assembler
            .build(post, TreeMode::Full, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(count_nodes(&tree), 2_000);
    }
}
