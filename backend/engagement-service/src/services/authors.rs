//! Author Summary resolution shared by every read path that shows who wrote
//! something.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::db::EntityStore;
use crate::error::Result;
use crate::models::AuthorSummary;

#[derive(Clone)]
pub struct AuthorResolver {
    store: Arc<dyn EntityStore>,
    placeholder: AuthorSummary,
}

impl AuthorResolver {
    pub fn new(store: Arc<dyn EntityStore>, placeholder: AuthorSummary) -> Self {
        Self { store, placeholder }
    }

    /// Resolve an author, falling back to the placeholder summary when the
    /// user is gone. Never fails the caller for a missing author.
    pub async fn resolve(&self, author_id: Uuid) -> Result<AuthorSummary> {
        match self.store.get_author(author_id).await? {
            Some(author) => Ok(author),
            None => {
                warn!(author_id = %author_id, "Author not found, using placeholder");
                Ok(AuthorSummary {
                    id: author_id,
                    ..self.placeholder.clone()
                })
            }
        }
    }

    /// `resolve` memoized in `cache` for the duration of one read
    pub async fn resolve_cached(
        &self,
        author_id: Uuid,
        cache: &mut HashMap<Uuid, AuthorSummary>,
    ) -> Result<AuthorSummary> {
        if let Some(author) = cache.get(&author_id) {
            return Ok(author.clone());
        }
        let author = self.resolve(author_id).await?;
        cache.insert(author_id, author.clone());
        Ok(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryEntityStore;

    fn placeholder() -> AuthorSummary {
        AuthorSummary {
            id: Uuid::nil(),
            display_name: "Unknown".into(),
            avatar: "dummy.svg".into(),
        }
    }

    #[tokio::test]
    async fn test_missing_author_gets_placeholder_with_own_id() {
        let store = Arc::new(MemoryEntityStore::new());
        let resolver = AuthorResolver::new(store, placeholder());
        let ghost = Uuid::new_v4();

        let author = resolver.resolve(ghost).await.unwrap();
        assert_eq!(author.id, ghost);
        assert_eq!(author.display_name, "Unknown");
        assert_eq!(author.avatar, "dummy.svg");
    }

    #[tokio::test]
    async fn test_cached_lookup_reuses_first_resolution() {
        let store = Arc::new(MemoryEntityStore::new());
        let id = Uuid::new_v4();
        store
            .insert_author(AuthorSummary {
                id,
                display_name: "ada".into(),
                avatar: "ada.png".into(),
            })
            .await;
        let resolver = AuthorResolver::new(store, placeholder());

        let mut cache = HashMap::new();
        let first = resolver.resolve_cached(id, &mut cache).await.unwrap();
        let second = resolver.resolve_cached(id, &mut cache).await.unwrap();
        assert_eq!(first.display_name, "ada");
        assert_eq!(second.display_name, "ada");
        assert_eq!(cache.len(), 1);
    }
}
