//! In-process content store.
//!
//! Implements [`ContentRepository`] over a `tokio` read-write lock. Every
//! operation takes the lock once, so `save` is an atomic compare-and-swap on
//! the entity revision and slug uniqueness is enforced under the same lock as
//! the insert.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{ContentQuery, ContentRepository, ContentRepositoryError};
use crate::domain::{ContentEntity, ContentId};

struct Store<E> {
    entities: HashMap<ContentId, E>,
    slugs: HashMap<String, ContentId>,
}

impl<E> Default for Store<E> {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            slugs: HashMap::new(),
        }
    }
}

/// Content repository holding one entity type in memory.
pub struct InMemoryContentRepository<E> {
    store: RwLock<Store<E>>,
}

impl<E> Default for InMemoryContentRepository<E> {
    fn default() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }
}

impl<E: ContentEntity> InMemoryContentRepository<E> {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-loaded with `entities`, such as a JSON export.
    ///
    /// Fails on the first repeated slug.
    pub fn with_entities(
        entities: impl IntoIterator<Item = E>,
    ) -> Result<Self, ContentRepositoryError> {
        let mut store = Store::default();
        for entity in entities {
            insert(&mut store, entity)?;
        }
        Ok(Self {
            store: RwLock::new(store),
        })
    }

    /// Number of stored entities.
    pub async fn len(&self) -> usize {
        self.store.read().await.entities.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn insert<E: ContentEntity>(store: &mut Store<E>, entity: E) -> Result<(), ContentRepositoryError> {
    let header = entity.header();
    let slug = header.slug().to_owned();
    if store.slugs.contains_key(&slug) {
        return Err(ContentRepositoryError::duplicate_slug(slug));
    }
    let id = header.id();
    store.slugs.insert(slug, id);
    store.entities.insert(id, entity);
    Ok(())
}

#[async_trait]
impl<E: ContentEntity> ContentRepository<E> for InMemoryContentRepository<E> {
    async fn create(&self, entity: &E) -> Result<(), ContentRepositoryError> {
        let mut store = self.store.write().await;
        insert(&mut store, entity.clone())?;
        debug!(kind = E::KIND.as_str(), id = %entity.header().id(), "content inserted");
        Ok(())
    }

    async fn find_by_id(&self, id: &ContentId) -> Result<Option<E>, ContentRepositoryError> {
        Ok(self.store.read().await.entities.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>, ContentRepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .slugs
            .get(slug)
            .and_then(|id| store.entities.get(id))
            .cloned())
    }

    async fn save(&self, entity: &E, expected_revision: u32) -> Result<(), ContentRepositoryError> {
        let id = entity.header().id();
        let mut store = self.store.write().await;
        let stored = store
            .entities
            .get_mut(&id)
            .ok_or_else(|| ContentRepositoryError::not_found(id))?;
        let actual = stored.header().revision();
        if actual != expected_revision {
            return Err(ContentRepositoryError::revision_mismatch(
                expected_revision,
                actual,
            ));
        }
        *stored = entity.clone();
        Ok(())
    }

    async fn find(
        &self,
        query: &ContentQuery<E::Status>,
    ) -> Result<Vec<E>, ContentRepositoryError> {
        let store = self.store.read().await;
        Ok(query.apply(store.entities.values().cloned()))
    }

    async fn scan(&self) -> Result<Vec<E>, ContentRepositoryError> {
        Ok(self.store.read().await.entities.values().cloned().collect())
    }
}
