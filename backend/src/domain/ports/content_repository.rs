//! Port for per-type content persistence with optimistic revision checks.

use std::cmp::Reverse;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::content::{ContentEntity, CounterKind};
use crate::domain::ids::ContentId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by content repository adapters.
    pub enum ContentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "content repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "content repository query failed: {message}",
        /// Another entity of the same type already uses the slug.
        DuplicateSlug { slug: String } => "slug `{slug}` is already in use",
        /// The stored revision moved on since the entity was read.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
        /// No entity is stored under the id.
        NotFound { id: ContentId } => "content {id} not found",
    }
}

/// Ordering applied by [`ContentRepository::find`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSort {
    #[default]
    NewestFirst,
    OldestFirst,
    RecentlyPublished,
    MostViewed,
    Title,
}

/// Listing query over one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery<S> {
    /// Only entities in this status, when set.
    pub status: Option<S>,
    /// Sort.
    pub sort: ContentSort,
    /// Maximum entities returned.
    pub limit: usize,
}

impl<S: Copy + Eq> ContentQuery<S> {
    /// Filter, order, and truncate `entities` according to the query.
    ///
    /// Adapters without a native query language use this directly.
    pub fn apply<E>(&self, entities: impl IntoIterator<Item = E>) -> Vec<E>
    where
        E: ContentEntity<Status = S>,
    {
        let mut matched: Vec<E> = entities
            .into_iter()
            .filter(|entity| self.status.is_none_or(|status| entity.header().status() == status))
            .collect();
        match self.sort {
            ContentSort::NewestFirst => {
                matched.sort_by_key(|entity| Reverse(entity.header().created_at()));
            }
            ContentSort::OldestFirst => matched.sort_by_key(|entity| entity.header().created_at()),
            ContentSort::RecentlyPublished => {
                matched.sort_by_key(|entity| Reverse(entity.header().published_at()));
            }
            ContentSort::MostViewed => matched.sort_by_key(|entity| {
                Reverse(entity.header().counters().get(CounterKind::Views))
            }),
            ContentSort::Title => {
                matched.sort_by(|a, b| a.header().title().cmp(b.header().title()));
            }
        }
        matched.truncate(self.limit);
        matched
    }
}

/// Persistence port for one content entity type.
///
/// `save` is the only update path. It succeeds only when the stored revision
/// equals `expected_revision`, which makes every read-modify-save cycle
/// atomic per entity.
#[async_trait]
pub trait ContentRepository<E: ContentEntity>: Send + Sync {
    /// Insert a new entity, rejecting duplicate slugs.
    async fn create(&self, entity: &E) -> Result<(), ContentRepositoryError>;

    /// Fetch an entity by identifier.
    async fn find_by_id(&self, id: &ContentId) -> Result<Option<E>, ContentRepositoryError>;

    /// Fetch an entity by slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>, ContentRepositoryError>;

    /// Replace the stored entity if its revision still equals
    /// `expected_revision`.
    async fn save(&self, entity: &E, expected_revision: u32)
    -> Result<(), ContentRepositoryError>;

    /// List entities matching `query`.
    async fn find(&self, query: &ContentQuery<E::Status>)
    -> Result<Vec<E>, ContentRepositoryError>;

    /// Every stored entity, in no particular order.
    async fn scan(&self) -> Result<Vec<E>, ContentRepositoryError>;
}

/// Fixture implementation for tests that do not exercise persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureContentRepository;

#[async_trait]
impl<E: ContentEntity> ContentRepository<E> for FixtureContentRepository {
    async fn create(&self, _entity: &E) -> Result<(), ContentRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &ContentId) -> Result<Option<E>, ContentRepositoryError> {
        Ok(None)
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<E>, ContentRepositoryError> {
        Ok(None)
    }

    async fn save(
        &self,
        _entity: &E,
        _expected_revision: u32,
    ) -> Result<(), ContentRepositoryError> {
        Ok(())
    }

    async fn find(
        &self,
        _query: &ContentQuery<E::Status>,
    ) -> Result<Vec<E>, ContentRepositoryError> {
        Ok(Vec::new())
    }

    async fn scan(&self) -> Result<Vec<E>, ContentRepositoryError> {
        Ok(Vec::new())
    }
}
