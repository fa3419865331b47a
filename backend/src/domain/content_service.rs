//! Application service for one content entity type.
//!
//! Every mutation is a read-modify-save cycle: load the entity, apply a pure
//! domain function, bump the revision, and save with the previous revision as
//! the expected value. Writers to the same entity are serialised in-process by
//! a keyed async mutex whose entries live only while a write is in flight; a [`ContentRepositoryError::RevisionMismatch`] means
//! another process won the race and the cycle is retried.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::actions;
use super::blog::Blog;
use super::comments::{CommentDraft, CommentStatus};
use super::content::{ContentEntity, ContentRef, ContentView, CounterKind};
use super::error::{Error, ErrorCode};
use super::ids::{CommentId, ContentId, UserId};
use super::job::Job;
use super::lifecycle::{self, LifecycleAction, LifecycleStatus, TransitionOutcome};
use super::ports::{ContentQuery, ContentRepository, ContentRepositoryError, ContentSort};

/// Tunables for [`ContentService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentServiceSettings {
    /// Save attempts before a revision race surfaces as `Conflict`.
    pub max_write_attempts: u32,
    /// Page size when a listing names none.
    pub default_list_limit: usize,
    /// Upper bound on any page size.
    pub max_list_limit: usize,
}

impl Default for ContentServiceSettings {
    fn default() -> Self {
        Self {
            max_write_attempts: 5,
            default_list_limit: 20,
            max_list_limit: 100,
        }
    }
}

/// Listing request accepted by [`ContentService::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest<S> {
    /// Only entities in this status, when set.
    pub status: Option<S>,
    /// Sort.
    pub sort: ContentSort,
    /// Clamped to `1..=max_list_limit`; `None` uses the default limit.
    pub limit: Option<usize>,
}

impl<S> Default for ListRequest<S> {
    fn default() -> Self {
        Self {
            status: None,
            sort: ContentSort::default(),
            limit: None,
        }
    }
}

/// Whether a mutation needs persisting.
enum Outcome<T> {
    Saved(T),
    Skipped(T),
}

pub(crate) fn map_repository_error(error: ContentRepositoryError) -> Error {
    debug!(variant = error.variant(), %error, "content repository error");
    match error {
        ContentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("content repository unavailable: {message}"))
        }
        ContentRepositoryError::Query { message } => {
            Error::internal(format!("content repository error: {message}"))
        }
        ContentRepositoryError::DuplicateSlug { slug } => Error::duplicate_key("slug", &slug),
        ContentRepositoryError::RevisionMismatch { expected, actual } => Error::conflict(format!(
            "content changed concurrently (expected revision {expected}, found {actual})"
        )),
        ContentRepositoryError::NotFound { id } => Error::not_found(format!("content {id} not found")),
    }
}

/// Content service for entity type `E` backed by repository `R`.
pub struct ContentService<E, R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    settings: ContentServiceSettings,
    locks: Arc<Mutex<HashMap<ContentId, Arc<Mutex<()>>>>>,
    entity: PhantomData<fn() -> E>,
}

impl<E, R> Clone for ContentService<E, R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
            locks: Arc::clone(&self.locks),
            entity: PhantomData,
        }
    }
}

impl<E, R> ContentService<E, R> {
    /// Create a service with default settings.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(repo, clock, ContentServiceSettings::default())
    }

    /// Create a service with explicit settings; zero attempts is raised to one.
    pub fn with_settings(
        repo: Arc<R>,
        clock: Arc<dyn Clock>,
        settings: ContentServiceSettings,
    ) -> Self {
        Self {
            repo,
            clock,
            settings: ContentServiceSettings {
                max_write_attempts: settings.max_write_attempts.max(1),
                ..settings
            },
            locks: Arc::new(Mutex::new(HashMap::new())),
            entity: PhantomData,
        }
    }

    /// Effective settings.
    pub fn settings(&self) -> ContentServiceSettings {
        self.settings
    }

    fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_list_limit)
            .clamp(1, self.settings.max_list_limit.max(1))
    }

    async fn entity_lock(&self, id: ContentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drop the map entry for `id` once no other writer holds or awaits it.
    async fn release_lock(&self, id: &ContentId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference lives in the map, the other is `lock`.
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(id);
        }
    }
}

impl<E, R> ContentService<E, R>
where
    E: ContentEntity,
    R: ContentRepository<E>,
{
    /// Validate `draft` and store the new entity.
    pub async fn create(&self, draft: E::Draft) -> Result<ContentView<E>, Error> {
        let entity = E::from_draft(draft, self.clock.utc()).map_err(|report| {
            debug!(kind = E::KIND.as_str(), %report, "content draft rejected");
            Error::validation(&report)
        })?;
        self.repo
            .create(&entity)
            .await
            .map_err(map_repository_error)?;
        info!(
            kind = E::KIND.as_str(),
            id = %entity.header().id(),
            slug = entity.header().slug(),
            "content created"
        );
        Ok(ContentView::of(entity))
    }

    /// Fetch an entity with freshly computed metrics.
    pub async fn get(&self, id: &ContentId) -> Result<ContentView<E>, Error> {
        self.load(id).await.map(ContentView::of)
    }

    /// Fetch an entity by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<ContentView<E>, Error> {
        self.repo
            .find_by_slug(slug)
            .await
            .map_err(map_repository_error)?
            .map(ContentView::of)
            .ok_or_else(|| Error::not_found(format!("{} `{slug}` not found", E::KIND)))
    }

    /// List entities; the limit is clamped to the configured bounds.
    pub async fn list(
        &self,
        request: ListRequest<E::Status>,
    ) -> Result<Vec<ContentView<E>>, Error> {
        let query = ContentQuery {
            status: request.status,
            sort: request.sort,
            limit: self.clamp_limit(request.limit),
        };
        let entities = self.repo.find(&query).await.map_err(map_repository_error)?;
        Ok(entities.into_iter().map(ContentView::of).collect())
    }

    /// Apply a validated edit. The slug never changes; an empty patch is not
    /// saved.
    pub async fn update(
        &self,
        id: &ContentId,
        patch: E::Patch,
        editor: &UserId,
    ) -> Result<ContentView<E>, Error> {
        let (view, ()) = self
            .mutate(id, "update", |entity, now| {
                if patch == E::Patch::default() {
                    return Ok(Outcome::Skipped(()));
                }
                entity
                    .apply_patch(patch.clone(), editor, now)
                    .map_err(|report| Error::validation(&report))?;
                Ok(Outcome::Saved(()))
            })
            .await?;
        Ok(view)
    }

    /// Apply a named lifecycle action.
    pub async fn transition(
        &self,
        id: &ContentId,
        action: LifecycleAction,
    ) -> Result<ContentView<E>, Error> {
        let (view, outcome) = self
            .mutate(id, action.as_str(), |entity, now| {
                lifecycle::apply_action(entity, action, now).map(saved_if_applied)
            })
            .await?;
        log_transition::<E>(id, action, &outcome);
        Ok(view)
    }

    /// Move the entity into its published-equivalent state.
    ///
    /// Publishing an already published entity is a no-op.
    pub async fn publish(&self, id: &ContentId) -> Result<ContentView<E>, Error> {
        self.transition(id, LifecycleAction::Publish).await
    }

    /// Schedule the entity for publication at `at`.
    pub async fn schedule(
        &self,
        id: &ContentId,
        at: DateTime<Utc>,
    ) -> Result<ContentView<E>, Error> {
        let (view, outcome) = self
            .mutate(id, "schedule", |entity, now| {
                lifecycle::schedule(entity, at, now).map(saved_if_applied)
            })
            .await?;
        log_transition::<E>(id, LifecycleAction::Schedule, &outcome);
        Ok(view)
    }

    /// Publish every scheduled entity whose time has come.
    ///
    /// Returns the ids that were published by this call.
    pub async fn publish_due(&self) -> Result<Vec<ContentId>, Error> {
        let Some(scheduled) = <E::Status as LifecycleStatus>::scheduled() else {
            return Ok(Vec::new());
        };
        let query = ContentQuery {
            status: Some(scheduled),
            sort: ContentSort::OldestFirst,
            limit: usize::MAX,
        };
        let now = self.clock.utc();
        let candidates = self.repo.find(&query).await.map_err(map_repository_error)?;

        let mut published = Vec::new();
        for entity in candidates
            .into_iter()
            .filter(|entity| lifecycle::is_due(entity, now))
        {
            let id = entity.header().id();
            let result = self
                .mutate(&id, "publish_due", |entity, now| {
                    if !lifecycle::is_due(entity, now) {
                        return Ok(Outcome::Skipped(false));
                    }
                    lifecycle::publish(entity, now).map(|_| Outcome::Saved(true))
                })
                .await;
            match result {
                Ok((_, true)) => published.push(id),
                Ok((_, false)) => {}
                Err(err) if matches!(err.code(), ErrorCode::NotFound | ErrorCode::InvalidTransition) => {
                    warn!(kind = E::KIND.as_str(), %id, %err, "scheduled content skipped");
                }
                Err(err) => return Err(err),
            }
        }
        if !published.is_empty() {
            info!(kind = E::KIND.as_str(), count = published.len(), "scheduled content published");
        }
        Ok(published)
    }

    /// Increment `kind`, returning the new value.
    pub async fn record_counter(&self, id: &ContentId, kind: CounterKind) -> Result<u64, Error> {
        let (_, value) = self
            .mutate(id, kind.as_str(), |entity, _| {
                actions::record_counter(entity, kind).map(Outcome::Saved)
            })
            .await?;
        Ok(value)
    }

    /// Increment `views`.
    pub async fn record_view(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Views).await
    }

    /// Increment `likes`.
    pub async fn record_like(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Likes).await
    }

    /// Increment `downloads`.
    pub async fn record_download(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Downloads).await
    }

    /// Increment `inquiries`.
    pub async fn record_inquiry(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Inquiries).await
    }

    /// Increment `demos`.
    pub async fn record_demo(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Demos).await
    }

    /// Increment `trials`.
    pub async fn record_trial(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Trials).await
    }

    /// Increment `conversions`.
    pub async fn record_conversion(&self, id: &ContentId) -> Result<u64, Error> {
        self.record_counter(id, CounterKind::Conversions).await
    }

    /// Add a weak reference to another entity. Duplicates are ignored.
    pub async fn relate(
        &self,
        id: &ContentId,
        target: ContentRef,
    ) -> Result<ContentView<E>, Error> {
        let (view, _) = self
            .mutate(id, "relate", |entity, now| {
                actions::relate(entity, target, now).map(|added| {
                    if added {
                        Outcome::Saved(())
                    } else {
                        Outcome::Skipped(())
                    }
                })
            })
            .await?;
        Ok(view)
    }

    async fn load(&self, id: &ContentId) -> Result<E, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("{} {id} not found", E::KIND)))
    }

    async fn mutate<T, F>(
        &self,
        id: &ContentId,
        operation: &'static str,
        apply: F,
    ) -> Result<(ContentView<E>, T), Error>
    where
        F: FnMut(&mut E, DateTime<Utc>) -> Result<Outcome<T>, Error> + Send,
        T: Send,
    {
        let lock = self.entity_lock(*id).await;
        let result = {
            let _guard = lock.lock().await;
            self.mutate_locked(id, operation, apply).await
        };
        self.release_lock(id, lock).await;
        result
    }

    async fn mutate_locked<T, F>(
        &self,
        id: &ContentId,
        operation: &'static str,
        mut apply: F,
    ) -> Result<(ContentView<E>, T), Error>
    where
        F: FnMut(&mut E, DateTime<Utc>) -> Result<Outcome<T>, Error> + Send,
        T: Send,
    {
        let mut attempt = 1;
        loop {
            let mut entity = self.load(id).await?;
            let expected = entity.header().revision();
            let value = match apply(&mut entity, self.clock.utc())? {
                Outcome::Skipped(value) => return Ok((ContentView::of(entity), value)),
                Outcome::Saved(value) => value,
            };
            entity.header_mut().revision = expected.saturating_add(1);

            match self.repo.save(&entity, expected).await {
                Ok(()) => {
                    debug!(
                        kind = E::KIND.as_str(),
                        %id,
                        operation,
                        revision = entity.header().revision(),
                        "content saved"
                    );
                    return Ok((ContentView::of(entity), value));
                }
                Err(ContentRepositoryError::RevisionMismatch { expected, actual })
                    if attempt < self.settings.max_write_attempts =>
                {
                    warn!(
                        kind = E::KIND.as_str(),
                        %id,
                        operation,
                        attempt,
                        expected,
                        actual,
                        "revision race lost; retrying"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(map_repository_error(err)),
            }
        }
    }
}

fn saved_if_applied<S>(outcome: TransitionOutcome<S>) -> Outcome<TransitionOutcome<S>> {
    if outcome.is_applied() {
        Outcome::Saved(outcome)
    } else {
        Outcome::Skipped(outcome)
    }
}

fn log_transition<E: ContentEntity>(
    id: &ContentId,
    action: LifecycleAction,
    outcome: &TransitionOutcome<E::Status>,
) {
    match outcome {
        TransitionOutcome::Applied { from, to } => {
            info!(kind = E::KIND.as_str(), %id, %action, %from, %to, "content transitioned");
        }
        TransitionOutcome::Unchanged(status) => {
            debug!(kind = E::KIND.as_str(), %id, %action, %status, "transition was a no-op");
        }
    }
}

impl<R> ContentService<Blog, R>
where
    R: ContentRepository<Blog>,
{
    /// Record a share on `platform`, returning the new share total.
    pub async fn record_share(&self, id: &ContentId, platform: &str) -> Result<u64, Error> {
        let (_, total) = self
            .mutate(id, "record_share", |blog, _| {
                actions::record_share(blog, platform).map(Outcome::Saved)
            })
            .await?;
        Ok(total)
    }

    /// Attach a pending comment, returning its id.
    pub async fn add_comment(&self, id: &ContentId, draft: CommentDraft) -> Result<CommentId, Error> {
        let (_, comment_id) = self
            .mutate(id, "add_comment", |blog, now| {
                actions::add_comment(blog, draft.clone(), now).map(Outcome::Saved)
            })
            .await?;
        Ok(comment_id)
    }

    /// Approve a comment so it counts toward engagement.
    pub async fn approve_comment(
        &self,
        id: &ContentId,
        comment_id: CommentId,
    ) -> Result<ContentView<Blog>, Error> {
        self.moderate_comment(id, comment_id, CommentStatus::Approved)
            .await
    }

    /// Set a comment's moderation status; unknown comment ids are `not_found`.
    pub async fn moderate_comment(
        &self,
        id: &ContentId,
        comment_id: CommentId,
        status: CommentStatus,
    ) -> Result<ContentView<Blog>, Error> {
        let (view, ()) = self
            .mutate(id, "moderate_comment", |blog, now| {
                actions::moderate_comment(blog, comment_id, status, now).map(Outcome::Saved)
            })
            .await?;
        Ok(view)
    }
}

impl<R> ContentService<Job, R>
where
    R: ContentRepository<Job>,
{
    /// Record an application arriving through `source`.
    pub async fn record_application(&self, id: &ContentId, source: &str) -> Result<u64, Error> {
        let (_, total) = self
            .mutate(id, "record_application", |job, _| {
                actions::record_application(job, source).map(Outcome::Saved)
            })
            .await?;
        Ok(total)
    }
}

#[cfg(test)]
#[path = "content_service_tests.rs"]
mod tests;
