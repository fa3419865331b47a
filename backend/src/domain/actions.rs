//! Counter, comment, and relation actions.
//!
//! Each action mutates one in-memory entity: one counter increment plus any
//! bookkeeping that belongs with it. Persisting the result is the caller's
//! job; see [`crate::domain::ContentService`].

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use super::blog::{Blog, SharePlatform};
use super::comments::{Comment, CommentDraft, CommentStatus, Commentable};
use super::content::{ContentEntity, ContentRef, CounterKind};
use super::error::Error;
use super::ids::CommentId;
use super::job::{ApplicationSource, Job};

/// Increment `kind` on `entity`, returning the new value.
///
/// Counters outside [`ContentEntity::COUNTERS`] are rejected with
/// `InvalidArgument`. Engagement does not count as an edit, so `updatedAt`
/// is left alone.
pub fn record_counter<E: ContentEntity>(entity: &mut E, kind: CounterKind) -> Result<u64, Error> {
    if !E::COUNTERS.contains(&kind) {
        return Err(Error::invalid_argument(format!(
            "{} content does not track {kind}",
            E::KIND
        ))
        .with_details(json!({ "counter": kind.as_str(), "kind": E::KIND.as_str() })));
    }
    Ok(entity.header_mut().counters.increment(kind))
}

/// Record a share of `blog` on `platform`.
///
/// The total always grows. Platforms without a breakdown slot are logged and
/// left out of the breakdown.
pub fn record_share(blog: &mut Blog, platform: &str) -> Result<u64, Error> {
    let total = record_counter(blog, CounterKind::Shares)?;
    match platform.parse::<SharePlatform>() {
        Ok(platform) => blog.count_platform_share(platform),
        Err(err) => warn!(blog_id = %blog.header().id(), %err, "share breakdown skipped"),
    }
    Ok(total)
}

/// Record an application to `job` arriving through `source`.
///
/// Unknown sources follow the same rule as share platforms.
pub fn record_application(job: &mut Job, source: &str) -> Result<u64, Error> {
    let total = record_counter(job, CounterKind::Applications)?;
    match source.parse::<ApplicationSource>() {
        Ok(source) => job.count_source_application(source),
        Err(err) => warn!(job_id = %job.header().id(), %err, "application breakdown skipped"),
    }
    Ok(total)
}

/// Validate `draft` and attach it to `entity` as a pending comment.
pub fn add_comment<E: Commentable>(
    entity: &mut E,
    draft: CommentDraft,
    now: DateTime<Utc>,
) -> Result<CommentId, Error> {
    let comment = Comment::from_draft(draft, now).map_err(|report| Error::validation(&report))?;
    let id = comment.id();
    entity.comments_mut().push(comment);
    entity.header_mut().updated_at = now;
    Ok(id)
}

/// Mark comment `id` as approved so it counts toward engagement.
pub fn approve_comment<E: Commentable>(
    entity: &mut E,
    id: CommentId,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    moderate_comment(entity, id, CommentStatus::Approved, now)
}

/// Set the moderation status of comment `id`.
pub fn moderate_comment<E: Commentable>(
    entity: &mut E,
    id: CommentId,
    status: CommentStatus,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let comment = entity
        .comments_mut()
        .iter_mut()
        .find(|comment| comment.id() == id)
        .ok_or_else(|| {
            Error::not_found(format!("comment {id} not found"))
                .with_details(json!({ "commentId": id.to_string() }))
        })?;
    comment.status = status;
    entity.header_mut().updated_at = now;
    Ok(())
}

/// Add a weak reference from `entity` to `target`.
///
/// Returns `false` when the reference already existed. The target is not
/// checked for existence.
pub fn relate<E: ContentEntity>(
    entity: &mut E,
    target: ContentRef,
    now: DateTime<Utc>,
) -> Result<bool, Error> {
    let header = entity.header_mut();
    if target.kind == E::KIND && target.id == header.id() {
        return Err(Error::invalid_argument("content cannot relate to itself")
            .with_details(json!({ "field": "target" })));
    }
    if header.related.contains(&target) {
        return Ok(false);
    }
    header.related.push(target);
    header.updated_at = now;
    Ok(true)
}
