//! Domain primitives, entities, and services.
//!
//! Purpose: model the five content types (blog posts, case studies, job
//! postings, products, and service offerings) with their lifecycles, counters,
//! derived metrics, and aggregations. Nothing here knows about transports or
//! storage engines; persistence is reached through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`) and ErrorCode: transport-agnostic failures.
//! - ContentEntity, ContentHeader, ContentView: the shape shared by every type.
//! - ContentService and AnalyticsService: orchestration over a repository port.
//! - generate_slug and humanize: text helpers used by the entities.

pub mod actions;
pub mod analytics;
pub mod analytics_service;
pub mod blog;
pub mod case_study;
pub mod comments;
pub mod content;
pub mod content_service;
pub mod error;
pub mod ids;
pub mod job;
pub mod lifecycle;
pub mod metrics;
pub mod ports;
pub mod product;
pub mod service;
pub mod slug;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::analytics_service::AnalyticsService;
pub use self::comments::{Comment, CommentDraft, CommentStatus, Commentable};
pub use self::content::{
    ContentEntity, ContentHeader, ContentKind, ContentRef, ContentView, CounterKind, Counters,
    FieldValue, SchemaViolation, ValidationReport, ViolationKind,
};
pub use self::content_service::{ContentService, ContentServiceSettings, ListRequest};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{CommentId, ContentId, IdValidationError, UserId};
pub use self::lifecycle::{LifecycleAction, LifecycleStatus, ParseStatusError, TransitionOutcome};
pub use self::metrics::DerivedMetrics;
pub use self::slug::{generate_slug, humanize, is_valid_slug};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use content_backend::domain::{DomainResult, Error, generate_slug};
///
/// fn slug_for(title: &str) -> DomainResult<String> {
///     let slug = generate_slug(title);
///     if slug.is_empty() {
///         return Err(Error::invalid_argument("title has no sluggable characters"));
///     }
///     Ok(slug)
/// }
///
/// assert_eq!(slug_for("Denial Management 101!!").ok().as_deref(), Some("denial-management-101"));
/// assert!(slug_for("!!!").is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
