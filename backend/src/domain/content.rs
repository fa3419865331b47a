//! Shape shared by every content entity.
//!
//! Blog posts, case studies, jobs, products, and services all carry a
//! [`ContentHeader`]: identity, slug, title, lifecycle status, timestamps,
//! counters, weak references to siblings, and a persistence revision. The
//! [`ContentEntity`] trait ties a concrete type to its status enumeration,
//! draft and patch payloads, tracked counters, and derived metrics so the
//! lifecycle, action, and analytics code can be written once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ids::{ContentId, UserId};
use super::lifecycle::LifecycleStatus;
use super::metrics::DerivedMetrics;
use super::slug::generate_slug;

mod counters;
mod validation;

pub use counters::{CounterKind, Counters, ParseCounterKindError};
pub use validation::{SchemaViolation, TITLE_MAX, TITLE_MIN, ValidationReport, ViolationKind};

/// Entity type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Blog,
    CaseStudy,
    Job,
    Product,
    Service,
}

impl ContentKind {
    /// Stable snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::CaseStudy => "case_study",
            Self::Job => "job",
            Self::Product => "product",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-owning reference to another content entity.
///
/// The target may be archived or missing; readers resolve it lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct ContentRef {
    /// Kind.
    pub kind: ContentKind,
    /// Id.
    pub id: ContentId,
}

/// Fields common to every content entity.
///
/// ## Invariants
/// - `slug` is valid and never changes after construction.
/// - `published_at` is set once, on the first entry into the published state.
/// - `counters` only grow.
/// - `revision` starts at 1 and grows by one per persisted mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHeader<S> {
    id: ContentId,
    slug: String,
    pub(crate) title: String,
    pub(crate) status: S,
    pub(crate) counters: Counters,
    #[serde(default)]
    pub(crate) related: Vec<ContentRef>,
    created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) published_at: Option<DateTime<Utc>>,
    pub(crate) scheduled_for: Option<DateTime<Utc>>,
    pub(crate) archived_at: Option<DateTime<Utc>>,
    pub(crate) revision: u32,
}

impl<S: LifecycleStatus> ContentHeader<S> {
    /// Construction factory for a fresh header.
    ///
    /// Generates the id, validates the title, and derives the slug from it
    /// unless `explicit_slug` is supplied. Violations are recorded in
    /// `report`; the caller decides whether to discard the header.
    pub(crate) fn create(
        report: &mut ValidationReport,
        title_field: &str,
        title: &str,
        explicit_slug: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let title = report.title(title_field, title);
        let slug = match explicit_slug {
            Some(slug) => {
                report.slug("slug", &slug);
                slug
            }
            None => {
                let derived = generate_slug(&title);
                if derived.is_empty() && !title.is_empty() {
                    report.push(SchemaViolation::new("slug", ViolationKind::InvalidSlug));
                }
                derived
            }
        };

        Self {
            id: ContentId::random(),
            slug,
            title,
            status: S::initial(),
            counters: Counters::default(),
            related: Vec::new(),
            created_at: now,
            updated_at: now,
            published_at: None,
            scheduled_for: None,
            archived_at: None,
            revision: 1,
        }
    }
}

impl<S: Copy> ContentHeader<S> {
    pub fn id(&self) -> ContentId {
        self.id
    }
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }
    pub fn title(&self) -> &str {
        self.title.as_str()
    }
    pub fn status(&self) -> S {
        self.status
    }
    pub fn counters(&self) -> &Counters {
        &self.counters
    }
    pub fn related(&self) -> &[ContentRef] {
        self.related.as_slice()
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }
    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        self.scheduled_for
    }
    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }
    pub fn revision(&self) -> u32 {
        self.revision
    }
}

/// Scalar value of a named field, as seen by filters and aggregations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Flag(_) | Self::Text(_) => None,
        }
    }

    /// Label used when grouping by this value.
    pub fn group_key(&self) -> String {
        match self {
            Self::Flag(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Behaviour shared by the five content entity types.
pub trait ContentEntity:
    Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Lifecycle status enumeration of this type.
    type Status: LifecycleStatus;
    /// Creation payload.
    type Draft: Send + 'static;
    /// Edit payload; cloned when a write is retried. The default value
    /// changes nothing.
    type Patch: Clone + Default + PartialEq + Send + Sync + 'static;

    /// Entity type discriminator.
    const KIND: ContentKind;
    /// Counters this type tracks; recording any other counter is rejected.
    const COUNTERS: &'static [CounterKind];
    /// Type-specific field names exposed through [`ContentEntity::field`].
    const FIELDS: &'static [&'static str];

    /// Validate a draft and build a new entity in its initial state.
    fn from_draft(draft: Self::Draft, now: DateTime<Utc>) -> Result<Self, ValidationReport>;

    /// Validate and apply an edit made by `editor`.
    fn apply_patch(
        &mut self,
        patch: Self::Patch,
        editor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationReport>;

    fn header(&self) -> &ContentHeader<Self::Status>;

    fn header_mut(&mut self) -> &mut ContentHeader<Self::Status>;

    /// Compute derived metrics from the stored fields.
    fn metrics(&self) -> DerivedMetrics;

    /// Value of a type-specific field listed in [`ContentEntity::FIELDS`].
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Approved comments counted toward engagement.
    fn approved_comments(&self) -> u64 {
        0
    }
}

/// Entity paired with metrics computed at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView<E> {
    /// Entity.
    #[serde(flatten)]
    pub entity: E,
    /// Computed on read, never stored.
    pub derived_metrics: DerivedMetrics,
}

impl<E: ContentEntity> ContentView<E> {
    /// Attach freshly computed metrics to `entity`.
    pub fn of(entity: E) -> Self {
        let derived_metrics = entity.metrics();
        Self {
            entity,
            derived_metrics,
        }
    }
}
