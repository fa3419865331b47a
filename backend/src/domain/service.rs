//! Professional services (billing, coding, credentialing engagements).
//!
//! The entity is named [`ServiceOffering`] to keep it apart from the
//! application services in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{
    ContentEntity, ContentHeader, ContentKind, CounterKind, FieldValue, ValidationReport,
};
use super::ids::UserId;
use super::lifecycle::{LifecycleAction, LifecycleStatus, define_status};
use super::metrics::{DerivedMetrics, EngagementInputs, conversion_rate, engagement_rate};

pub const CATEGORY_MAX: usize = 60;
pub const SUMMARY_MAX: usize = 300;
pub const DESCRIPTION_MAX: usize = 10_000;
pub const DELIVERABLES_MAX: usize = 20;

define_status! {
    /// Availability of a service offering.
    pub enum ServiceStatus {
        Draft => "draft",
        Active => "active",
        Inactive => "inactive",
        Archived => "archived",
    }
}

impl LifecycleStatus for ServiceStatus {
    const ALL: &'static [Self] = Self::NAMES;

    fn name(self) -> &'static str {
        self.as_str()
    }

    fn initial() -> Self {
        Self::Draft
    }

    fn published() -> Self {
        Self::Active
    }

    fn target(self, action: LifecycleAction) -> Option<Self> {
        match (self, action) {
            (Self::Draft, LifecycleAction::Publish) => Some(Self::Active),
            (Self::Active, LifecycleAction::Pause) => Some(Self::Inactive),
            (Self::Inactive, LifecycleAction::Reopen) => Some(Self::Active),
            (Self::Archived, _) => None,
            (_, LifecycleAction::Archive) => Some(Self::Archived),
            _ => None,
        }
    }

    fn is_retired(self) -> bool {
        self == Self::Archived
    }
}

/// Creation payload for a service offering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceDraft {
    /// Display name; stored as the header title.
    pub name: String,
    /// Explicit slug; generated from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// Summary.
    pub summary: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Deliverables.
    #[serde(default)]
    pub deliverables: Vec<String>,
    /// Owning user.
    pub created_by: UserId,
}

/// Edit payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServicePatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement summary.
    pub summary: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement deliverables.
    pub deliverables: Option<Vec<String>>,
}

/// A service the company sells. The header title holds the service name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOffering {
    #[serde(flatten)]
    header: ContentHeader<ServiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    deliverables: Vec<String>,
    created_by: UserId,
}

impl ServiceOffering {
    pub fn name(&self) -> &str {
        self.header.title()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn summary(&self) -> &str {
        self.summary.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn deliverables(&self) -> &[String] {
        self.deliverables.as_slice()
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }
}

impl ContentEntity for ServiceOffering {
    type Status = ServiceStatus;
    type Draft = ServiceDraft;
    type Patch = ServicePatch;

    const KIND: ContentKind = ContentKind::Service;
    const COUNTERS: &'static [CounterKind] = &[
        CounterKind::Views,
        CounterKind::Inquiries,
        CounterKind::Conversions,
    ];
    const FIELDS: &'static [&'static str] = &["name", "category"];

    fn from_draft(draft: ServiceDraft, now: DateTime<Utc>) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let header = ContentHeader::create(&mut report, "name", &draft.name, draft.slug, now);
        let category = report.optional_text("category", draft.category, CATEGORY_MAX);
        let summary = report.text("summary", &draft.summary, 1, SUMMARY_MAX);
        let description = report.optional_text("description", draft.description, DESCRIPTION_MAX);
        let deliverables = report.items("deliverables", draft.deliverables, DELIVERABLES_MAX);

        report.finish(Self {
            header,
            category,
            summary,
            description,
            deliverables,
            created_by: draft.created_by,
        })
    }

    fn apply_patch(
        &mut self,
        patch: ServicePatch,
        _editor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        let name = patch.name.map(|name| report.title("name", &name));
        let category = patch
            .category
            .map(|value| report.optional_text("category", Some(value), CATEGORY_MAX));
        let summary = patch
            .summary
            .map(|value| report.text("summary", &value, 1, SUMMARY_MAX));
        let description = patch
            .description
            .map(|value| report.optional_text("description", Some(value), DESCRIPTION_MAX));
        let deliverables = patch
            .deliverables
            .map(|items| report.items("deliverables", items, DELIVERABLES_MAX));
        report.finish(())?;

        if let Some(name) = name {
            self.header.title = name;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(summary) = summary {
            self.summary = summary;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(deliverables) = deliverables {
            self.deliverables = deliverables;
        }
        self.header.updated_at = now;
        Ok(())
    }

    fn header(&self) -> &ContentHeader<ServiceStatus> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ContentHeader<ServiceStatus> {
        &mut self.header
    }

    fn metrics(&self) -> DerivedMetrics {
        let counters = self.header.counters();
        DerivedMetrics {
            engagement_rate: engagement_rate(EngagementInputs {
                views: counters.get(CounterKind::Views),
                ..EngagementInputs::default()
            }),
            conversion_rate: Some(conversion_rate(
                counters.get(CounterKind::Conversions),
                counters.get(CounterKind::Inquiries),
            )),
            ..DerivedMetrics::default()
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(FieldValue::from(self.header.title())),
            "category" => self.category.clone().map(FieldValue::from),
            _ => None,
        }
    }
}
