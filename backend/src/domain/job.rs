//! Job postings and the applications they attract.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{
    ContentEntity, ContentHeader, ContentKind, CounterKind, FieldValue, ValidationReport,
};
use super::ids::UserId;
use super::lifecycle::{LifecycleAction, LifecycleStatus, define_status};
use super::metrics::{DerivedMetrics, EngagementInputs, conversion_rate, engagement_rate};

pub const DEPARTMENT_MAX: usize = 80;
pub const LOCATION_MAX: usize = 120;
pub const DESCRIPTION_MAX: usize = 10_000;

define_status! {
    /// Hiring state of a job posting.
    pub enum JobStatus {
        Draft => "draft",
        Open => "open",
        Paused => "paused",
        Closed => "closed",
        Filled => "filled",
        Cancelled => "cancelled",
    }
}

impl LifecycleStatus for JobStatus {
    const ALL: &'static [Self] = Self::NAMES;

    fn name(self) -> &'static str {
        self.as_str()
    }

    fn initial() -> Self {
        Self::Draft
    }

    fn published() -> Self {
        Self::Open
    }

    fn target(self, action: LifecycleAction) -> Option<Self> {
        match (self, action) {
            (Self::Draft, LifecycleAction::Publish) => Some(Self::Open),
            (Self::Open, LifecycleAction::Pause) => Some(Self::Paused),
            (Self::Paused, LifecycleAction::Reopen) => Some(Self::Open),
            (Self::Open | Self::Paused, LifecycleAction::Close) => Some(Self::Closed),
            (Self::Open | Self::Paused | Self::Closed, LifecycleAction::Fill) => Some(Self::Filled),
            (Self::Draft | Self::Open | Self::Paused, LifecycleAction::Cancel) => {
                Some(Self::Cancelled)
            }
            _ => None,
        }
    }

    fn is_retired(self) -> bool {
        matches!(self, Self::Closed | Self::Filled | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl EmploymentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullTime => "full_time",
            Self::PartTime => "part_time",
            Self::Contract => "contract",
            Self::Internship => "internship",
        }
    }
}

/// Channels with a dedicated application counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationSource {
    Website,
    Linkedin,
    Indeed,
    Referral,
    Other,
}

impl ApplicationSource {
    pub const ALL: [Self; 5] = [
        Self::Website,
        Self::Linkedin,
        Self::Indeed,
        Self::Referral,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Linkedin => "linkedin",
            Self::Indeed => "indeed",
            Self::Referral => "referral",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ApplicationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an application channel without a breakdown slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownApplicationSource(pub String);

impl fmt::Display for UnknownApplicationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown application source `{}`", self.0)
    }
}

impl std::error::Error for UnknownApplicationSource {}

impl FromStr for ApplicationSource {
    type Err = UnknownApplicationSource;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == normalised)
            .ok_or_else(|| UnknownApplicationSource(value.to_owned()))
    }
}

/// Creation payload for a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobDraft {
    /// Display title.
    pub title: String,
    /// Explicit slug; generated from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Department.
    pub department: String,
    /// Location.
    pub location: String,
    /// Defaults to full time.
    #[serde(default)]
    pub employment_type: EmploymentType,
    /// Description.
    pub description: String,
    /// Owning user.
    pub hiring_manager: UserId,
}

/// Edit payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement department.
    pub department: Option<String>,
    /// Replacement location.
    pub location: Option<String>,
    /// Replacement employment type.
    pub employment_type: Option<EmploymentType>,
    /// Replacement description.
    pub description: Option<String>,
}

/// An open or historical position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(flatten)]
    header: ContentHeader<JobStatus>,
    department: String,
    location: String,
    #[serde(default)]
    employment_type: EmploymentType,
    description: String,
    hiring_manager: UserId,
    #[serde(default)]
    applications_by_source: BTreeMap<ApplicationSource, u64>,
}

impl Job {
    pub fn department(&self) -> &str {
        self.department.as_str()
    }

    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    pub fn employment_type(&self) -> EmploymentType {
        self.employment_type
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn hiring_manager(&self) -> &UserId {
        &self.hiring_manager
    }

    /// Applications per recognised channel.
    pub fn applications_by_source(&self) -> &BTreeMap<ApplicationSource, u64> {
        &self.applications_by_source
    }

    pub(crate) fn count_source_application(&mut self, source: ApplicationSource) {
        let slot = self.applications_by_source.entry(source).or_insert(0);
        *slot = slot.saturating_add(1);
    }
}

impl ContentEntity for Job {
    type Status = JobStatus;
    type Draft = JobDraft;
    type Patch = JobPatch;

    const KIND: ContentKind = ContentKind::Job;
    const COUNTERS: &'static [CounterKind] = &[CounterKind::Views, CounterKind::Applications];
    const FIELDS: &'static [&'static str] =
        &["department", "location", "employmentType", "hiringManager"];

    fn from_draft(draft: JobDraft, now: DateTime<Utc>) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let header = ContentHeader::create(&mut report, "title", &draft.title, draft.slug, now);
        let department = report.text("department", &draft.department, 1, DEPARTMENT_MAX);
        let location = report.text("location", &draft.location, 1, LOCATION_MAX);
        let description = report.text("description", &draft.description, 1, DESCRIPTION_MAX);

        report.finish(Self {
            header,
            department,
            location,
            employment_type: draft.employment_type,
            description,
            hiring_manager: draft.hiring_manager,
            applications_by_source: BTreeMap::new(),
        })
    }

    fn apply_patch(
        &mut self,
        patch: JobPatch,
        _editor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        let title = patch.title.map(|title| report.title("title", &title));
        let department = patch
            .department
            .map(|value| report.text("department", &value, 1, DEPARTMENT_MAX));
        let location = patch
            .location
            .map(|value| report.text("location", &value, 1, LOCATION_MAX));
        let description = patch
            .description
            .map(|value| report.text("description", &value, 1, DESCRIPTION_MAX));
        report.finish(())?;

        if let Some(title) = title {
            self.header.title = title;
        }
        if let Some(department) = department {
            self.department = department;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(employment_type) = patch.employment_type {
            self.employment_type = employment_type;
        }
        if let Some(description) = description {
            self.description = description;
        }
        self.header.updated_at = now;
        Ok(())
    }

    fn header(&self) -> &ContentHeader<JobStatus> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ContentHeader<JobStatus> {
        &mut self.header
    }

    fn metrics(&self) -> DerivedMetrics {
        let counters = self.header.counters();
        let views = counters.get(CounterKind::Views);
        DerivedMetrics {
            engagement_rate: engagement_rate(EngagementInputs {
                views,
                ..EngagementInputs::default()
            }),
            conversion_rate: Some(conversion_rate(
                counters.get(CounterKind::Applications),
                views,
            )),
            ..DerivedMetrics::default()
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "department" => Some(FieldValue::from(self.department.as_str())),
            "location" => Some(FieldValue::from(self.location.as_str())),
            "employmentType" => Some(FieldValue::from(self.employment_type.as_str())),
            "hiringManager" => Some(FieldValue::from(self.hiring_manager.to_string())),
            _ => None,
        }
    }
}
