//! Client case studies with quantified revenue-cycle results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{
    ContentEntity, ContentHeader, ContentKind, CounterKind, FieldValue, SchemaViolation,
    ValidationReport, ViolationKind,
};
use super::ids::UserId;
use super::lifecycle::{LifecycleAction, LifecycleStatus, define_status};
use super::metrics::{DerivedMetrics, EngagementInputs, conversion_rate, engagement_rate, roi};

pub const CLIENT_NAME_MAX: usize = 120;
pub const INDUSTRY_MAX: usize = 80;
pub const NARRATIVE_MAX: usize = 5_000;

define_status! {
    /// Editorial state of a case study. Publication requires approval.
    pub enum CaseStudyStatus {
        Draft => "draft",
        Review => "review",
        Approved => "approved",
        Published => "published",
        Archived => "archived",
    }
}

impl LifecycleStatus for CaseStudyStatus {
    const ALL: &'static [Self] = Self::NAMES;

    fn name(self) -> &'static str {
        self.as_str()
    }

    fn initial() -> Self {
        Self::Draft
    }

    fn published() -> Self {
        Self::Published
    }

    fn target(self, action: LifecycleAction) -> Option<Self> {
        match (self, action) {
            (Self::Draft, LifecycleAction::SubmitForReview) => Some(Self::Review),
            (Self::Review, LifecycleAction::Approve) => Some(Self::Approved),
            (Self::Approved, LifecycleAction::Publish) => Some(Self::Published),
            (Self::Archived, _) => None,
            (_, LifecycleAction::Archive) => Some(Self::Archived),
            _ => None,
        }
    }

    fn is_retired(self) -> bool {
        self == Self::Archived
    }
}

/// Measured outcomes. Monetary figures are in the site currency; the
/// reductions are percentage points or days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseStudyResults {
    /// Annual cost savings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_savings: Option<f64>,
    /// Annual revenue increase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_increase: Option<f64>,
    /// Drop in denial rate, in percentage points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_rate_reduction: Option<f64>,
    /// Drop in days in accounts receivable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_in_ar_reduction: Option<f64>,
}

impl CaseStudyResults {
    fn validated(self, report: &mut ValidationReport) -> Self {
        let cost_savings = report.amount("results.costSavings", self.cost_savings);
        let revenue_increase = report.amount("results.revenueIncrease", self.revenue_increase);
        let denial_rate_reduction =
            report.amount("results.denialRateReduction", self.denial_rate_reduction);
        if denial_rate_reduction.is_some_and(|value| value > 100.0) {
            report.push(SchemaViolation::new(
                "results.denialRateReduction",
                ViolationKind::InvalidFormat {
                    expected: "a percentage between 0 and 100",
                },
            ));
        }
        let days_in_ar_reduction =
            report.amount("results.daysInArReduction", self.days_in_ar_reduction);
        Self {
            cost_savings,
            revenue_increase,
            denial_rate_reduction,
            days_in_ar_reduction,
        }
    }
}

/// Creation payload for a case study.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseStudyDraft {
    /// Display title.
    pub title: String,
    /// Explicit slug; generated from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Client name.
    pub client_name: String,
    /// Used for grouping in stats.
    #[serde(default)]
    pub industry: Option<String>,
    /// Problem the client faced.
    pub challenge: String,
    /// What was delivered.
    pub solution: String,
    /// Results.
    #[serde(default)]
    pub results: CaseStudyResults,
    /// Owning user.
    pub created_by: UserId,
}

/// Edit payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaseStudyPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement client name.
    pub client_name: Option<String>,
    /// Replacement industry.
    pub industry: Option<String>,
    /// Replacement challenge.
    pub challenge: Option<String>,
    /// Replacement solution.
    pub solution: Option<String>,
    /// Replacement results.
    pub results: Option<CaseStudyResults>,
}

/// A published account of a client engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy {
    #[serde(flatten)]
    header: ContentHeader<CaseStudyStatus>,
    client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    industry: Option<String>,
    challenge: String,
    solution: String,
    #[serde(default)]
    results: CaseStudyResults,
    created_by: UserId,
}

impl CaseStudy {
    pub fn client_name(&self) -> &str {
        self.client_name.as_str()
    }

    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    pub fn challenge(&self) -> &str {
        self.challenge.as_str()
    }

    pub fn solution(&self) -> &str {
        self.solution.as_str()
    }

    pub fn results(&self) -> &CaseStudyResults {
        &self.results
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }
}

impl ContentEntity for CaseStudy {
    type Status = CaseStudyStatus;
    type Draft = CaseStudyDraft;
    type Patch = CaseStudyPatch;

    const KIND: ContentKind = ContentKind::CaseStudy;
    const COUNTERS: &'static [CounterKind] = &[
        CounterKind::Views,
        CounterKind::Downloads,
        CounterKind::Inquiries,
    ];
    const FIELDS: &'static [&'static str] = &[
        "clientName",
        "industry",
        "costSavings",
        "revenueIncrease",
        "denialRateReduction",
        "daysInArReduction",
    ];

    fn from_draft(draft: CaseStudyDraft, now: DateTime<Utc>) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let header = ContentHeader::create(&mut report, "title", &draft.title, draft.slug, now);
        let client_name = report.text("clientName", &draft.client_name, 1, CLIENT_NAME_MAX);
        let industry = report.optional_text("industry", draft.industry, INDUSTRY_MAX);
        let challenge = report.text("challenge", &draft.challenge, 1, NARRATIVE_MAX);
        let solution = report.text("solution", &draft.solution, 1, NARRATIVE_MAX);
        let results = draft.results.validated(&mut report);

        report.finish(Self {
            header,
            client_name,
            industry,
            challenge,
            solution,
            results,
            created_by: draft.created_by,
        })
    }

    fn apply_patch(
        &mut self,
        patch: CaseStudyPatch,
        _editor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        let title = patch.title.map(|title| report.title("title", &title));
        let client_name = patch
            .client_name
            .map(|name| report.text("clientName", &name, 1, CLIENT_NAME_MAX));
        let industry = patch
            .industry
            .map(|industry| report.optional_text("industry", Some(industry), INDUSTRY_MAX));
        let challenge = patch
            .challenge
            .map(|text| report.text("challenge", &text, 1, NARRATIVE_MAX));
        let solution = patch
            .solution
            .map(|text| report.text("solution", &text, 1, NARRATIVE_MAX));
        let results = patch.results.map(|results| results.validated(&mut report));
        report.finish(())?;

        if let Some(title) = title {
            self.header.title = title;
        }
        if let Some(client_name) = client_name {
            self.client_name = client_name;
        }
        if let Some(industry) = industry {
            self.industry = industry;
        }
        if let Some(challenge) = challenge {
            self.challenge = challenge;
        }
        if let Some(solution) = solution {
            self.solution = solution;
        }
        if let Some(results) = results {
            self.results = results;
        }
        self.header.updated_at = now;
        Ok(())
    }

    fn header(&self) -> &ContentHeader<CaseStudyStatus> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ContentHeader<CaseStudyStatus> {
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
            conversion_rate: Some(conversion_rate(counters.get(CounterKind::Inquiries), views)),
            quality_score: None,
            roi: Some(roi(self.results.cost_savings, self.results.revenue_increase)),
            reading_time_minutes: None,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "clientName" => Some(FieldValue::from(self.client_name.as_str())),
            "industry" => self.industry.clone().map(FieldValue::from),
            "costSavings" => self.results.cost_savings.map(FieldValue::from),
            "revenueIncrease" => self.results.revenue_increase.map(FieldValue::from),
            "denialRateReduction" => self.results.denial_rate_reduction.map(FieldValue::from),
            "daysInArReduction" => self.results.days_in_ar_reduction.map(FieldValue::from),
            _ => None,
        }
    }
}
