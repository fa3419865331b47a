//! Software products offered to provider organisations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{
    ContentEntity, ContentHeader, ContentKind, CounterKind, FieldValue, ValidationReport,
};
use super::ids::UserId;
use super::lifecycle::{LifecycleAction, LifecycleStatus, define_status};
use super::metrics::{DerivedMetrics, EngagementInputs, conversion_rate, engagement_rate};

pub const CATEGORY_MAX: usize = 60;
pub const TAGLINE_MAX: usize = 160;
pub const DESCRIPTION_MAX: usize = 10_000;
pub const FEATURES_MAX: usize = 30;

define_status! {
    /// Release state of a product.
    pub enum ProductStatus {
        Draft => "draft",
        Beta => "beta",
        Active => "active",
        Deprecated => "deprecated",
        Discontinued => "discontinued",
    }
}

impl LifecycleStatus for ProductStatus {
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
            (Self::Draft, LifecycleAction::Preview) => Some(Self::Beta),
            (Self::Draft | Self::Beta, LifecycleAction::Publish) => Some(Self::Active),
            (Self::Active, LifecycleAction::Deprecate) => Some(Self::Deprecated),
            (Self::Beta | Self::Active | Self::Deprecated, LifecycleAction::Archive) => {
                Some(Self::Discontinued)
            }
            _ => None,
        }
    }

    fn is_retired(self) -> bool {
        self == Self::Discontinued
    }
}

/// Creation payload for a product.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductDraft {
    /// Display name; stored as the header title.
    pub name: String,
    /// Explicit slug; generated from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// One-line pitch.
    #[serde(default)]
    pub tagline: Option<String>,
    /// Description.
    pub description: String,
    /// Features.
    #[serde(default)]
    pub features: Vec<String>,
    /// Owning user.
    pub created_by: UserId,
}

/// Edit payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement tagline.
    pub tagline: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement features.
    pub features: Option<Vec<String>>,
}

/// A product listing. The header title holds the product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(flatten)]
    header: ContentHeader<ProductStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tagline: Option<String>,
    description: String,
    #[serde(default)]
    features: Vec<String>,
    created_by: UserId,
}

impl Product {
    pub fn name(&self) -> &str {
        self.header.title()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tagline(&self) -> Option<&str> {
        self.tagline.as_deref()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn features(&self) -> &[String] {
        self.features.as_slice()
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }
}

impl ContentEntity for Product {
    type Status = ProductStatus;
    type Draft = ProductDraft;
    type Patch = ProductPatch;

    const KIND: ContentKind = ContentKind::Product;
    const COUNTERS: &'static [CounterKind] = &[
        CounterKind::Views,
        CounterKind::Demos,
        CounterKind::Trials,
        CounterKind::Conversions,
    ];
    const FIELDS: &'static [&'static str] = &["name", "category", "featureCount"];

    fn from_draft(draft: ProductDraft, now: DateTime<Utc>) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let header = ContentHeader::create(&mut report, "name", &draft.name, draft.slug, now);
        let category = report.optional_text("category", draft.category, CATEGORY_MAX);
        let tagline = report.optional_text("tagline", draft.tagline, TAGLINE_MAX);
        let description = report.text("description", &draft.description, 1, DESCRIPTION_MAX);
        let features = report.items("features", draft.features, FEATURES_MAX);

        report.finish(Self {
            header,
            category,
            tagline,
            description,
            features,
            created_by: draft.created_by,
        })
    }

    fn apply_patch(
        &mut self,
        patch: ProductPatch,
        _editor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        let name = patch.name.map(|name| report.title("name", &name));
        let category = patch
            .category
            .map(|value| report.optional_text("category", Some(value), CATEGORY_MAX));
        let tagline = patch
            .tagline
            .map(|value| report.optional_text("tagline", Some(value), TAGLINE_MAX));
        let description = patch
            .description
            .map(|value| report.text("description", &value, 1, DESCRIPTION_MAX));
        let features = patch
            .features
            .map(|features| report.items("features", features, FEATURES_MAX));
        report.finish(())?;

        if let Some(name) = name {
            self.header.title = name;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(tagline) = tagline {
            self.tagline = tagline;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(features) = features {
            self.features = features;
        }
        self.header.updated_at = now;
        Ok(())
    }

    fn header(&self) -> &ContentHeader<ProductStatus> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ContentHeader<ProductStatus> {
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
                counters.get(CounterKind::Trials),
            )),
            ..DerivedMetrics::default()
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(FieldValue::from(self.header.title())),
            "category" => self.category.clone().map(FieldValue::from),
            "featureCount" => u64::try_from(self.features.len()).ok().map(FieldValue::from),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::test_support::{fixture_now, product_draft};
    use rstest::rstest;

    #[rstest]
    fn short_name_is_reported_on_name_field() {
        let mut draft = product_draft();
        draft.name = "AI".to_owned();
        let report = Product::from_draft(draft, fixture_now()).expect_err("name too short");
        assert!(report.has_field("name"));
        assert!(!report.has_field("title"));
    }

    #[rstest]
    fn slug_follows_product_name() {
        let product = Product::from_draft(product_draft(), fixture_now()).expect("valid product");
        assert_eq!(product.header().slug(), "claimscrub-pro");
        assert_eq!(product.name(), "ClaimScrub Pro");
    }

    #[rstest]
    fn conversion_rate_is_conversions_over_trials() {
        let mut product = Product::from_draft(product_draft(), fixture_now()).expect("valid");
        product.header.counters.increment(CounterKind::Trials);
        product.header.counters.increment(CounterKind::Trials);
        product.header.counters.increment(CounterKind::Conversions);
        assert_eq!(product.metrics().conversion_rate, Some(50.0));
    }

    #[rstest]
    fn blank_features_are_dropped() {
        let mut draft = product_draft();
        draft.features = vec!["Eligibility checks".to_owned(), "  ".to_owned()];
        let product = Product::from_draft(draft, fixture_now()).expect("valid product");
        assert_eq!(product.features(), ["Eligibility checks".to_owned()]);
    }
}
