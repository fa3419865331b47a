//! Aggregations over a scanned collection of one content type.
//!
//! A query names an optional [`FilterExpr`], an optional grouping field, and
//! optional fields to sum and average. Field names are checked against the
//! entity type before any entity is inspected, so a typo fails fast with
//! [`ErrorCode::InvalidArgument`](crate::domain::ErrorCode::InvalidArgument)
//! instead of producing an empty report.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::content::{ContentEntity, CounterKind, FieldValue};
use super::error::Error;
use super::lifecycle::LifecycleStatus;
use super::metrics::DerivedMetrics;

pub mod presets;

/// Group key used when the grouping field has no value.
pub const UNSPECIFIED_GROUP: &str = "unspecified";

/// Header fields every content type exposes.
const HEADER_FIELDS: [&str; 3] = ["status", "slug", "title"];

/// Derived metric names accepted in queries.
pub const METRIC_FIELDS: [&str; 5] = [
    "engagementRate",
    "conversionRate",
    "qualityScore",
    "roi",
    "readingTime",
];

/// Boolean filter over named fields.
///
/// Serialised externally tagged, for example
/// `{"and": [{"comparison": {"field": "views", "op": {"gt": 10}}}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpr {
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
    Comparison { field: String, op: ComparisonOp },
}

/// Comparison applied to a single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "eq")]
    Equals(FieldValue),
    #[serde(rename = "gt")]
    GreaterThan(f64),
    #[serde(rename = "lt")]
    LessThan(f64),
    #[serde(rename = "in")]
    In(Vec<FieldValue>),
}

impl FilterExpr {
    /// `field` equals `value`; numbers compare within a small epsilon.
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::comparison(field, ComparisonOp::Equals(value.into()))
    }

    /// `field` is a number above `value`.
    pub fn gt(field: impl Into<String>, value: f64) -> Self {
        Self::comparison(field, ComparisonOp::GreaterThan(value))
    }

    /// `field` is a number below `value`.
    pub fn lt(field: impl Into<String>, value: f64) -> Self {
        Self::comparison(field, ComparisonOp::LessThan(value))
    }

    /// `field` equals any of `values`.
    pub fn one_of<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::comparison(
            field,
            ComparisonOp::In(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Negate `inner`.
    pub fn not(inner: FilterExpr) -> Self {
        Self::Not(Box::new(inner))
    }

    fn comparison(field: impl Into<String>, op: ComparisonOp) -> Self {
        Self::Comparison {
            field: field.into(),
            op,
        }
    }

    /// Every field name referenced by the expression.
    pub fn fields(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_fields(&mut names);
        names
    }

    fn collect_fields<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_fields(names);
                }
            }
            Self::Not(inner) => inner.collect_fields(names),
            Self::Comparison { field, .. } => names.push(field.as_str()),
        }
    }

    fn matches(&self, record: &Record<'_, impl ContentEntity>) -> bool {
        match self {
            Self::And(children) => children.iter().all(|child| child.matches(record)),
            Self::Or(children) => children.iter().any(|child| child.matches(record)),
            Self::Not(inner) => !inner.matches(record),
            Self::Comparison { field, op } => record
                .value(field)
                .is_some_and(|value| evaluate_comparison(&value, op)),
        }
    }
}

fn evaluate_comparison(value: &FieldValue, op: &ComparisonOp) -> bool {
    match op {
        ComparisonOp::Equals(expected) => values_equal(expected, value),
        ComparisonOp::GreaterThan(bound) => compare_number(value, *bound, Ordering::Greater),
        ComparisonOp::LessThan(bound) => compare_number(value, *bound, Ordering::Less),
        ComparisonOp::In(candidates) => candidates
            .iter()
            .any(|candidate| values_equal(candidate, value)),
    }
}

fn values_equal(expected: &FieldValue, actual: &FieldValue) -> bool {
    match (expected, actual) {
        (FieldValue::Number(lhs), FieldValue::Number(rhs)) => (lhs - rhs).abs() < f64::EPSILON,
        (FieldValue::Flag(lhs), FieldValue::Flag(rhs)) => lhs == rhs,
        (FieldValue::Text(lhs), FieldValue::Text(rhs)) => lhs == rhs,
        _ => false,
    }
}

fn compare_number(value: &FieldValue, bound: f64, wanted: Ordering) -> bool {
    value
        .as_number()
        .and_then(|number| number.partial_cmp(&bound))
        .is_some_and(|ordering| ordering == wanted)
}

/// What to aggregate over a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct AggregateQuery {
    /// Entities failing the filter are left out.
    #[serde(default)]
    pub filter: Option<FilterExpr>,
    /// Field whose value names the group.
    #[serde(default)]
    pub group_by: Option<String>,
    /// Numeric field to total.
    #[serde(default)]
    pub sum_field: Option<String>,
    /// Numeric field to average.
    #[serde(default)]
    pub avg_field: Option<String>,
}

impl AggregateQuery {
    /// Count everything, with no grouping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to entities matching `filter`.
    pub fn filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Group by `field`.
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    /// Total `field`.
    pub fn sum(mut self, field: impl Into<String>) -> Self {
        self.sum_field = Some(field.into());
        self
    }

    /// Average `field`.
    pub fn average(mut self, field: impl Into<String>) -> Self {
        self.avg_field = Some(field.into());
        self
    }

    fn referenced_fields(&self) -> impl Iterator<Item = &str> {
        self.filter
            .iter()
            .flat_map(FilterExpr::fields)
            .chain(self.group_by.as_deref())
            .chain(self.sum_field.as_deref())
            .chain(self.avg_field.as_deref())
    }
}

/// Totals for one group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Matched entities in the group.
    pub count: u64,
    /// Group total of the summed field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
    /// Group mean of the averaged field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// Entities that passed the filter.
    pub matched: u64,
    /// Every scanned entity per lifecycle status name, ignoring the filter.
    pub by_status: BTreeMap<String, u64>,
    /// Per-group totals; empty unless the query groups.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, GroupSummary>,
    /// Sum of the summed field over matched entities; `None` when not requested.
    pub sum: Option<f64>,
    /// Mean of the averaged field over entities that have it.
    pub average: Option<f64>,
}

/// Whether `name` can be used in a query against entity type `E`.
pub fn is_known_field<E: ContentEntity>(name: &str) -> bool {
    HEADER_FIELDS.contains(&name)
        || METRIC_FIELDS.contains(&name)
        || tracked_counter::<E>(name).is_some()
        || E::FIELDS.contains(&name)
}

fn tracked_counter<E: ContentEntity>(name: &str) -> Option<CounterKind> {
    CounterKind::from_str(name)
        .ok()
        .filter(|kind| E::COUNTERS.contains(kind))
}

/// Every field name accepted for entity type `E`.
pub fn known_fields<E: ContentEntity>() -> Vec<&'static str> {
    HEADER_FIELDS
        .into_iter()
        .chain(E::COUNTERS.iter().map(|kind| kind.as_str()))
        .chain(METRIC_FIELDS)
        .chain(E::FIELDS.iter().copied())
        .collect()
}

fn validate_fields<E: ContentEntity>(query: &AggregateQuery) -> Result<(), Error> {
    let mut unknown: Vec<&str> = query
        .referenced_fields()
        .filter(|name| !is_known_field::<E>(name))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    unknown.dedup();
    Err(Error::invalid_argument(format!(
        "unknown {} field `{}`",
        E::KIND,
        unknown.join("`, `")
    ))
    .with_details(json!({
        "fields": unknown,
        "kind": E::KIND.as_str(),
        "known": known_fields::<E>(),
    })))
}

/// One entity with its metrics computed once.
struct Record<'a, E> {
    entity: &'a E,
    metrics: DerivedMetrics,
}

impl<'a, E: ContentEntity> Record<'a, E> {
    fn new(entity: &'a E) -> Self {
        Self {
            entity,
            metrics: entity.metrics(),
        }
    }

    fn value(&self, name: &str) -> Option<FieldValue> {
        let header = self.entity.header();
        match name {
            "status" => return Some(FieldValue::from(header.status().name())),
            "slug" => return Some(FieldValue::from(header.slug())),
            "title" => return Some(FieldValue::from(header.title())),
            "engagementRate" => return Some(FieldValue::from(self.metrics.engagement_rate)),
            "conversionRate" => return self.metrics.conversion_rate.map(FieldValue::from),
            "qualityScore" => {
                return self
                    .metrics
                    .quality_score
                    .map(|score| FieldValue::from(f64::from(score)));
            }
            "roi" => return self.metrics.roi.map(FieldValue::from),
            "readingTime" => {
                return self
                    .metrics
                    .reading_time_minutes
                    .map(|minutes| FieldValue::from(f64::from(minutes)));
            }
            _ => {}
        }
        match tracked_counter::<E>(name) {
            Some(kind) => Some(FieldValue::from(header.counters().get(kind))),
            None => self.entity.field(name),
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.value(name).as_ref().and_then(FieldValue::as_number)
    }
}

#[derive(Default)]
struct Tally {
    count: u64,
    sum: f64,
    avg_total: f64,
    avg_count: u64,
}

impl Tally {
    fn add(&mut self, summed: Option<f64>, averaged: Option<f64>) {
        self.count += 1;
        self.sum += summed.unwrap_or(0.0);
        if let Some(value) = averaged {
            self.avg_total += value;
            self.avg_count += 1;
        }
    }

    fn sum(&self, query: &AggregateQuery) -> Option<f64> {
        query.sum_field.as_ref().map(|_| self.sum)
    }

    fn average(&self) -> Option<f64> {
        (self.avg_count > 0).then(|| self.avg_total / self.avg_count as f64)
    }
}

/// Aggregate `entities` according to `query`.
///
/// Status counts cover every entity; the remaining figures cover only those
/// passing the filter. Sums treat a missing value as zero. Averages skip missing values and are
/// `None` when no matched entity has one. Entities with no value for the
/// grouping field land in [`UNSPECIFIED_GROUP`].
///
/// # Examples
/// ```
/// use content_backend::domain::analytics::{AggregateQuery, aggregate};
/// use content_backend::domain::blog::Blog;
///
/// let blogs: Vec<Blog> = Vec::new();
/// let report = aggregate(&blogs, &AggregateQuery::new().sum("views")).expect("known field");
/// assert_eq!(report.matched, 0);
/// assert_eq!(report.sum, Some(0.0));
///
/// let err = aggregate(&blogs, &AggregateQuery::new().sum("trials")).expect_err("untracked");
/// assert_eq!(err.code(), content_backend::domain::ErrorCode::InvalidArgument);
/// ```
pub fn aggregate<'a, E, I>(entities: I, query: &AggregateQuery) -> Result<AggregateReport, Error>
where
    E: ContentEntity,
    I: IntoIterator<Item = &'a E>,
{
    validate_fields::<E>(query)?;

    let mut overall = Tally::default();
    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    let mut groups: BTreeMap<String, Tally> = BTreeMap::new();

    for entity in entities {
        let status = entity.header().status().name().to_owned();
        *by_status.entry(status).or_insert(0) += 1;

        let record = Record::new(entity);
        if query
            .filter
            .as_ref()
            .is_some_and(|filter| !filter.matches(&record))
        {
            continue;
        }

        let summed = query.sum_field.as_deref().and_then(|name| record.number(name));
        let averaged = query.avg_field.as_deref().and_then(|name| record.number(name));
        overall.add(summed, averaged);

        if let Some(group_field) = query.group_by.as_deref() {
            let key = record
                .value(group_field)
                .map(|value| value.group_key())
                .filter(|key| !key.is_empty())
                .unwrap_or_else(|| UNSPECIFIED_GROUP.to_owned());
            groups.entry(key).or_default().add(summed, averaged);
        }
    }

    Ok(AggregateReport {
        matched: overall.count,
        by_status,
        groups: groups
            .into_iter()
            .map(|(key, tally)| {
                let summary = GroupSummary {
                    count: tally.count,
                    sum: tally.sum(query),
                    average: tally.average(),
                };
                (key, summary)
            })
            .collect(),
        sum: overall.sum(query),
        average: overall.average(),
    })
}
