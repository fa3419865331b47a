//! Derived metrics computed from stored counters and content fields.
//!
//! Nothing here is persisted. Every function is pure and treats missing
//! inputs as zero, so a metric is always recomputable from the base fields.

use serde::Serialize;

/// Words read per minute when estimating reading time.
pub const WORDS_PER_MINUTE: usize = 200;
/// Upper bound of the blog quality score.
pub const QUALITY_SCORE_MAX: u8 = 100;
/// Share of the total benefit assumed to have been invested.
pub const ASSUMED_INVESTMENT_SHARE: f64 = 0.2;

/// Metrics attached to an entity when it is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// (likes + shares + approved comments) / views, as a percentage.
    pub engagement_rate: f64,
    /// Conversion percentage for the type; blog posts omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
    /// Blog content quality on a 0 to 100 scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    /// Case study return on investment as a percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<f64>,
    /// Estimated blog reading time at 200 words a minute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time_minutes: Option<u32>,
}

/// Counter inputs to [`engagement_rate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementInputs {
    /// Denominator; zero views yields zero engagement.
    pub views: u64,
    /// Likes.
    pub likes: u64,
    /// Shares.
    pub shares: u64,
    /// Only approved comments count.
    pub approved_comments: u64,
}

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

/// `numerator / denominator * 100`, or zero when the denominator is zero.
///
/// # Examples
/// ```
/// use content_backend::domain::metrics::percentage;
///
/// assert_eq!(percentage(1, 3), 33.33);
/// assert_eq!(percentage(5, 0), 0.0);
/// ```
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round2(numerator as f64 / denominator as f64 * 100.0)
}

/// Engagement rate as a percentage of views, zero without views.
pub fn engagement_rate(inputs: EngagementInputs) -> f64 {
    let interactions = inputs
        .likes
        .saturating_add(inputs.shares)
        .saturating_add(inputs.approved_comments);
    percentage(interactions, inputs.views)
}

/// Conversion rate; the numerator and denominator depend on the entity type.
pub fn conversion_rate(conversions: u64, opportunities: u64) -> f64 {
    percentage(conversions, opportunities)
}

/// Inputs to the blog [`quality_score`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityInputs {
    /// Words in the body.
    pub word_count: usize,
    /// Number of populated SEO fields; values above five are capped.
    pub seo_fields_present: usize,
    /// Engagement percentage from [`engagement_rate`].
    pub engagement_rate: f64,
    /// Has table of contents.
    pub has_table_of_contents: bool,
    /// Has sections.
    pub has_sections: bool,
    /// Has excerpt.
    pub has_excerpt: bool,
}

fn length_points(word_count: usize) -> u8 {
    match word_count {
        0..500 => 0,
        500..1000 => 10,
        1000..1500 => 20,
        _ => 30,
    }
}

fn seo_points(present: usize) -> u8 {
    let capped = present.min(5);
    u8::try_from(capped).map_or(25, |fields| fields * 5)
}

fn engagement_points(rate: f64) -> u8 {
    if !rate.is_finite() || rate < 1.0 {
        0
    } else if rate < 3.0 {
        10
    } else if rate < 5.0 {
        15
    } else {
        25
    }
}

fn structure_points(inputs: &QualityInputs) -> u8 {
    let mut points = 0;
    if inputs.has_table_of_contents {
        points += 10;
    }
    if inputs.has_sections {
        points += 5;
    }
    if inputs.has_excerpt {
        points += 5;
    }
    points
}

/// Weighted blog quality score, clamped to `0..=100`.
///
/// Length contributes up to 30, SEO completeness up to 25, engagement up to
/// 25, and structure up to 20.
pub fn quality_score(inputs: QualityInputs) -> u8 {
    let total = length_points(inputs.word_count)
        .saturating_add(seo_points(inputs.seo_fields_present))
        .saturating_add(engagement_points(inputs.engagement_rate))
        .saturating_add(structure_points(&inputs));
    total.min(QUALITY_SCORE_MAX)
}

/// Return on investment for a case study, as a percentage.
///
/// The investment is assumed to be [`ASSUMED_INVESTMENT_SHARE`] of the total
/// benefit. Missing figures count as zero; a zero investment yields zero.
///
/// # Examples
/// ```
/// use content_backend::domain::metrics::roi;
///
/// assert_eq!(roi(Some(80_000.0), Some(20_000.0)), 400.0);
/// assert_eq!(roi(None, None), 0.0);
/// ```
pub fn roi(cost_savings: Option<f64>, revenue_increase: Option<f64>) -> f64 {
    let total_benefit = cost_savings.unwrap_or(0.0) + revenue_increase.unwrap_or(0.0);
    let investment = total_benefit * ASSUMED_INVESTMENT_SHARE;
    if investment == 0.0 || !investment.is_finite() {
        return 0.0;
    }
    round2((total_benefit - investment) / investment * 100.0)
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time in whole minutes, at least one for non-empty text.
pub fn reading_time_minutes(word_count: usize) -> u32 {
    let minutes = word_count.div_ceil(WORDS_PER_MINUTE);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}
