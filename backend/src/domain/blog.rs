//! Blog posts: long-form articles with SEO metadata, reader comments, share
//! tracking, and an append-only edit history.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comments::{Comment, Commentable, count_approved};
use super::content::{
    ContentEntity, ContentHeader, ContentKind, CounterKind, FieldValue, SchemaViolation,
    ValidationReport, ViolationKind,
};
use super::ids::UserId;
use super::lifecycle::{LifecycleAction, LifecycleStatus, define_status};
use super::metrics::{
    DerivedMetrics, EngagementInputs, QualityInputs, engagement_rate, quality_score,
    reading_time_minutes, word_count,
};

pub const EXCERPT_MAX: usize = 500;
pub const CONTENT_MAX: usize = 100_000;
pub const CATEGORY_MAX: usize = 50;
pub const TAGS_MAX: usize = 10;
pub const META_TITLE_MAX: usize = 60;
pub const META_DESCRIPTION_MAX: usize = 160;
pub const KEYWORDS_MAX: usize = 10;
const URL_MAX: usize = 2048;
const HEADING_MAX: usize = 200;

define_status! {
    /// Publication state of a blog post.
    pub enum BlogStatus {
        Draft => "draft",
        Review => "review",
        Scheduled => "scheduled",
        Published => "published",
        Archived => "archived",
    }
}

impl LifecycleStatus for BlogStatus {
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

    fn scheduled() -> Option<Self> {
        Some(Self::Scheduled)
    }

    fn target(self, action: LifecycleAction) -> Option<Self> {
        match (self, action) {
            (Self::Draft, LifecycleAction::SubmitForReview) => Some(Self::Review),
            (Self::Draft | Self::Review, LifecycleAction::Schedule) => Some(Self::Scheduled),
            (Self::Draft | Self::Review | Self::Scheduled, LifecycleAction::Publish) => {
                Some(Self::Published)
            }
            (Self::Archived, _) => None,
            (_, LifecycleAction::Archive) => Some(Self::Archived),
            _ => None,
        }
    }

    fn is_retired(self) -> bool {
        self == Self::Archived
    }
}

/// Platforms with a dedicated share counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePlatform {
    Facebook,
    Twitter,
    Linkedin,
    Email,
}

impl SharePlatform {
    pub const ALL: [Self; 4] = [Self::Facebook, Self::Twitter, Self::Linkedin, Self::Email];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Linkedin => "linkedin",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for SharePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePlatform {
    type Err = UnknownSharePlatform;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str() == normalised)
            .ok_or_else(|| UnknownSharePlatform(value.to_owned()))
    }
}

/// Error returned when a share names a platform without a breakdown slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSharePlatform(pub String);

impl fmt::Display for UnknownSharePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown share platform `{}`", self.0)
    }
}

impl std::error::Error for UnknownSharePlatform {}

/// Search-engine metadata.
/// Search engine metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeoFields {
    /// Title for search results; at most 60 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    /// Search snippet; at most 160 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// Keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Canonical URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    /// Open Graph image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

impl SeoFields {
    /// Number of populated fields, used by the quality score.
    pub fn present_count(&self) -> usize {
        [
            self.meta_title.is_some(),
            self.meta_description.is_some(),
            !self.keywords.is_empty(),
            self.canonical_url.is_some(),
            self.og_image.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    fn validated(self, report: &mut ValidationReport) -> Self {
        let meta_title = report.optional_text("seo.metaTitle", self.meta_title, META_TITLE_MAX);
        let meta_description = report.optional_text(
            "seo.metaDescription",
            self.meta_description,
            META_DESCRIPTION_MAX,
        );
        let keywords = report.tags("seo.keywords", self.keywords, KEYWORDS_MAX);
        let canonical_url = report.optional_text("seo.canonicalUrl", self.canonical_url, URL_MAX);
        if canonical_url.as_deref().is_some_and(|url| !is_http_url(url)) {
            report.push(SchemaViolation::new(
                "seo.canonicalUrl",
                ViolationKind::InvalidFormat {
                    expected: "an http or https URL",
                },
            ));
        }
        let og_image = report.optional_text("seo.ogImage", self.og_image, URL_MAX);
        Self {
            meta_title,
            meta_description,
            keywords,
            canonical_url,
            og_image,
        }
    }
}

fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.len() > scheme.len() && value.starts_with(scheme))
}

/// Table-of-contents entry pointing at an anchor in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TocEntry {
    /// Title.
    pub title: String,
    /// Fragment identifier in the rendered body.
    pub anchor: String,
    /// Heading depth, 1 to 6; defaults to 2.
    #[serde(default = "default_toc_level")]
    pub level: u8,
}

fn default_toc_level() -> u8 {
    2
}

/// Named section of the article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Section {
    /// Heading.
    pub heading: String,
    /// Body.
    pub body: String,
}

fn validate_structure(
    report: &mut ValidationReport,
    toc: Vec<TocEntry>,
    sections: Vec<Section>,
) -> (Vec<TocEntry>, Vec<Section>) {
    let toc = toc
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let title = report.text(
                &format!("tableOfContents[{index}].title"),
                &entry.title,
                1,
                HEADING_MAX,
            );
            let anchor = report.text(
                &format!("tableOfContents[{index}].anchor"),
                &entry.anchor,
                1,
                HEADING_MAX,
            );
            if !(1..=6).contains(&entry.level) {
                report.push(SchemaViolation::new(
                    format!("tableOfContents[{index}].level"),
                    ViolationKind::InvalidFormat {
                        expected: "a heading level between 1 and 6",
                    },
                ));
            }
            TocEntry {
                title,
                anchor,
                level: entry.level,
            }
        })
        .collect();
    let sections = sections
        .into_iter()
        .enumerate()
        .map(|(index, section)| Section {
            heading: report.text(
                &format!("sections[{index}].heading"),
                &section.heading,
                1,
                HEADING_MAX,
            ),
            body: section.body,
        })
        .collect();
    (toc, sections)
}

/// Snapshot of the editable text taken before an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogRevision {
    /// Who made the edit.
    pub editor: UserId,
    /// Edited at.
    pub edited_at: DateTime<Utc>,
    /// Title before the edit.
    pub title: String,
    /// Excerpt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Body before the edit.
    pub content: String,
}

/// Creation payload for a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlogDraft {
    /// Display title.
    pub title: String,
    /// Explicit slug; generated from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    /// Owning user.
    pub author: UserId,
    /// Short summary; at most 500 characters.
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Article body.
    pub content: String,
    /// Category.
    #[serde(default)]
    pub category: Option<String>,
    /// At most ten tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Seo.
    #[serde(default)]
    pub seo: SeoFields,
    /// Table of contents.
    #[serde(default)]
    pub table_of_contents: Vec<TocEntry>,
    /// Sections.
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Edit payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlogPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement excerpt.
    pub excerpt: Option<String>,
    /// Replacement content.
    pub content: Option<String>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement tags.
    pub tags: Option<Vec<String>>,
    /// Replacement seo.
    pub seo: Option<SeoFields>,
    /// Replacement table of contents.
    pub table_of_contents: Option<Vec<TocEntry>>,
    /// Replacement sections.
    pub sections: Option<Vec<Section>>,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(flatten)]
    header: ContentHeader<BlogStatus>,
    author: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    seo: SeoFields,
    #[serde(default)]
    table_of_contents: Vec<TocEntry>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    share_breakdown: BTreeMap<SharePlatform, u64>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    revisions: Vec<BlogRevision>,
}

impl Blog {
    pub fn author(&self) -> &UserId {
        &self.author
    }

    pub fn excerpt(&self) -> Option<&str> {
        self.excerpt.as_deref()
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_slice()
    }

    pub fn seo(&self) -> &SeoFields {
        &self.seo
    }

    pub fn table_of_contents(&self) -> &[TocEntry] {
        self.table_of_contents.as_slice()
    }

    pub fn sections(&self) -> &[Section] {
        self.sections.as_slice()
    }

    /// Shares per recognised platform.
    pub fn share_breakdown(&self) -> &BTreeMap<SharePlatform, u64> {
        &self.share_breakdown
    }

    /// Edit history, oldest first.
    pub fn revisions(&self) -> &[BlogRevision] {
        self.revisions.as_slice()
    }

    pub(crate) fn count_platform_share(&mut self, platform: SharePlatform) {
        let slot = self.share_breakdown.entry(platform).or_insert(0);
        *slot = slot.saturating_add(1);
    }
}

impl ContentEntity for Blog {
    type Status = BlogStatus;
    type Draft = BlogDraft;
    type Patch = BlogPatch;

    const KIND: ContentKind = ContentKind::Blog;
    const COUNTERS: &'static [CounterKind] =
        &[CounterKind::Views, CounterKind::Likes, CounterKind::Shares];
    const FIELDS: &'static [&'static str] =
        &["category", "author", "wordCount", "commentCount"];

    fn from_draft(draft: BlogDraft, now: DateTime<Utc>) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let header = ContentHeader::create(&mut report, "title", &draft.title, draft.slug, now);
        let excerpt = report.optional_text("excerpt", draft.excerpt, EXCERPT_MAX);
        let content = report.text("content", &draft.content, 1, CONTENT_MAX);
        let category = report.optional_text("category", draft.category, CATEGORY_MAX);
        let tags = report.tags("tags", draft.tags, TAGS_MAX);
        let seo = draft.seo.validated(&mut report);
        let (table_of_contents, sections) =
            validate_structure(&mut report, draft.table_of_contents, draft.sections);

        report.finish(Self {
            header,
            author: draft.author,
            excerpt,
            content,
            category,
            tags,
            seo,
            table_of_contents,
            sections,
            share_breakdown: BTreeMap::new(),
            comments: Vec::new(),
            revisions: Vec::new(),
        })
    }

    fn apply_patch(
        &mut self,
        patch: BlogPatch,
        editor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationReport> {
        if patch == BlogPatch::default() {
            return Ok(());
        }
        let mut report = ValidationReport::default();
        let title = patch.title.map(|title| report.title("title", &title));
        let excerpt = patch
            .excerpt
            .map(|excerpt| report.optional_text("excerpt", Some(excerpt), EXCERPT_MAX));
        let content = patch
            .content
            .map(|content| report.text("content", &content, 1, CONTENT_MAX));
        let category = patch
            .category
            .map(|category| report.optional_text("category", Some(category), CATEGORY_MAX));
        let tags = patch.tags.map(|tags| report.tags("tags", tags, TAGS_MAX));
        let seo = patch.seo.map(|seo| seo.validated(&mut report));
        let structure = match (patch.table_of_contents, patch.sections) {
            (None, None) => None,
            (toc, sections) => Some((
                toc.is_some(),
                sections.is_some(),
                validate_structure(
                    &mut report,
                    toc.unwrap_or_default(),
                    sections.unwrap_or_default(),
                ),
            )),
        };
        report.finish(())?;

        self.revisions.push(BlogRevision {
            editor: editor.clone(),
            edited_at: now,
            title: self.header.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
        });
        if let Some(title) = title {
            self.header.title = title;
        }
        if let Some(excerpt) = excerpt {
            self.excerpt = excerpt;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(category) = category {
            self.category = category;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        if let Some(seo) = seo {
            self.seo = seo;
        }
        if let Some((has_toc, has_sections, (toc, sections))) = structure {
            if has_toc {
                self.table_of_contents = toc;
            }
            if has_sections {
                self.sections = sections;
            }
        }
        self.header.updated_at = now;
        Ok(())
    }

    fn header(&self) -> &ContentHeader<BlogStatus> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ContentHeader<BlogStatus> {
        &mut self.header
    }

    fn metrics(&self) -> DerivedMetrics {
        let counters = self.header.counters();
        let engagement = engagement_rate(EngagementInputs {
            views: counters.get(CounterKind::Views),
            likes: counters.get(CounterKind::Likes),
            shares: counters.get(CounterKind::Shares),
            approved_comments: self.approved_comments(),
        });
        let words = word_count(&self.content);
        DerivedMetrics {
            engagement_rate: engagement,
            conversion_rate: None,
            quality_score: Some(quality_score(QualityInputs {
                word_count: words,
                seo_fields_present: self.seo.present_count(),
                engagement_rate: engagement,
                has_table_of_contents: !self.table_of_contents.is_empty(),
                has_sections: !self.sections.is_empty(),
                has_excerpt: self.excerpt.is_some(),
            })),
            roi: None,
            reading_time_minutes: Some(reading_time_minutes(words)),
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "category" => self.category.clone().map(FieldValue::from),
            "author" => Some(FieldValue::from(self.author.to_string())),
            "wordCount" => u64::try_from(word_count(&self.content))
                .ok()
                .map(FieldValue::from),
            "commentCount" => u64::try_from(self.comments.len()).ok().map(FieldValue::from),
            _ => None,
        }
    }

    fn approved_comments(&self) -> u64 {
        count_approved(&self.comments)
    }
}

impl Commentable for Blog {
    fn comments(&self) -> &[Comment] {
        self.comments.as_slice()
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }
}
