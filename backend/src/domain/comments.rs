//! Reader comments and their moderation states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{ContentEntity, SchemaViolation, ValidationReport, ViolationKind};
use super::ids::CommentId;

pub const AUTHOR_NAME_MIN: usize = 2;
pub const AUTHOR_NAME_MAX: usize = 100;
pub const BODY_MAX: usize = 2000;
const EMAIL_MAX: usize = 254;

/// Moderation state of a comment. Only approved comments are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Pending,
    Approved,
    Rejected,
    Spam,
}

impl CommentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Spam => "spam",
        }
    }
}

/// Submission payload for a new comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommentDraft {
    /// Two to 100 characters.
    pub author_name: String,
    /// Author email.
    #[serde(default)]
    pub author_email: Option<String>,
    /// Comment text; at most 2000 characters.
    pub body: String,
}

/// A reader comment held inside its parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    id: CommentId,
    author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author_email: Option<String>,
    body: String,
    pub(crate) status: CommentStatus,
    created_at: DateTime<Utc>,
}

impl Comment {
    /// Validate `draft` and build a pending comment.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use content_backend::domain::comments::{Comment, CommentDraft, CommentStatus};
    ///
    /// let draft = CommentDraft {
    ///     author_name: "Ada".into(),
    ///     author_email: None,
    ///     body: "Helpful breakdown of denial codes.".into(),
    /// };
    /// let comment = Comment::from_draft(draft, Utc::now()).expect("valid comment");
    /// assert_eq!(comment.status(), CommentStatus::Pending);
    /// ```
    pub fn from_draft(draft: CommentDraft, now: DateTime<Utc>) -> Result<Self, ValidationReport> {
        let mut report = ValidationReport::default();
        let author_name = report.text(
            "authorName",
            &draft.author_name,
            AUTHOR_NAME_MIN,
            AUTHOR_NAME_MAX,
        );
        let author_email = report.optional_text("authorEmail", draft.author_email, EMAIL_MAX);
        if author_email
            .as_deref()
            .is_some_and(|email| !looks_like_email(email))
        {
            report.push(SchemaViolation::new(
                "authorEmail",
                ViolationKind::InvalidFormat {
                    expected: "an email address",
                },
            ));
        }
        let body = report.text("body", &draft.body, 1, BODY_MAX);

        report.finish(Self {
            id: CommentId::random(),
            author_name,
            author_email,
            body,
            status: CommentStatus::Pending,
            created_at: now,
        })
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn author_name(&self) -> &str {
        self.author_name.as_str()
    }

    pub fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    pub fn status(&self) -> CommentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Entity types that accept reader comments.
pub trait Commentable: ContentEntity {
    fn comments(&self) -> &[Comment];

    fn comments_mut(&mut self) -> &mut Vec<Comment>;
}

/// Number of approved comments in `comments`.
pub(crate) fn count_approved(comments: &[Comment]) -> u64 {
    let approved = comments
        .iter()
        .filter(|comment| comment.status == CommentStatus::Approved)
        .count();
    u64::try_from(approved).unwrap_or(u64::MAX)
}
