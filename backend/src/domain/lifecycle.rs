//! Lifecycle state machine shared by the content entity types.
//!
//! Each entity type declares its own status enumeration and transition table
//! through [`LifecycleStatus`]. The free functions here apply a named
//! [`LifecycleAction`] to an entity, moving the status and stamping the
//! associated timestamps together, or fail with
//! [`ErrorCode::InvalidTransition`](crate::domain::ErrorCode::InvalidTransition).

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::content::ContentEntity;
use super::error::Error;

/// Named lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    SubmitForReview,
    Approve,
    Preview,
    Schedule,
    Publish,
    Pause,
    Reopen,
    Close,
    Fill,
    Cancel,
    Deprecate,
    Archive,
}

impl LifecycleAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::SubmitForReview,
        Self::Approve,
        Self::Preview,
        Self::Schedule,
        Self::Publish,
        Self::Pause,
        Self::Reopen,
        Self::Close,
        Self::Fill,
        Self::Cancel,
        Self::Deprecate,
        Self::Archive,
    ];

    /// Stable snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubmitForReview => "submit_for_review",
            Self::Approve => "approve",
            Self::Preview => "preview",
            Self::Schedule => "schedule",
            Self::Publish => "publish",
            Self::Pause => "pause",
            Self::Reopen => "reopen",
            Self::Close => "close",
            Self::Fill => "fill",
            Self::Cancel => "cancel",
            Self::Deprecate => "deprecate",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status or action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for LifecycleAction {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ParseStatusError::new("lifecycle action", value))
    }
}

/// Status enumeration of one content type, with its transition table.
pub trait LifecycleStatus:
    Copy
    + Eq
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = ParseStatusError>
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// Every status value.
    const ALL: &'static [Self];

    /// Stable snake_case name.
    fn name(self) -> &'static str;

    /// Status assigned at creation.
    fn initial() -> Self;

    /// Published-equivalent status (`published`, `open`, `active`).
    fn published() -> Self;

    /// Status entered by [`LifecycleAction::Schedule`], when supported.
    fn scheduled() -> Option<Self> {
        None
    }

    /// Status reached by applying `action` from `self`, if permitted.
    fn target(self, action: LifecycleAction) -> Option<Self>;

    /// `true` for states that take the entity out of circulation.
    fn is_retired(self) -> bool;
}

/// Generate a status enumeration with its name table, `Display`, and
/// `FromStr` implementations.
macro_rules! define_status {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $text:literal
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $name {
            const NAMES: &'static [Self] = &[$(Self::$variant),*];

            /// Stable snake_case name.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::lifecycle::ParseStatusError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)*
                    other => Err($crate::domain::lifecycle::ParseStatusError::new(
                        stringify!($name),
                        other,
                    )),
                }
            }
        }
    };
}

pub(crate) use define_status;

/// Result of a lifecycle action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome<S> {
    /// The status moved.
    Applied { from: S, to: S },
    /// The entity already sat in the requested state; nothing changed.
    Unchanged(S),
}

impl<S> TransitionOutcome<S> {
    /// `true` when the entity was modified.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Apply `action` to `entity`.
///
/// `publish` on an entity already in its published-equivalent state is a
/// no-op so the first `published_at` stamp wins. Scheduling needs a target
/// time and goes through [`schedule`] instead.
pub fn apply_action<E: ContentEntity>(
    entity: &mut E,
    action: LifecycleAction,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome<E::Status>, Error> {
    if action == LifecycleAction::Schedule {
        return Err(Error::invalid_argument(
            "schedule requires a publication time",
        ));
    }
    transition(entity, action, now)
}

/// Move `entity` into its published-equivalent state.
pub fn publish<E: ContentEntity>(
    entity: &mut E,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome<E::Status>, Error> {
    transition(entity, LifecycleAction::Publish, now)
}

/// Schedule `entity` for publication at `at`, which must lie strictly after
/// `now`.
pub fn schedule<E: ContentEntity>(
    entity: &mut E,
    at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome<E::Status>, Error> {
    if at <= now {
        return Err(Error::invalid_argument(format!(
            "scheduled time {} must be in the future",
            at.to_rfc3339()
        ))
        .with_details(serde_json::json!({ "field": "at" })));
    }
    let outcome = transition(entity, LifecycleAction::Schedule, now)?;
    entity.header_mut().scheduled_for = Some(at);
    Ok(outcome)
}

/// `true` when `entity` is scheduled and its time has come.
pub fn is_due<E: ContentEntity>(entity: &E, now: DateTime<Utc>) -> bool {
    let header = entity.header();
    let scheduled = <E::Status as LifecycleStatus>::scheduled();
    scheduled == Some(header.status) && header.scheduled_for.is_some_and(|at| at <= now)
}

fn transition<E: ContentEntity>(
    entity: &mut E,
    action: LifecycleAction,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome<E::Status>, Error> {
    let header = entity.header_mut();
    let from = header.status;

    if action == LifecycleAction::Publish && from == <E::Status as LifecycleStatus>::published() {
        return Ok(TransitionOutcome::Unchanged(from));
    }

    let to = from
        .target(action)
        .ok_or_else(|| Error::invalid_transition(from.name(), action.as_str()))?;

    header.status = to;
    header.updated_at = now;
    if to == <E::Status as LifecycleStatus>::published() && header.published_at.is_none() {
        header.published_at = Some(now);
    }
    if action == LifecycleAction::Publish {
        header.scheduled_for = None;
    }
    if to.is_retired() && header.archived_at.is_none() {
        header.archived_at = Some(now);
    }

    Ok(TransitionOutcome::Applied { from, to })
}
