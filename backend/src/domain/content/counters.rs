//! Named engagement counters carried by every content entity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Counter names understood across the content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterKind {
    Views,
    Likes,
    Shares,
    Downloads,
    Inquiries,
    Applications,
    Demos,
    Trials,
    Conversions,
}

impl CounterKind {
    /// Every counter kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Views,
        Self::Likes,
        Self::Shares,
        Self::Downloads,
        Self::Inquiries,
        Self::Applications,
        Self::Demos,
        Self::Trials,
        Self::Conversions,
    ];

    /// Field name used in stored documents and aggregation queries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Likes => "likes",
            Self::Shares => "shares",
            Self::Downloads => "downloads",
            Self::Inquiries => "inquiries",
            Self::Applications => "applications",
            Self::Demos => "demos",
            Self::Trials => "trials",
            Self::Conversions => "conversions",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown counter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCounterKindError(String);

impl fmt::Display for ParseCounterKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown counter `{}`", self.0)
    }
}

impl std::error::Error for ParseCounterKindError {}

impl FromStr for CounterKind {
    type Err = ParseCounterKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseCounterKindError(value.to_owned()))
    }
}

/// Monotonic, non-negative counters keyed by [`CounterKind`].
///
/// Absent keys read as zero. The only mutation is [`Counters::increment`],
/// which is crate-private so counters move through action operations alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters(BTreeMap<CounterKind, u64>);

impl Counters {
    /// Current value of `kind`.
    pub fn get(&self, kind: CounterKind) -> u64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    /// Add one to `kind`, returning the new value.
    pub(crate) fn increment(&mut self, kind: CounterKind) -> u64 {
        let slot = self.0.entry(kind).or_insert(0);
        *slot = slot.saturating_add(1);
        *slot
    }

    /// Iterate over the counters that have been touched.
    pub fn iter(&self) -> impl Iterator<Item = (CounterKind, u64)> + '_ {
        self.0.iter().map(|(kind, value)| (*kind, *value))
    }
}
