//! # Domain Model
//!
//! The vocabulary shared by every other module: what kinds of content can be
//! restricted, how a content record is identified, what an attribute change
//! looks like, and the closed set of restriction categories.
//!
//! ## Content Kinds
//!
//! Blueprint content is polymorphic. Rather than branching on runtime types,
//! each [`ContentKind`] declares its capabilities statically:
//!
//! | Kind | State attribute | In blueprints | Child preload |
//! |------|-----------------|---------------|---------------|
//! | `attachment` | `file_state` | yes | yes |
//! | `folder` | `workflow_state` | no | skipped |
//! | everything else | `workflow_state` | yes | yes |
//!
//! ## Restriction Categories
//!
//! A [`RestrictionCategory`] names a group of attributes that is locked as a
//! unit. [`LOCK_TYPES`] lists the categories columns can be registered under;
//! `all` is a catch-all flag that only ever appears in a [`Restrictions`] map.

use crate::error::{BlueprintError, ConfigurationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Assignment,
    Attachment,
    AssessmentQuestionBank,
    CalendarEvent,
    ContextExternalTool,
    DiscussionTopic,
    Folder,
    LineItem,
    Quiz,
    WikiPage,
}

impl ContentKind {
    pub const ALL: [ContentKind; 10] = [
        ContentKind::Assignment,
        ContentKind::Attachment,
        ContentKind::AssessmentQuestionBank,
        ContentKind::CalendarEvent,
        ContentKind::ContextExternalTool,
        ContentKind::DiscussionTopic,
        ContentKind::Folder,
        ContentKind::LineItem,
        ContentKind::Quiz,
        ContentKind::WikiPage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Assignment => "assignment",
            ContentKind::Attachment => "attachment",
            ContentKind::AssessmentQuestionBank => "assessment_question_bank",
            ContentKind::CalendarEvent => "calendar_event",
            ContentKind::ContextExternalTool => "context_external_tool",
            ContentKind::DiscussionTopic => "discussion_topic",
            ContentKind::Folder => "folder",
            ContentKind::LineItem => "line_item",
            ContentKind::Quiz => "quiz",
            ContentKind::WikiPage => "wiki_page",
        }
    }

    /// The attribute that carries soft-delete state for this kind.
    pub fn state_attribute(&self) -> &'static str {
        match self {
            ContentKind::Attachment => "file_state",
            _ => "workflow_state",
        }
    }

    /// Whether items of this kind can be distributed through a blueprint.
    pub fn allowed_in_blueprint(&self) -> bool {
        !matches!(self, ContentKind::Folder)
    }

    /// Containers are never hydrated with child restrictions.
    pub fn skips_child_preload(&self) -> bool {
        matches!(self, ContentKind::Folder)
    }

    /// Stable identifier for a record of this kind, e.g. `wiki_page_<uuid>`.
    pub fn asset_string(&self, id: &Uuid) -> String {
        format!("{}_{}", self.as_str(), id.simple())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownKind(s.to_string()))
    }
}

/// Identifies one content record, regardless of course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub kind: ContentKind,
    pub id: Uuid,
}

impl ContentKey {
    pub fn new(kind: ContentKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn asset_string(&self) -> String {
        self.kind.asset_string(&self.id)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Old and new value of a single attribute within one save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub old: serde_json::Value,
    pub new: serde_json::Value,
}

impl Change {
    pub fn new(old: impl Into<serde_json::Value>, new: impl Into<serde_json::Value>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Attribute name -> change, ordered so reports are deterministic.
pub type ChangeSet = BTreeMap<String, Change>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionCategory {
    Content,
    Settings,
    DueDates,
    AvailabilityDates,
    Points,
    All,
}

/// Categories that columns can be registered under.
pub const LOCK_TYPES: [RestrictionCategory; 5] = [
    RestrictionCategory::Content,
    RestrictionCategory::Settings,
    RestrictionCategory::DueDates,
    RestrictionCategory::AvailabilityDates,
    RestrictionCategory::Points,
];

impl RestrictionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestrictionCategory::Content => "content",
            RestrictionCategory::Settings => "settings",
            RestrictionCategory::DueDates => "due_dates",
            RestrictionCategory::AvailabilityDates => "availability_dates",
            RestrictionCategory::Points => "points",
            RestrictionCategory::All => "all",
        }
    }
}

impl fmt::Display for RestrictionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestrictionCategory {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LOCK_TYPES
            .into_iter()
            .chain(std::iter::once(RestrictionCategory::All))
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownCategory(s.to_string()))
    }
}

/// Which categories are locked for downstream copies of one item.
///
/// Categories that are absent are unlocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restrictions(BTreeMap<RestrictionCategory, bool>);

impl Restrictions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrictions with the given categories locked.
    pub fn locking(categories: &[RestrictionCategory]) -> Self {
        Self(categories.iter().map(|c| (*c, true)).collect())
    }

    pub fn set(&mut self, category: RestrictionCategory, locked: bool) {
        self.0.insert(category, locked);
    }

    pub fn is_locked(&self, category: RestrictionCategory) -> bool {
        self.0.get(&category).copied().unwrap_or(false)
    }

    /// True when the catch-all `all` flag is set.
    pub fn locks_everything(&self) -> bool {
        self.is_locked(RestrictionCategory::All)
    }

    pub fn any_locked(&self) -> bool {
        self.0.values().any(|locked| *locked)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RestrictionCategory, bool)> + '_ {
        self.0.iter().map(|(c, l)| (*c, *l))
    }
}

impl FromIterator<(RestrictionCategory, bool)> for Restrictions {
    fn from_iter<T: IntoIterator<Item = (RestrictionCategory, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What `editing_restricted` asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditScope {
    /// Every registered category is locked.
    #[default]
    All,
    /// At least one registered category is locked.
    Any,
    /// One specific category is locked.
    Only(RestrictionCategory),
}

impl FromStr for EditScope {
    type Err = BlueprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(EditScope::All),
            "any" => Ok(EditScope::Any),
            other => LOCK_TYPES
                .into_iter()
                .find(|category| category.as_str() == other)
                .map(EditScope::Only)
                .ok_or_else(|| BlueprintError::InvalidArgument(format!("invalid edit type: {}", s))),
        }
    }
}
