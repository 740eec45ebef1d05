//! # Restriction Schema Registry
//!
//! For every [`ContentKind`], which attributes each [`RestrictionCategory`]
//! governs. Locking a category on a master item locks every attribute the
//! schema lists for it on the child copies.
//!
//! The registry is built once at startup with a [`RegistryBuilder`] and is
//! immutable afterwards; engines borrow it.
//!
//! ```ignore
//! let mut builder = RegistryBuilder::new();
//! builder.restrict_columns(ContentKind::WikiPage, RestrictionCategory::Content, &["body", "title"])?;
//! builder.restrict_assignment_columns(ContentKind::Quiz)?;
//! let registry = builder.build();
//! ```
//!
//! Columns can be registered under categories that the UI never exposes for
//! locking (e.g. `settings` on most kinds). Those still matter: every
//! registered column is tracked as a downstream change, so a later sync will
//! not blindly overwrite it.

use crate::config::BlueprintConfig;
use crate::error::{ConfigurationError, Result};
use crate::model::{ContentKind, RestrictionCategory};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Category -> governed attribute names, for one content kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionSchema {
    columns: BTreeMap<RestrictionCategory, Vec<String>>,
}

impl RestrictionSchema {
    pub fn columns(&self, category: RestrictionCategory) -> &[String] {
        self.columns
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Registered categories, in declaration order of [`RestrictionCategory`].
    pub fn categories(&self) -> impl Iterator<Item = RestrictionCategory> + '_ {
        self.columns.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RestrictionCategory, &[String])> + '_ {
        self.columns.iter().map(|(c, cols)| (*c, cols.as_slice()))
    }

    /// Every attribute name governed by any category.
    pub fn all_columns(&self) -> BTreeSet<&str> {
        self.columns
            .values()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Immutable per-kind schema table.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<ContentKind, RestrictionSchema>,
    empty: RestrictionSchema,
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The schemas every deployment starts from.
    pub fn builtin() -> Result<Self> {
        Ok(builtin_builder()?.build())
    }

    /// Built-in schemas plus the `extra_columns` from configuration.
    pub fn from_config(config: &BlueprintConfig) -> Result<Self> {
        let mut builder = builtin_builder()?;
        if let Some(extra) = &config.extra_columns {
            for (kind, categories) in extra {
                let kind: ContentKind = kind.parse()?;
                for (category, columns) in categories {
                    builder.restrict_columns_named(kind, category, columns.as_slice())?;
                }
            }
        }
        Ok(builder.build())
    }

    pub fn restrictions_for(&self, kind: ContentKind) -> &RestrictionSchema {
        self.schemas.get(&kind).unwrap_or(&self.empty)
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: HashMap<ContentKind, RestrictionSchema>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `columns` to `category` for `kind`, dropping duplicates.
    pub fn restrict_columns<S: AsRef<str>>(
        &mut self,
        kind: ContentKind,
        category: RestrictionCategory,
        columns: &[S],
    ) -> std::result::Result<&mut Self, ConfigurationError> {
        if category == RestrictionCategory::All {
            return Err(ConfigurationError::CatchAllCategory);
        }
        let current = self
            .schemas
            .entry(kind)
            .or_default()
            .columns
            .entry(category)
            .or_default();
        for column in columns {
            let column = column.as_ref();
            if !current.iter().any(|c| c == column) {
                current.push(column.to_string());
            }
        }
        Ok(self)
    }

    /// Same as [`restrict_columns`](Self::restrict_columns) with the category
    /// given by name, as it appears in configuration files.
    pub fn restrict_columns_named<S: AsRef<str>>(
        &mut self,
        kind: ContentKind,
        category: &str,
        columns: &[S],
    ) -> std::result::Result<&mut Self, ConfigurationError> {
        let category: RestrictionCategory = category.parse()?;
        self.restrict_columns(kind, category, columns)
    }

    /// The graded settings shared by every assignment-like kind.
    pub fn restrict_assignment_columns(
        &mut self,
        kind: ContentKind,
    ) -> std::result::Result<&mut Self, ConfigurationError> {
        self.restrict_columns(
            kind,
            RestrictionCategory::Settings,
            &[
                "assignment_group_id",
                "grading_type",
                "omit_from_final_grade",
                "submission_types",
                "group_category",
                "group_category_id",
                "grade_group_students_individually",
                "peer_reviews",
                "moderated_grading",
                "peer_reviews_due_at",
                "allowed_attempts",
            ],
        )?
        .restrict_columns(kind, RestrictionCategory::DueDates, &["due_at"])?
        .restrict_columns(
            kind,
            RestrictionCategory::AvailabilityDates,
            &["lock_at", "unlock_at"],
        )?
        .restrict_columns(kind, RestrictionCategory::Points, &["points_possible"])
    }

    pub fn build(self) -> SchemaRegistry {
        SchemaRegistry {
            schemas: self.schemas,
            empty: RestrictionSchema::default(),
        }
    }
}

fn builtin_builder() -> std::result::Result<RegistryBuilder, ConfigurationError> {
    use ContentKind::*;
    use RestrictionCategory::*;

    let mut b = RegistryBuilder::new();
    b.restrict_columns(Assignment, Content, &["title", "description"])?
        .restrict_assignment_columns(Assignment)?;
    b.restrict_columns(Attachment, Content, &["display_name", "uuid", "folder_id"])?
        .restrict_columns(Attachment, AvailabilityDates, &["lock_at", "unlock_at", "locked"])?;
    b.restrict_columns(AssessmentQuestionBank, Content, &["title"])?;
    b.restrict_columns(CalendarEvent, Content, &["title", "description"])?
        .restrict_columns(
            CalendarEvent,
            Settings,
            &["location_name", "location_address", "start_at", "end_at"],
        )?;
    b.restrict_columns(ContextExternalTool, Content, &["name", "description"])?
        .restrict_columns(
            ContextExternalTool,
            Settings,
            &["url", "domain", "settings", "consumer_key", "shared_secret"],
        )?;
    b.restrict_columns(DiscussionTopic, Content, &["title", "message"])?
        .restrict_columns(
            DiscussionTopic,
            Settings,
            &[
                "require_initial_post",
                "discussion_type",
                "podcast_enabled",
                "podcast_has_student_posts",
                "allow_rating",
                "only_graders_can_rate",
            ],
        )?
        .restrict_columns(
            DiscussionTopic,
            AvailabilityDates,
            &["delayed_post_at", "lock_at"],
        )?;
    b.restrict_columns(LineItem, Content, &["label", "tag"])?
        .restrict_columns(LineItem, Points, &["score_maximum"])?;
    b.restrict_columns(Quiz, Content, &["title", "description", "quiz_data"])?
        .restrict_columns(
            Quiz,
            Settings,
            &[
                "quiz_type",
                "time_limit",
                "shuffle_answers",
                "show_correct_answers",
                "scoring_policy",
                "allowed_attempts",
                "access_code",
                "one_question_at_a_time",
            ],
        )?
        .restrict_columns(Quiz, DueDates, &["due_at"])?
        .restrict_columns(Quiz, AvailabilityDates, &["lock_at", "unlock_at"])?
        .restrict_columns(Quiz, Points, &["points_possible"])?;
    b.restrict_columns(WikiPage, Content, &["body", "title"])?
        .restrict_columns(WikiPage, Settings, &["editing_roles"])?
        .restrict_columns(WikiPage, AvailabilityDates, &["publish_at"])?;
    Ok(b)
}
