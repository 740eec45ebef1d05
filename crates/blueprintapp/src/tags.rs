//! Master and child content tags.
//!
//! A blueprint course owns one [`MasterTemplate`]. Every item that has been
//! part of a sync gets a [`MasterContentTag`] holding the restrictions the
//! template owner authored for it, keyed by the migration id the copies carry.
//!
//! On the receiving side, every copied item gets a [`ChildContentTag`] per
//! [`Subscription`]. It accumulates the attributes edited in the child since
//! the last sync, so the next sync knows what not to overwrite.

use crate::model::{ContentKey, Restrictions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Recorded in place of the state attribute when a child copy is deleted.
pub const MANUALLY_DELETED: &str = "manually_deleted";

/// The full-course template of a blueprint course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterTemplate {
    pub id: Uuid,
    pub course_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MasterTemplate {
    pub fn new(course_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id,
            created_at: Utc::now(),
        }
    }

    /// The migration id copies of `content` carry, whether or not the item
    /// has been synced yet.
    ///
    /// Deterministic: the same template and content always give the same id.
    pub fn migration_id_for(&self, content: &ContentKey, prefix: &str) -> String {
        let digest = Uuid::new_v5(&self.id, content.asset_string().as_bytes());
        format!("{}{}_{}", prefix, self.id.simple(), digest.simple())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterContentTag {
    pub id: Uuid,
    pub master_template_id: Uuid,
    pub content: ContentKey,
    pub migration_id: String,
    #[serde(default)]
    pub restrictions: Restrictions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MasterContentTag {
    pub fn new(template: &MasterTemplate, content: ContentKey, migration_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            master_template_id: template.id,
            content,
            migration_id,
            restrictions: Restrictions::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildContentTag {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub content: ContentKey,
    pub migration_id: Option<String>,
    /// Attributes changed downstream since the last sync, plus
    /// [`MANUALLY_DELETED`] when the copy was deleted in the child.
    #[serde(default)]
    pub downstream_changes: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChildContentTag {
    pub fn new(subscription_id: Uuid, content: ContentKey, migration_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subscription_id,
            content,
            migration_id,
            downstream_changes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn manually_deleted(&self) -> bool {
        self.downstream_changes.contains(MANUALLY_DELETED)
    }

    /// Downstream changes that fall in `columns`.
    pub fn changes_within<'a>(&'a self, columns: &'a [String]) -> impl Iterator<Item = &'a String> {
        columns
            .iter()
            .filter(move |c| self.downstream_changes.contains(c.as_str()))
    }
}

/// A child course's association with a blueprint template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub master_template_id: Uuid,
    pub child_course_id: Uuid,
}

impl Subscription {
    pub fn new(template: &MasterTemplate, child_course_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            master_template_id: template.id,
            child_course_id,
        }
    }

    /// Same template and child course, regardless of id.
    pub fn same_pairing(&self, other: &Subscription) -> bool {
        self.master_template_id == other.master_template_id
            && self.child_course_id == other.child_course_id
    }
}
