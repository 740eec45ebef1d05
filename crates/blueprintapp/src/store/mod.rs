//! # Storage Layer
//!
//! This module defines the storage abstraction for blueprint tags. The
//! [`ContentTagStore`] trait is what the engine, the preloading helpers and the
//! command layer talk to; it is object safe and takes `&self` throughout so a
//! single store can be shared by concurrent saves.
//!
//! ## Two Layers
//!
//! - [`backend::StorageBackend`]: raw table I/O plus one locking primitive, a
//!   row-locked read-modify-write of a child tag.
//! - [`tag_store::TagStore`]: the business operations (find-or-create, batched
//!   restriction lookups, downstream change merging) over any backend.
//!
//! ## Concurrency
//!
//! The only multi-step read-modify-write against shared state is folding new
//! columns into (or clearing columns from) a child tag's downstream changes.
//! Those go through [`backend::StorageBackend::update_child_tag`], which holds
//! the row exclusively for the whole sequence. Everything else is a single
//! insert, upsert, or read.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: JSON tables on disk (used by the CLI).
//! - [`memory::InMemoryStore`]: per-row mutexes, for embedding and tests.
//!
//! ## Storage Layout
//!
//! ```text
//! <data>/
//! ├── blueprint.toml       # Configuration
//! ├── templates.json       # Master templates
//! ├── subscriptions.json   # Child course subscriptions
//! ├── master_tags.json     # Restrictions per migration id
//! └── child_tags.json      # Downstream changes per child item
//! ```

use crate::error::Result;
use crate::model::{ContentKey, Restrictions};
use crate::tags::{ChildContentTag, MasterContentTag, MasterTemplate, Subscription};
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

pub mod backend;
pub mod fs;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;
pub mod tag_store;

/// Result of folding columns into a child tag's downstream changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "columns")]
pub enum DownstreamMerge {
    /// No child tag exists for the content.
    Missing,
    /// Every column was already recorded; nothing was written.
    Unchanged,
    /// The listed columns were new and the tag was persisted.
    Grew(BTreeSet<String>),
}

/// Abstract interface for master/child tag persistence.
pub trait ContentTagStore {
    /// The full-course template of a blueprint course, if it has one.
    fn full_template_for(&self, course_id: &Uuid) -> Result<Option<MasterTemplate>>;

    fn find_or_create_template(&self, course_id: &Uuid) -> Result<MasterTemplate>;

    fn template(&self, id: &Uuid) -> Result<Option<MasterTemplate>>;

    /// Idempotent per (template, child course).
    fn find_or_create_subscription(
        &self,
        template: &MasterTemplate,
        child_course_id: &Uuid,
    ) -> Result<Subscription>;

    fn subscription(&self, id: &Uuid) -> Result<Option<Subscription>>;

    fn master_tag(&self, migration_id: &str) -> Result<Option<MasterContentTag>>;

    /// Batched lookup of `(migration_id, restrictions)` pairs, optionally
    /// limited to one template. Ids without a tag are simply absent.
    fn master_restrictions(
        &self,
        migration_ids: &[String],
        template_id: Option<&Uuid>,
    ) -> Result<Vec<(String, Restrictions)>>;

    fn save_master_tag(&self, tag: &MasterContentTag) -> Result<()>;

    fn list_master_tags(&self, template_id: &Uuid) -> Result<Vec<MasterContentTag>>;

    fn child_tag(&self, content: &ContentKey) -> Result<Option<ChildContentTag>>;

    /// Idempotent: concurrent callers all get the same tag.
    fn find_or_create_child_tag(
        &self,
        subscription: &Subscription,
        content: &ContentKey,
        migration_id: Option<&str>,
    ) -> Result<ChildContentTag>;

    /// Row-locked union of `columns` into the tag's downstream changes,
    /// persisting only if the set grew.
    fn merge_downstream_changes(
        &self,
        content: &ContentKey,
        columns: &BTreeSet<String>,
    ) -> Result<DownstreamMerge>;

    /// Row-locked removal of `columns` from the tag's downstream changes.
    /// Returns whether anything was removed.
    fn remove_downstream_changes(
        &self,
        content: &ContentKey,
        columns: &BTreeSet<String>,
    ) -> Result<bool>;

    fn list_child_tags(&self, subscription_id: &Uuid) -> Result<Vec<ChildContentTag>>;
}
