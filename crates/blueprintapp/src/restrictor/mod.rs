//! # Restrictor Engine
//!
//! Decides which edits to blueprint copies are permitted, records the
//! attributes a child course changes on its copies, and reconciles those
//! changes when the blueprint syncs again.
//!
//! ## Hooks
//!
//! | Hook | When | Operation |
//! |------|------|-----------|
//! | validate | before every write | [`Restrictor::check_for_restricted_column_changes`] |
//! | before update | imports only | [`Restrictor::check_before_overwriting_child_content_on_import`] |
//! | after create | imports only | [`Restrictor::create_child_content_tag`] |
//! | after update | every update | [`Restrictor::mark_downstream_changes`] |
//!
//! [`crate::lifecycle::Lifecycle`] runs them in that order for one save.
//!
//! ## Inputs
//!
//! The engine holds no state of its own. It reads the immutable
//! [`SchemaRegistry`], the [`ContentTagStore`] and the [`RestrictorSettings`]
//! it was built with, the record (any [`Restrictable`]), and the
//! [`OperationContext`] of the save in progress.

use crate::config::RestrictorSettings;
use crate::error::Result;
use crate::model::{EditScope, Restrictions};
use crate::schema::{RestrictionSchema, SchemaRegistry};
use crate::store::ContentTagStore;
use crate::summary::{CourseRole, RestrictionSummary};

pub mod content;
pub mod context;
pub mod downstream;
pub mod import;
pub mod validate;

pub use content::{ContentItem, Restrictable, DELETED_STATE};
pub use context::{ImportMigration, OperationContext};
pub use import::ImportReconciliation;
pub use validate::{RestrictedColumnError, RestrictionCheck};

pub struct Restrictor<'a, S: ContentTagStore + ?Sized> {
    registry: &'a SchemaRegistry,
    store: &'a S,
    settings: &'a RestrictorSettings,
}

impl<'a, S: ContentTagStore + ?Sized> Restrictor<'a, S> {
    pub fn new(registry: &'a SchemaRegistry, store: &'a S, settings: &'a RestrictorSettings) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn settings(&self) -> &'a RestrictorSettings {
        self.settings
    }

    fn schema_for<T: Restrictable + ?Sized>(&self, item: &T) -> &'a RestrictionSchema {
        self.registry.restrictions_for(item.content_key().kind)
    }

    /// True when the item is a copy of blueprint content.
    pub fn is_child_content<T: Restrictable + ?Sized>(&self, item: &T) -> bool {
        item.migration_id()
            .is_some_and(|id| id.starts_with(&self.settings.migration_id_prefix))
    }

    /// Imports, system edits and non-copies are neither checked nor tracked.
    fn skip_restrictions<T: Restrictable + ?Sized>(&self, item: &T, ctx: &OperationContext<'_>) -> bool {
        ctx.is_importing() || ctx.skip_downstream_changes || !self.is_child_content(item)
    }

    /// The item's restrictions, loaded on first use and cached on the item.
    ///
    /// During an import they come from the migration's preloaded template
    /// restrictions; otherwise from the master tag with the item's migration id.
    /// Missing restrictions load as an empty map.
    pub fn child_content_restrictions<T: Restrictable + ?Sized>(
        &self,
        item: &mut T,
        ctx: &OperationContext<'_>,
    ) -> Result<Restrictions> {
        if let Some(restrictions) = item.child_content_restrictions() {
            return Ok(restrictions.clone());
        }
        let found = match (item.migration_id(), ctx.import) {
            (None, _) => None,
            (Some(id), Some(migration)) => migration.find_preloaded_restriction(id).cloned(),
            (Some(id), None) => self.store.master_tag(id)?.map(|tag| tag.restrictions),
        };
        let restrictions = found.unwrap_or_default();
        item.set_child_content_restrictions(restrictions.clone());
        Ok(restrictions)
    }

    pub fn editing_restricted<T: Restrictable + ?Sized>(
        &self,
        item: &mut T,
        ctx: &OperationContext<'_>,
        scope: EditScope,
    ) -> Result<bool> {
        if !self.is_child_content(item) {
            return Ok(false);
        }
        let restrictions = self.child_content_restrictions(item, ctx)?;
        if restrictions.is_empty() {
            return Ok(false);
        }
        if restrictions.locks_everything() {
            return Ok(true);
        }
        let mut categories = self.schema_for(item).categories();
        Ok(match scope {
            EditScope::All => categories.all(|c| restrictions.is_locked(c)),
            EditScope::Any => categories.any(|c| restrictions.is_locked(c)),
            EditScope::Only(category) => restrictions.is_locked(category),
        })
    }

    /// Validation hook: rejects pending changes to locked columns.
    ///
    /// The outer `Result` carries store failures; the inner one is the
    /// validation verdict.
    pub fn check_for_restricted_column_changes<T: Restrictable + ?Sized>(
        &self,
        item: &mut T,
        ctx: &OperationContext<'_>,
    ) -> Result<std::result::Result<RestrictionCheck, RestrictedColumnError>> {
        if item.is_new_record()
            || self.skip_restrictions(item, ctx)
            || self.settings.is_exempt(item.content_key().kind)
        {
            return Ok(Ok(RestrictionCheck::Unrestricted));
        }

        let schema = self.schema_for(item);
        let mut locked_columns: Vec<String> = Vec::new();
        for (category, columns) in schema.iter() {
            let changed: Vec<String> = item
                .pending_changes()
                .keys()
                .filter(|key| columns.contains(*key))
                .cloned()
                .collect();
            if changed.is_empty() {
                continue;
            }
            if self.child_content_restrictions(item, ctx)?.is_locked(category) {
                for column in changed {
                    if !locked_columns.contains(&column) {
                        locked_columns.push(column);
                    }
                }
            }
        }

        if locked_columns.is_empty() {
            Ok(Ok(RestrictionCheck::Accepted))
        } else {
            Ok(Err(RestrictedColumnError::new(locked_columns)))
        }
    }

    /// Restriction metadata for serializing the item in a course of `role`.
    pub fn restriction_summary<T: Restrictable + ?Sized>(
        &self,
        item: &mut T,
        ctx: &OperationContext<'_>,
        role: CourseRole,
    ) -> Result<RestrictionSummary> {
        match role {
            CourseRole::Child if self.is_child_content(item) => {
                let restricted = self.editing_restricted(item, ctx, EditScope::Any)?;
                let restrictions = self.child_content_restrictions(item, ctx)?;
                Ok(RestrictionSummary::child(restricted, &restrictions))
            }
            CourseRole::Master => Ok(item
                .master_template_restrictions()
                .map(RestrictionSummary::master)
                .unwrap_or_default()),
            CourseRole::Child => Ok(RestrictionSummary::none()),
        }
    }
}
