//! Reconciling downstream changes with an incoming blueprint sync.
//!
//! For every category with recorded downstream changes, a locked category
//! lets the sync win (the recorded changes are cleared) and an unlocked one
//! lets the child win (the sync's writes to that category are undone). A copy
//! deleted in the child stays deleted unless the blueprint locks something.

use super::content::{Restrictable, DELETED_STATE};
use super::context::OperationContext;
use super::Restrictor;
use crate::error::Result;
use crate::model::{EditScope, RestrictionCategory};
use crate::store::ContentTagStore;
use crate::tags::MANUALLY_DELETED;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// What import reconciliation did to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "columns")]
pub enum ImportReconciliation {
    /// Nothing recorded downstream touched this write.
    NoOverlap,
    /// The sync overwrote the `overwritten` downstream changes, which were
    /// cleared. Writes to `preserved` columns were undone in the same pass.
    PartiallyOverwritten {
        overwritten: BTreeSet<String>,
        preserved: BTreeSet<String>,
    },
    /// Every conflicting write was undone and the child's values kept.
    FullyPreserved,
}

impl<S: ContentTagStore + ?Sized> Restrictor<'_, S> {
    /// Before-update hook for imports.
    ///
    /// Clears downstream changes in locked categories, reverts pending writes
    /// to unlocked categories with downstream changes, and settles undeletes
    /// of manually deleted copies. Items with reverted writes are reported to
    /// the migration as skipped.
    pub fn check_before_overwriting_child_content_on_import<T: Restrictable + ?Sized>(
        &self,
        item: &mut T,
        ctx: &OperationContext<'_>,
    ) -> Result<ImportReconciliation> {
        let Some(migration) = ctx.import else {
            return Ok(ImportReconciliation::NoOverlap);
        };
        if !self.is_child_content(item) {
            return Ok(ImportReconciliation::NoOverlap);
        }

        let key = item.content_key();
        let mut tag = self.store.find_or_create_child_tag(
            migration.subscription(),
            &key,
            item.migration_id(),
        )?;
        if tag.downstream_changes.is_empty() {
            return Ok(ImportReconciliation::NoOverlap);
        }

        let restrictions = self.child_content_restrictions(item, ctx)?;
        let mut to_clear: BTreeSet<String> = BTreeSet::new();
        let mut to_restore: Vec<String> = Vec::new();
        for (category, columns) in self.schema_for(item).iter() {
            let overlap: Vec<String> = tag.changes_within(columns).cloned().collect();
            if overlap.is_empty() {
                continue;
            }
            if restrictions.is_locked(category) {
                to_clear.extend(overlap);
            } else {
                for column in item.pending_changes().keys() {
                    if columns.contains(column) && !to_restore.contains(column) {
                        to_restore.push(column.clone());
                    }
                }
            }
        }

        let state = item.state_attribute();
        let undeleting = item
            .pending_changes()
            .get(state)
            .is_some_and(|change| change.old.as_str() == Some(DELETED_STATE));
        if undeleting && tag.manually_deleted() {
            if self.editing_restricted(item, ctx, EditScope::Any)? {
                to_clear.insert(MANUALLY_DELETED.to_string());
            } else if !to_restore.iter().any(|c| c == state) {
                to_restore.push(state.to_string());
            }
        }

        if !to_clear.is_empty() {
            self.store.remove_downstream_changes(&key, &to_clear)?;
            tag.downstream_changes.retain(|c| !to_clear.contains(c));
        }

        if !to_restore.is_empty() {
            debug!(
                content = %key,
                columns = ?to_restore,
                "undoing imported changes because they were changed downstream"
            );
            item.restore_attributes(&to_restore);
            migration.add_skipped_item(tag);
        }

        Ok(if !to_clear.is_empty() {
            ImportReconciliation::PartiallyOverwritten {
                overwritten: to_clear,
                preserved: to_restore.into_iter().collect(),
            }
        } else if !to_restore.is_empty() {
            ImportReconciliation::FullyPreserved
        } else {
            ImportReconciliation::NoOverlap
        })
    }

    /// Categories an import would be blocked from overwriting: those with
    /// downstream changes that the blueprint does not lock.
    ///
    /// Read-only; a copy without a child tag has nothing blocked.
    pub fn edit_types_locked_for_overwrite_on_import<T: Restrictable + ?Sized>(
        &self,
        item: &mut T,
        ctx: &OperationContext<'_>,
    ) -> Result<Vec<RestrictionCategory>> {
        if !ctx.is_importing() || !self.is_child_content(item) {
            return Ok(Vec::new());
        }
        let Some(tag) = self.store.child_tag(&item.content_key())? else {
            return Ok(Vec::new());
        };
        if tag.downstream_changes.is_empty() {
            return Ok(Vec::new());
        }

        let restrictions = self.child_content_restrictions(item, ctx)?;
        Ok(self
            .schema_for(item)
            .iter()
            .filter(|(category, columns)| {
                !restrictions.is_locked(*category) && tag.changes_within(columns).next().is_some()
            })
            .map(|(category, _)| category)
            .collect())
    }
}
