//! # Save Lifecycle
//!
//! Runs the restrictor hooks around one save attempt, in persistence-hook
//! order:
//!
//! ```text
//! validate ──rejected──> Rejected(columns)            (persist never runs)
//!    │
//!    ├─ update: import reconciliation (may revert pending writes)
//!    ├─ persist
//!    ├─ changes applied
//!    └─ create: child tag (imports)  |  update: record downstream changes
//! ```
//!
//! Every attempt reaches its outcome synchronously; nothing is retried.

use crate::error::Result;
use crate::restrictor::{
    ImportReconciliation, OperationContext, Restrictable, RestrictedColumnError, RestrictionCheck,
    Restrictor,
};
use crate::store::{ContentTagStore, DownstreamMerge};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub restriction_check: RestrictionCheck,
    pub reconciliation: ImportReconciliation,
    /// What the after-update hook recorded, if it recorded anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downstream: Option<DownstreamMerge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Rejected(RestrictedColumnError),
    Saved(SaveReport),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

pub struct Lifecycle<'a, S: ContentTagStore + ?Sized> {
    restrictor: Restrictor<'a, S>,
}

impl<'a, S: ContentTagStore + ?Sized> Lifecycle<'a, S> {
    pub fn new(restrictor: Restrictor<'a, S>) -> Self {
        Self { restrictor }
    }

    pub fn restrictor(&self) -> &Restrictor<'a, S> {
        &self.restrictor
    }

    /// Saves `item` through `persist`, which writes the record's pending
    /// changes. A rejected save leaves the item's pending changes in place.
    pub fn save<T, F>(&self, item: &mut T, ctx: &OperationContext<'_>, persist: F) -> Result<SaveOutcome>
    where
        T: Restrictable + ?Sized,
        F: FnOnce(&T) -> Result<()>,
    {
        let restriction_check = match self.restrictor.check_for_restricted_column_changes(item, ctx)? {
            Ok(check) => check,
            Err(rejection) => return Ok(SaveOutcome::Rejected(rejection)),
        };

        let creating = item.is_new_record();
        let reconciliation = if creating {
            ImportReconciliation::NoOverlap
        } else {
            self.restrictor
                .check_before_overwriting_child_content_on_import(item, ctx)?
        };

        persist(item)?;
        item.changes_applied();

        let downstream = if creating {
            self.restrictor.create_child_content_tag(item, ctx)?;
            None
        } else {
            self.restrictor.mark_downstream_changes(item, ctx, None)?
        };

        Ok(SaveOutcome::Saved(SaveReport {
            restriction_check,
            reconciliation,
            downstream,
        }))
    }
}
