//! Saves a child-side edit to a synced copy.
//!
//! The edit runs through the full save lifecycle: locked columns reject it,
//! and accepted changes to restricted columns are recorded as downstream
//! changes so the next sync preserves them.

use super::helpers::{join_names, require_child_tag};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::RestrictorSettings;
use crate::error::{BlueprintError, Result};
use crate::lifecycle::{Lifecycle, SaveOutcome};
use crate::model::ContentKey;
use crate::restrictor::{ContentItem, OperationContext, Restrictable, Restrictor};
use crate::schema::SchemaRegistry;
use crate::store::{ContentTagStore, DownstreamMerge};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub assignments: Vec<(String, Value)>,
    /// Soft-delete the copy.
    pub delete: bool,
    /// Save as a system edit: neither checked nor tracked.
    pub system: bool,
}

pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    registry: &SchemaRegistry,
    settings: &RestrictorSettings,
    content: ContentKey,
    request: EditRequest,
) -> Result<CmdResult> {
    let tag = require_child_tag(store, &content)?;
    let mut item = ContentItem::persisted(content, BTreeMap::new());
    item.set_migration_id(tag.migration_id);
    for (column, value) in request.assignments {
        item.set(&column, value);
    }
    if request.delete {
        item.mark_deleted();
    }
    if item.pending_changes().is_empty() {
        return Err(BlueprintError::InvalidArgument(
            "nothing to change".to_string(),
        ));
    }

    let ctx = if request.system {
        OperationContext::new().skipping_downstream_changes()
    } else {
        OperationContext::new()
    };
    let lifecycle = Lifecycle::new(Restrictor::new(registry, store, settings));

    let mut result = CmdResult::default();
    match lifecycle.save(&mut item, &ctx, |_| Ok(()))? {
        SaveOutcome::Rejected(rejection) => {
            result.rejected = Some(rejection);
        }
        SaveOutcome::Saved(report) => {
            let message = match &report.downstream {
                Some(DownstreamMerge::Grew(columns)) => CmdMessage::success(format!(
                    "Saved {}; now tracking downstream changes to {}",
                    content,
                    join_names(columns)
                )),
                Some(DownstreamMerge::Unchanged) => CmdMessage::success(format!(
                    "Saved {}; downstream changes were already recorded",
                    content
                )),
                Some(DownstreamMerge::Missing) => CmdMessage::warning(format!(
                    "Saved {}, but its child tag is gone; the change was not recorded",
                    content
                )),
                None if request.system => {
                    CmdMessage::success(format!("Saved {} as a system edit", content))
                }
                None => CmdMessage::success(format!(
                    "Saved {}; no restricted columns changed",
                    content
                )),
            };
            result.add_message(message);
            result.save = Some(report);
        }
    }
    if let Some(tag) = store.child_tag(&content)? {
        result.child_tags.push(tag);
    }
    Ok(result)
}
