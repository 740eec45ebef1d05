//! Copies one blueprint item into a subscribed course.
//!
//! The first sync creates the copy through the same save lifecycle an import
//! uses, so its child tag is created by the after-create hook. Later syncs
//! write the blueprint's values (`column=value` assignments) over the
//! existing copy as an import update, which reconciles them with what the
//! child changed downstream. Content bodies are not stored here; only the
//! tags that restriction handling needs.

use super::helpers::{join_names, require_subscription};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::RestrictorSettings;
use crate::error::{BlueprintError, Result};
use crate::lifecycle::{Lifecycle, SaveOutcome};
use crate::model::ContentKey;
use crate::restrictor::{
    ContentItem, ImportMigration, ImportReconciliation, OperationContext, Restrictable, Restrictor,
    DELETED_STATE,
};
use crate::schema::SchemaRegistry;
use crate::store::ContentTagStore;
use crate::tags::{ChildContentTag, MasterContentTag, Subscription};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    registry: &SchemaRegistry,
    settings: &RestrictorSettings,
    subscription_id: &Uuid,
    master: ContentKey,
    assignments: &[(String, Value)],
) -> Result<CmdResult> {
    if !master.kind.allowed_in_blueprint() {
        return Err(BlueprintError::InvalidArgument(format!(
            "{} content is not synced through blueprints",
            master.kind
        )));
    }
    let subscription = require_subscription(store, subscription_id)?;
    let template = store
        .template(&subscription.master_template_id)?
        .ok_or_else(|| {
            BlueprintError::NotFound(format!("template {}", subscription.master_template_id))
        })?;

    let migration_id = template.migration_id_for(&master, &settings.migration_id_prefix);
    let master_tag = match store.master_tag(&migration_id)? {
        Some(tag) => tag,
        None => {
            let tag = MasterContentTag::new(&template, master, migration_id.clone());
            store.save_master_tag(&tag)?;
            tag
        }
    };

    let existing = store
        .list_child_tags(&subscription.id)?
        .into_iter()
        .find(|tag| tag.migration_id.as_deref() == Some(migration_id.as_str()));

    let mut result = CmdResult::default().with_master_tags(vec![master_tag]);
    let migration = ImportMigration::load(store, subscription.clone())?;
    let ctx = OperationContext::importing(&migration);
    let lifecycle = Lifecycle::new(Restrictor::new(registry, store, settings));

    let Some(existing) = existing else {
        let mut copy = ContentItem::new(master.kind).with_migration_id(migration_id);
        let state = copy.state_attribute();
        copy.set(state, "active");
        for (column, value) in assignments {
            copy.set(column, value.clone());
        }
        if let SaveOutcome::Rejected(rejection) = lifecycle.save(&mut copy, &ctx, |_| Ok(()))? {
            return Err(BlueprintError::Store(rejection.to_string()));
        }
        debug!(master = %master, copy = %copy.content_key(), "synced blueprint item");

        let tag = store.child_tag(&copy.content_key())?.ok_or_else(|| {
            BlueprintError::Store(format!("no child tag recorded for {}", copy.content_key()))
        })?;
        result.add_message(CmdMessage::success(format!(
            "Synced {} to course {} as {}",
            master, subscription.child_course_id, tag.content
        )));
        result.child_tags.push(tag);
        return Ok(result);
    };

    // The copy's stored state is only known through its tag.
    let state = existing.content.kind.state_attribute();
    let mut attributes = BTreeMap::new();
    if existing.manually_deleted() {
        attributes.insert(state.to_string(), Value::from(DELETED_STATE));
    }
    let mut copy = ContentItem::persisted(existing.content, attributes);
    copy.set_migration_id(existing.migration_id.clone());
    let mut requested: Vec<String> = assignments.iter().map(|(column, _)| column.clone()).collect();
    if existing.manually_deleted() {
        copy.set(state, "active");
        requested.push(state.to_string());
    }
    for (column, value) in assignments {
        copy.set(column, value.clone());
    }

    let report = match lifecycle.save(&mut copy, &ctx, |_| Ok(()))? {
        SaveOutcome::Rejected(rejection) => return Err(BlueprintError::Store(rejection.to_string())),
        SaveOutcome::Saved(report) => report,
    };
    debug!(
        master = %master,
        copy = %existing.content,
        reconciliation = ?report.reconciliation,
        "re-synced blueprint item"
    );

    let kept: Vec<String> = requested
        .into_iter()
        .filter(|column| !copy.saved_changes().contains_key(column))
        .collect();
    result.add_message(resync_message(&subscription, &existing, &report.reconciliation, &kept));
    result.save = Some(report);
    result.child_tags.push(require_current(store, &existing)?);
    Ok(result)
}

fn resync_message(
    subscription: &Subscription,
    copy: &ChildContentTag,
    reconciliation: &ImportReconciliation,
    kept: &[String],
) -> CmdMessage {
    let target = format!("{} in course {}", copy.content, subscription.child_course_id);
    match reconciliation {
        ImportReconciliation::NoOverlap => {
            CmdMessage::success(format!("Re-synced {}", target))
        }
        ImportReconciliation::PartiallyOverwritten {
            overwritten,
            preserved,
        } if preserved.is_empty() => CmdMessage::success(format!(
            "Re-synced {}, overwriting the child's {}",
            target,
            join_names(overwritten)
        )),
        ImportReconciliation::PartiallyOverwritten {
            overwritten,
            preserved,
        } => CmdMessage::warning(format!(
            "Re-synced {}, overwriting the child's {} and keeping its {}",
            target,
            join_names(overwritten),
            join_names(preserved)
        )),
        ImportReconciliation::FullyPreserved => CmdMessage::warning(format!(
            "Re-synced {}, keeping the child's {}",
            target,
            join_names(kept)
        )),
    }
}

fn require_current<S: ContentTagStore + ?Sized>(
    store: &S,
    tag: &ChildContentTag,
) -> Result<ChildContentTag> {
    store
        .child_tag(&tag.content)?
        .ok_or_else(|| BlueprintError::Store(format!("no child tag recorded for {}", tag.content)))
}
