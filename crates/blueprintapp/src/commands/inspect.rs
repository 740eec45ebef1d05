use super::helpers::require_child_tag;
use crate::commands::{CmdMessage, CmdResult};
use crate::config::RestrictorSettings;
use crate::error::Result;
use crate::model::ContentKey;
use crate::preload::preload_child_restrictions;
use crate::restrictor::{ContentItem, OperationContext, Restrictor};
use crate::schema::SchemaRegistry;
use crate::store::ContentTagStore;
use crate::summary::CourseRole;
use std::collections::BTreeMap;

/// How a synced copy is restricted, as the child course sees it.
pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    registry: &SchemaRegistry,
    settings: &RestrictorSettings,
    content: ContentKey,
) -> Result<CmdResult> {
    let tag = require_child_tag(store, &content)?;
    let mut item = ContentItem::persisted(content, BTreeMap::new());
    item.set_migration_id(tag.migration_id.clone());
    preload_child_restrictions(store, [&mut item], &settings.migration_id_prefix)?;

    let restrictor = Restrictor::new(registry, store, settings);
    let summary = restrictor.restriction_summary(&mut item, &OperationContext::new(), CourseRole::Child)?;

    let mut result = CmdResult::default();
    if summary.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "{} is not blueprint content",
            content
        )));
    }
    result.summary = Some(summary);
    result.child_tags.push(tag);
    Ok(result)
}
