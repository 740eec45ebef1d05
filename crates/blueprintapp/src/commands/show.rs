use super::helpers::require_template;
use crate::commands::{CmdMessage, CmdResult};
use crate::config::RestrictorSettings;
use crate::error::Result;
use crate::model::ContentKey;
use crate::preload::preload_default_template_restrictions;
use crate::restrictor::{ContentItem, OperationContext, Restrictor};
use crate::schema::SchemaRegistry;
use crate::store::ContentTagStore;
use crate::summary::CourseRole;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The restrictions a blueprint item carries, as the blueprint course sees
/// them.
pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    registry: &SchemaRegistry,
    settings: &RestrictorSettings,
    course_id: &Uuid,
    content: ContentKey,
) -> Result<CmdResult> {
    let template = require_template(store, course_id)?;
    let mut item = ContentItem::persisted(content, BTreeMap::new());
    preload_default_template_restrictions(
        store,
        [&mut item],
        course_id,
        &settings.migration_id_prefix,
    )?;

    let restrictor = Restrictor::new(registry, store, settings);
    let summary = restrictor.restriction_summary(&mut item, &OperationContext::new(), CourseRole::Master)?;

    let mut result = CmdResult::default();
    let migration_id = template.migration_id_for(&content, &settings.migration_id_prefix);
    match store.master_tag(&migration_id)? {
        Some(tag) => result.master_tags.push(tag),
        None => result.add_message(CmdMessage::info(format!(
            "{} has not been synced or locked yet",
            content
        ))),
    }
    result.summary = Some(summary);
    Ok(result)
}
