use super::helpers::{join_names, require_template};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BlueprintError, Result};
use crate::model::{ContentKey, RestrictionCategory};
use crate::schema::SchemaRegistry;
use crate::store::ContentTagStore;
use crate::tags::MasterContentTag;
use chrono::Utc;
use uuid::Uuid;

/// Sets `categories` to `locked` on the master tag of `content` in the
/// blueprint of `course_id`, creating the tag if the item was never synced.
pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    registry: &SchemaRegistry,
    prefix: &str,
    course_id: &Uuid,
    content: ContentKey,
    categories: &[RestrictionCategory],
    locked: bool,
) -> Result<CmdResult> {
    if categories.is_empty() {
        return Err(BlueprintError::InvalidArgument(
            "at least one restriction category is required".to_string(),
        ));
    }
    if !content.kind.allowed_in_blueprint() {
        return Err(BlueprintError::InvalidArgument(format!(
            "{} content cannot be locked",
            content.kind
        )));
    }
    let template = require_template(store, course_id)?;
    let migration_id = template.migration_id_for(&content, prefix);
    let mut tag = store
        .master_tag(&migration_id)?
        .unwrap_or_else(|| MasterContentTag::new(&template, content, migration_id));

    let mut result = CmdResult::default();
    let schema = registry.restrictions_for(content.kind);
    for category in categories {
        if *category != RestrictionCategory::All && schema.columns(*category).is_empty() {
            result.add_message(CmdMessage::warning(format!(
                "{} governs no {} columns",
                category, content.kind
            )));
        }
        tag.restrictions.set(*category, locked);
    }
    tag.updated_at = Utc::now();
    store.save_master_tag(&tag)?;

    let verb = if locked { "Locked" } else { "Unlocked" };
    result.add_message(CmdMessage::success(format!(
        "{} {} on {}",
        verb,
        join_names(categories),
        content
    )));
    Ok(result.with_master_tags(vec![tag]))
}
