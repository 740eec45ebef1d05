use super::helpers::{join_names, require_child_tag, require_subscription};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::RestrictorSettings;
use crate::error::Result;
use crate::model::{ContentKey, EditScope};
use crate::restrictor::{ContentItem, ImportMigration, OperationContext, Restrictor};
use crate::schema::SchemaRegistry;
use crate::store::ContentTagStore;
use std::collections::BTreeMap;

/// Dry run of the next sync for one copy: the categories it would leave
/// alone because the child changed them and the blueprint does not lock them.
/// Nothing is written.
pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    registry: &SchemaRegistry,
    settings: &RestrictorSettings,
    content: ContentKey,
) -> Result<CmdResult> {
    let tag = require_child_tag(store, &content)?;
    let subscription = require_subscription(store, &tag.subscription_id)?;
    let migration = ImportMigration::load(store, subscription)?;
    let ctx = OperationContext::importing(&migration);

    let mut item = ContentItem::persisted(content, BTreeMap::new());
    item.set_migration_id(tag.migration_id.clone());
    let restrictor = Restrictor::new(registry, store, settings);
    let blocked = restrictor.edit_types_locked_for_overwrite_on_import(&mut item, &ctx)?;

    let mut result = CmdResult::default();
    if tag.manually_deleted() {
        if restrictor.editing_restricted(&mut item, &ctx, EditScope::Any)? {
            result.add_message(CmdMessage::info(format!(
                "The next sync will restore {}, which the child deleted",
                content
            )));
        } else {
            result.add_message(CmdMessage::warning(format!(
                "The next sync will keep {} deleted, as the child left it",
                content
            )));
        }
    }
    if !blocked.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "The next sync will keep the child's {} on {}",
            join_names(&blocked),
            content
        )));
    } else if !tag.manually_deleted() {
        result.add_message(CmdMessage::info(format!(
            "The next sync will overwrite {} completely",
            content
        )));
    }
    result.blocked = Some(blocked);
    result.child_tags.push(tag);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentKind, RestrictionCategory};
    use crate::store::memory::fixtures::StoreFixture;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn preview(fixture: &StoreFixture, content: ContentKey) -> CmdResult {
        run(
            &fixture.store,
            &SchemaRegistry::builtin().unwrap(),
            &RestrictorSettings::default(),
            content,
        )
        .unwrap()
    }

    fn diverge(fixture: &StoreFixture, content: &ContentKey, columns: &[&str]) {
        let columns: BTreeSet<String> = columns.iter().map(|c| c.to_string()).collect();
        fixture
            .store
            .merge_downstream_changes(content, &columns)
            .unwrap();
    }

    #[test]
    fn test_preview_reports_unlocked_changed_categories() {
        let master = ContentKey::new(ContentKind::Assignment, Uuid::new_v4());
        let child = ContentKey::new(ContentKind::Assignment, Uuid::new_v4());
        let fixture = StoreFixture::new()
            .with_master_item(master, &[RestrictionCategory::Content])
            .with_child_copy(child, &master);
        diverge(&fixture, &child, &["title", "due_at"]);

        let result = preview(&fixture, child);
        assert_eq!(result.blocked, Some(vec![RestrictionCategory::DueDates]));
        assert!(result.messages[0].content.contains("due_dates"));
    }

    #[test]
    fn test_preview_clean_copy_blocks_nothing() {
        let master = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let child = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let fixture = StoreFixture::new()
            .with_master_item(master, &[])
            .with_child_copy(child, &master);

        let result = preview(&fixture, child);
        assert_eq!(result.blocked, Some(vec![]));
        assert!(result.messages[0].content.contains("overwrite"));
    }

    #[test]
    fn test_preview_does_not_write() {
        let master = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let child = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let fixture = StoreFixture::new()
            .with_master_item(master, &[RestrictionCategory::Content])
            .with_child_copy(child, &master);
        diverge(&fixture, &child, &["body"]);

        let result = preview(&fixture, child);
        assert_eq!(result.blocked, Some(vec![]));
        let tag = fixture.store.child_tag(&child).unwrap().unwrap();
        assert!(tag.downstream_changes.contains("body"));
    }

    #[test]
    fn test_preview_reports_manual_deletion() {
        let master = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let child = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let fixture = StoreFixture::new()
            .with_master_item(master, &[])
            .with_child_copy(child, &master);
        diverge(&fixture, &child, &[crate::tags::MANUALLY_DELETED]);

        let result = preview(&fixture, child);
        assert_eq!(result.messages.len(), 1);
        assert!(result.messages[0].content.contains("keep"));
        assert!(result.messages[0].content.contains("deleted"));
        assert!(!result.messages[0].content.contains("completely"));
    }

    #[test]
    fn test_preview_locked_copy_is_restored() {
        let master = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let child = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let fixture = StoreFixture::new()
            .with_master_item(master, &[RestrictionCategory::Points])
            .with_child_copy(child, &master);
        diverge(&fixture, &child, &[crate::tags::MANUALLY_DELETED]);

        let result = preview(&fixture, child);
        assert!(result.messages[0].content.contains("will restore"));
    }
}
