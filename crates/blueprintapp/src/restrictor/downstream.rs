//! Recording child-side divergence.

use super::content::{Restrictable, DELETED_STATE};
use super::context::OperationContext;
use super::Restrictor;
use crate::error::Result;
use crate::store::{ContentTagStore, DownstreamMerge};
use crate::tags::{ChildContentTag, MANUALLY_DELETED};
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl<S: ContentTagStore + ?Sized> Restrictor<'_, S> {
    /// After-update hook: adds the restricted columns the save changed to the
    /// child tag's downstream changes.
    ///
    /// `columns` overrides the saved diff. A soft delete is recorded as
    /// [`MANUALLY_DELETED`] instead of the state attribute. Returns `None` when
    /// the save was not tracked or changed nothing restricted. A missing child
    /// tag is logged and reported as [`DownstreamMerge::Missing`].
    pub fn mark_downstream_changes<T: Restrictable + ?Sized>(
        &self,
        item: &T,
        ctx: &OperationContext<'_>,
        columns: Option<&[String]>,
    ) -> Result<Option<DownstreamMerge>> {
        if self.skip_restrictions(item, ctx) {
            return Ok(None);
        }

        let saved = item.saved_changes();
        let mut changed: BTreeSet<String> = match columns {
            Some(columns) => columns.iter().cloned().collect(),
            None => {
                let restricted = self.schema_for(item).all_columns();
                saved
                    .keys()
                    .filter(|key| restricted.contains(key.as_str()))
                    .cloned()
                    .collect()
            }
        };

        let state = item.state_attribute();
        if saved
            .get(state)
            .is_some_and(|change| change.new.as_str() == Some(DELETED_STATE))
        {
            changed.remove(state);
            changed.insert(MANUALLY_DELETED.to_string());
        }
        if changed.is_empty() {
            return Ok(None);
        }

        let owner = item.tag_owner();
        let merge = self.store.merge_downstream_changes(&owner, &changed)?;
        match &merge {
            DownstreamMerge::Missing => warn!(
                content = %item.content_key(),
                tag_owner = %owner,
                "child content tag not found; content predates blueprint tracking or tag creation failed"
            ),
            DownstreamMerge::Grew(added) => debug!(
                content = %item.content_key(),
                columns = ?added,
                "recorded downstream changes"
            ),
            DownstreamMerge::Unchanged => {}
        }
        Ok(Some(merge))
    }

    /// After-create hook: during an import, find or create the child tag of a
    /// newly copied item so later lookups hit an existing row.
    pub fn create_child_content_tag<T: Restrictable + ?Sized>(
        &self,
        item: &T,
        ctx: &OperationContext<'_>,
    ) -> Result<Option<ChildContentTag>> {
        let Some(migration) = ctx.import else {
            return Ok(None);
        };
        if !self.is_child_content(item) {
            return Ok(None);
        }
        let tag = self.store.find_or_create_child_tag(
            migration.subscription(),
            &item.content_key(),
            item.migration_id(),
        )?;
        Ok(Some(tag))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::RestrictorSettings;
    use crate::model::{ContentKey, ContentKind};
    use crate::restrictor::{ContentItem, ImportMigration, OperationContext, Restrictable, Restrictor};
    use crate::schema::SchemaRegistry;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::{ContentTagStore, DownstreamMerge};
    use crate::tags::MANUALLY_DELETED;
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet};
    use uuid::Uuid;

    fn names(columns: &[&str]) -> BTreeSet<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    /// A synced child copy of a fresh master item, with its child tag.
    fn synced_copy(fixture: StoreFixture, kind: ContentKind) -> (StoreFixture, ContentItem) {
        let master = ContentKey::new(kind, Uuid::new_v4());
        let child = ContentKey::new(kind, Uuid::new_v4());
        let fixture = fixture.with_child_copy(child, &master);
        let attributes = BTreeMap::from([
            ("title".to_string(), json!("Original")),
            ("workflow_state".to_string(), json!("active")),
            ("file_state".to_string(), json!("available")),
        ]);
        let item = ContentItem::persisted(child, attributes).with_migration_id(fixture.migration_id(&master));
        (fixture, item)
    }

    fn save(item: &mut ContentItem) {
        item.changes_applied();
    }

    #[test]
    fn edits_to_distinct_columns_accumulate() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, mut item) = synced_copy(StoreFixture::new(), ContentKind::WikiPage);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);
        let ctx = OperationContext::new();

        item.set("title", "Child title");
        save(&mut item);
        restrictor.mark_downstream_changes(&item, &ctx, None).unwrap();
        item.set("body", "<p>child body</p>");
        save(&mut item);
        restrictor.mark_downstream_changes(&item, &ctx, None).unwrap();

        let tag = fixture.store.child_tag(&item.content_key()).unwrap().unwrap();
        assert!(tag.downstream_changes.is_superset(&names(&["title", "body"])));
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, mut item) = synced_copy(StoreFixture::new(), ContentKind::WikiPage);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);
        let ctx = OperationContext::new();

        item.set("title", "Child title");
        save(&mut item);
        assert_eq!(
            restrictor.mark_downstream_changes(&item, &ctx, None).unwrap(),
            Some(DownstreamMerge::Grew(names(&["title"])))
        );
        assert_eq!(
            restrictor.mark_downstream_changes(&item, &ctx, None).unwrap(),
            Some(DownstreamMerge::Unchanged)
        );
        let tag = fixture.store.child_tag(&item.content_key()).unwrap().unwrap();
        assert_eq!(tag.downstream_changes, names(&["title"]));
    }

    #[test]
    fn unrestricted_columns_are_not_recorded() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, mut item) = synced_copy(StoreFixture::new(), ContentKind::WikiPage);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);

        item.set("todo_date", "2026-03-01");
        save(&mut item);
        assert_eq!(
            restrictor
                .mark_downstream_changes(&item, &OperationContext::new(), None)
                .unwrap(),
            None
        );
    }

    #[test]
    fn explicit_columns_override_the_diff() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, item) = synced_copy(StoreFixture::new(), ContentKind::AssessmentQuestionBank);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);

        let columns = vec!["questions".to_string()];
        restrictor
            .mark_downstream_changes(&item, &OperationContext::new(), Some(&columns))
            .unwrap();
        let tag = fixture.store.child_tag(&item.content_key()).unwrap().unwrap();
        assert_eq!(tag.downstream_changes, names(&["questions"]));
    }

    #[test]
    fn soft_delete_records_sentinel() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, mut item) = synced_copy(StoreFixture::new(), ContentKind::Attachment);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);

        item.mark_deleted();
        save(&mut item);
        restrictor
            .mark_downstream_changes(&item, &OperationContext::new(), None)
            .unwrap();

        let tag = fixture.store.child_tag(&item.content_key()).unwrap().unwrap();
        assert_eq!(tag.downstream_changes, names(&[MANUALLY_DELETED]));
        assert!(!tag.downstream_changes.contains("file_state"));
    }

    #[test]
    fn missing_tag_is_reported_not_raised() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let fixture = StoreFixture::new();
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);

        let master = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let mut item = ContentItem::persisted(
            ContentKey::new(ContentKind::WikiPage, Uuid::new_v4()),
            BTreeMap::new(),
        )
        .with_migration_id(fixture.migration_id(&master));
        item.set("title", "Orphan");
        save(&mut item);

        assert_eq!(
            restrictor
                .mark_downstream_changes(&item, &OperationContext::new(), None)
                .unwrap(),
            Some(DownstreamMerge::Missing)
        );
    }

    #[test]
    fn owner_tag_receives_submittable_changes() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, topic) = synced_copy(StoreFixture::new(), ContentKind::DiscussionTopic);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);

        let master_assignment = ContentKey::new(ContentKind::Assignment, Uuid::new_v4());
        let mut assignment = ContentItem::persisted(
            ContentKey::new(ContentKind::Assignment, Uuid::new_v4()),
            BTreeMap::new(),
        )
        .with_migration_id(fixture.migration_id(&master_assignment))
        .with_tag_owner(topic.content_key());
        assignment.set("points_possible", 15);
        save(&mut assignment);

        restrictor
            .mark_downstream_changes(&assignment, &OperationContext::new(), None)
            .unwrap();
        let tag = fixture.store.child_tag(&topic.content_key()).unwrap().unwrap();
        assert_eq!(tag.downstream_changes, names(&["points_possible"]));
        assert!(fixture
            .store
            .child_tag(&assignment.content_key())
            .unwrap()
            .is_none());
    }

    #[test]
    fn imports_and_system_edits_are_not_tracked() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let (fixture, mut item) = synced_copy(StoreFixture::new(), ContentKind::WikiPage);
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);
        let migration = ImportMigration::new(fixture.subscription.clone());

        item.set("title", "Synced title");
        save(&mut item);
        for ctx in [
            OperationContext::importing(&migration),
            OperationContext::new().skipping_downstream_changes(),
        ] {
            assert_eq!(restrictor.mark_downstream_changes(&item, &ctx, None).unwrap(), None);
        }
        let tag = fixture.store.child_tag(&item.content_key()).unwrap().unwrap();
        assert!(tag.downstream_changes.is_empty());
    }

    #[test]
    fn create_hook_only_acts_during_imports() {
        let registry = SchemaRegistry::builtin().unwrap();
        let settings = RestrictorSettings::default();
        let fixture = StoreFixture::new();
        let restrictor = Restrictor::new(&registry, &fixture.store, &settings);
        let master = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let item = ContentItem::new(ContentKind::Quiz).with_migration_id(fixture.migration_id(&master));

        assert!(restrictor
            .create_child_content_tag(&item, &OperationContext::new())
            .unwrap()
            .is_none());

        let migration = ImportMigration::new(fixture.subscription.clone());
        let ctx = OperationContext::importing(&migration);
        let created = restrictor.create_child_content_tag(&item, &ctx).unwrap().unwrap();
        let again = restrictor.create_child_content_tag(&item, &ctx).unwrap().unwrap();
        assert_eq!(created.id, again.id);
        assert_eq!(created.migration_id.as_deref(), item.migration_id());
        assert_eq!(created.subscription_id, fixture.subscription.id);
    }
}
