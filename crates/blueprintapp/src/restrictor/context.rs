use crate::error::Result;
use crate::model::Restrictions;
use crate::store::ContentTagStore;
use crate::tags::{ChildContentTag, Subscription};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Per-save context handed to every engine call.
///
/// Whether a save is part of a blueprint import, or a system edit that must
/// not be tracked, is a property of the operation and never of the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationContext<'a> {
    pub import: Option<&'a ImportMigration>,
    pub skip_downstream_changes: bool,
}

impl<'a> OperationContext<'a> {
    /// An ordinary user edit.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn importing(migration: &'a ImportMigration) -> Self {
        Self {
            import: Some(migration),
            skip_downstream_changes: false,
        }
    }

    /// Programmatic edits that bypass restriction checks and are not
    /// recorded as downstream changes.
    pub fn skipping_downstream_changes(mut self) -> Self {
        self.skip_downstream_changes = true;
        self
    }

    pub fn is_importing(&self) -> bool {
        self.import.is_some()
    }
}

/// A blueprint sync into one child course.
///
/// Carries the subscription being synced, the template's restrictions keyed
/// by migration id (loaded once per import rather than per item), and the
/// child tags of items the import could only partly apply.
#[derive(Debug)]
pub struct ImportMigration {
    subscription: Subscription,
    template_restrictions: HashMap<String, Restrictions>,
    skipped: Mutex<Vec<ChildContentTag>>,
}

impl ImportMigration {
    pub fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            template_restrictions: HashMap::new(),
            skipped: Mutex::new(Vec::new()),
        }
    }

    /// Starts an import with every master tag of the subscription's template
    /// preloaded.
    pub fn load<S: ContentTagStore + ?Sized>(store: &S, subscription: Subscription) -> Result<Self> {
        let template_restrictions = store
            .list_master_tags(&subscription.master_template_id)?
            .into_iter()
            .map(|tag| (tag.migration_id, tag.restrictions))
            .collect();
        Ok(Self {
            template_restrictions,
            ..Self::new(subscription)
        })
    }

    pub fn with_restrictions(mut self, migration_id: impl Into<String>, restrictions: Restrictions) -> Self {
        self.template_restrictions
            .insert(migration_id.into(), restrictions);
        self
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn find_preloaded_restriction(&self, migration_id: &str) -> Option<&Restrictions> {
        self.template_restrictions.get(migration_id)
    }

    /// Records an item whose incoming changes were partly discarded.
    pub fn add_skipped_item(&self, tag: ChildContentTag) {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tag);
    }

    pub fn skipped_items(&self) -> Vec<ChildContentTag> {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentKey, ContentKind, RestrictionCategory};
    use crate::store::memory::fixtures::StoreFixture;
    use uuid::Uuid;

    #[test]
    fn default_context_is_a_user_edit() {
        let ctx = OperationContext::new();
        assert!(!ctx.is_importing());
        assert!(!ctx.skip_downstream_changes);
        assert!(ctx.skipping_downstream_changes().skip_downstream_changes);
    }

    #[test]
    fn load_preloads_template_restrictions() {
        let master = ContentKey::new(ContentKind::Assignment, Uuid::new_v4());
        let fixture = StoreFixture::new().with_master_item(master, &[RestrictionCategory::DueDates]);

        let migration = ImportMigration::load(&fixture.store, fixture.subscription.clone()).unwrap();
        let restrictions = migration
            .find_preloaded_restriction(&fixture.migration_id(&master))
            .unwrap();
        assert!(restrictions.is_locked(RestrictionCategory::DueDates));
        assert!(migration.find_preloaded_restriction("mastercourse_unknown").is_none());
    }

    #[test]
    fn skipped_items_accumulate() {
        let fixture = StoreFixture::new();
        let migration = ImportMigration::new(fixture.subscription.clone());
        let tag = ChildContentTag::new(
            fixture.subscription.id,
            ContentKey::new(ContentKind::WikiPage, Uuid::new_v4()),
            None,
        );
        migration.add_skipped_item(tag.clone());
        assert_eq!(migration.skipped_items(), vec![tag]);
    }
}
