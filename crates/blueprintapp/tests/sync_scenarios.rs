use blueprintapp::api::BlueprintApi;
use blueprintapp::config::{BlueprintConfig, RestrictorSettings};
use blueprintapp::lifecycle::{Lifecycle, SaveOutcome};
use blueprintapp::model::{Change, ChangeSet, ContentKey, ContentKind, RestrictionCategory, Restrictions};
use blueprintapp::restrictor::{
    ImportMigration, ImportReconciliation, OperationContext, Restrictable, Restrictor,
};
use blueprintapp::schema::SchemaRegistry;
use blueprintapp::store::fs::FileStore;
use blueprintapp::store::ContentTagStore;
use blueprintapp::tags::Subscription;
use blueprintapp::test_utils::TestEnv;
use serde_json::Value;
use uuid::Uuid;

struct Blueprint {
    api: BlueprintApi<FileStore>,
    master_course: Uuid,
    subscription: Subscription,
    _env: tempfile::TempDir,
}

fn blueprint() -> Blueprint {
    let TestEnv { _temp_dir, store, .. } = TestEnv::new();
    let api = BlueprintApi::new(store, BlueprintConfig::default()).unwrap();
    let master_course = Uuid::new_v4();
    api.init_template(&master_course).unwrap();
    let subscription = api
        .subscribe(&master_course, &Uuid::new_v4())
        .unwrap()
        .subscriptions
        .remove(0);
    Blueprint {
        api,
        master_course,
        subscription,
        _env: _temp_dir,
    }
}

#[test]
fn child_edits_survive_until_the_blueprint_locks_them() {
    let bp = blueprint();
    let quiz = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
    let copy = bp
        .api
        .sync(&bp.subscription.id, quiz, &[] as &[&str])
        .unwrap()
        .child_tags
        .remove(0)
        .content;

    let edited = bp
        .api
        .edit(copy, &["time_limit=45", "title=Quiz 1 (section B)"], false, false)
        .unwrap();
    assert!(edited.rejected.is_none());

    let preview = bp.api.preview(copy).unwrap();
    assert_eq!(
        preview.blocked,
        Some(vec![RestrictionCategory::Content, RestrictionCategory::Settings])
    );

    bp.api
        .lock(&bp.master_course, quiz, &[RestrictionCategory::Content])
        .unwrap();
    let preview = bp.api.preview(copy).unwrap();
    assert_eq!(preview.blocked, Some(vec![RestrictionCategory::Settings]));

    let rejected = bp
        .api
        .edit(copy, &["title=Quiz 1 (again)"], false, false)
        .unwrap();
    assert_eq!(rejected.rejected.unwrap().columns, vec!["title".to_string()]);

    let inspected = bp.api.inspect(copy).unwrap().summary.unwrap();
    assert_eq!(inspected.restricted_by_master_course, Some(true));
}

#[test]
fn resync_preserves_child_title_until_content_is_locked() {
    let bp = blueprint();
    let page = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
    let copy = bp
        .api
        .sync(&bp.subscription.id, page, &[] as &[&str])
        .unwrap()
        .child_tags
        .remove(0)
        .content;
    bp.api
        .edit(copy, &["title=Week 1 (ours)"], false, false)
        .unwrap();

    let resynced = bp
        .api
        .sync(&bp.subscription.id, page, &["title=Week 1"])
        .unwrap();
    assert_eq!(
        resynced.save.unwrap().reconciliation,
        ImportReconciliation::FullyPreserved
    );
    assert!(resynced.child_tags[0].downstream_changes.contains("title"));

    bp.api
        .lock(&bp.master_course, page, &[RestrictionCategory::Content])
        .unwrap();
    let resynced = bp
        .api
        .sync(&bp.subscription.id, page, &["title=Week 1"])
        .unwrap();
    assert!(matches!(
        resynced.save.unwrap().reconciliation,
        ImportReconciliation::PartiallyOverwritten { .. }
    ));
    assert!(resynced.child_tags[0].downstream_changes.is_empty());
}

#[test]
fn status_survives_a_restart() {
    let TestEnv { _temp_dir, store, root } = TestEnv::new();
    let api = BlueprintApi::new(store, BlueprintConfig::default()).unwrap();
    let master_course = Uuid::new_v4();
    api.init_template(&master_course).unwrap();
    let subscription = api
        .subscribe(&master_course, &Uuid::new_v4())
        .unwrap()
        .subscriptions
        .remove(0);
    let page = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
    let copy = api.sync(&subscription.id, page, &[] as &[&str]).unwrap().child_tags.remove(0);
    api.edit(copy.content, &["body=<p>ours</p>"], false, false)
        .unwrap();
    drop(api);

    let api = BlueprintApi::new(FileStore::new(root), BlueprintConfig::default()).unwrap();
    let status = api.status(&subscription.id).unwrap();
    assert_eq!(status.child_tags.len(), 1);
    assert!(status.child_tags[0].downstream_changes.contains("body"));
}

/// A host model with typed fields rather than an attribute bag.
struct Event {
    key: ContentKey,
    migration_id: Option<String>,
    title: String,
    location_name: String,
    pending: ChangeSet,
    saved: ChangeSet,
    restrictions: Option<Restrictions>,
    master_restrictions: Option<Restrictions>,
}

impl Event {
    fn synced(migration_id: String) -> Self {
        Self {
            key: ContentKey::new(ContentKind::CalendarEvent, Uuid::new_v4()),
            migration_id: Some(migration_id),
            title: "Lab".to_string(),
            location_name: "Room 101".to_string(),
            pending: ChangeSet::new(),
            saved: ChangeSet::new(),
            restrictions: None,
            master_restrictions: None,
        }
    }

    fn set_location(&mut self, value: &str) {
        self.pending.insert(
            "location_name".to_string(),
            Change::new(self.location_name.clone(), value),
        );
        self.location_name = value.to_string();
    }

    fn set_title(&mut self, value: &str) {
        self.pending
            .insert("title".to_string(), Change::new(self.title.clone(), value));
        self.title = value.to_string();
    }
}

impl Restrictable for Event {
    fn content_key(&self) -> ContentKey {
        self.key
    }

    fn migration_id(&self) -> Option<&str> {
        self.migration_id.as_deref()
    }

    fn is_new_record(&self) -> bool {
        false
    }

    fn pending_changes(&self) -> &ChangeSet {
        &self.pending
    }

    fn saved_changes(&self) -> &ChangeSet {
        &self.saved
    }

    fn restore_attributes(&mut self, columns: &[String]) {
        for column in columns {
            let Some(change) = self.pending.remove(column) else {
                continue;
            };
            let old = match change.old {
                Value::String(s) => s,
                other => other.to_string(),
            };
            match column.as_str() {
                "title" => self.title = old,
                "location_name" => self.location_name = old,
                _ => {}
            }
        }
    }

    fn changes_applied(&mut self) {
        self.saved = std::mem::take(&mut self.pending);
    }

    fn child_content_restrictions(&self) -> Option<&Restrictions> {
        self.restrictions.as_ref()
    }

    fn set_child_content_restrictions(&mut self, restrictions: Restrictions) {
        self.restrictions = Some(restrictions);
    }

    fn master_template_restrictions(&self) -> Option<&Restrictions> {
        self.master_restrictions.as_ref()
    }

    fn set_master_template_restrictions(&mut self, restrictions: Restrictions) {
        self.master_restrictions = Some(restrictions);
    }
}

#[test]
fn host_models_plug_into_the_lifecycle() {
    let env = TestEnv::new();
    let registry = SchemaRegistry::builtin().unwrap();
    let settings = RestrictorSettings::default();
    let template = env.store.find_or_create_template(&Uuid::new_v4()).unwrap();
    let subscription = env
        .store
        .find_or_create_subscription(&template, &Uuid::new_v4())
        .unwrap();
    let master = ContentKey::new(ContentKind::CalendarEvent, Uuid::new_v4());
    let migration_id = template.migration_id_for(&master, &settings.migration_id_prefix);

    let mut event = Event::synced(migration_id);
    env.store
        .find_or_create_child_tag(&subscription, &event.key, event.migration_id.as_deref())
        .unwrap();
    let lifecycle = Lifecycle::new(Restrictor::new(&registry, &env.store, &settings));

    event.set_location("Room 202");
    let outcome = lifecycle
        .save(&mut event, &OperationContext::new(), |_| Ok(()))
        .unwrap();
    assert!(outcome.is_saved());

    // The next sync brings both a new title and the blueprint's location.
    let migration = ImportMigration::load(&env.store, subscription).unwrap();
    event.set_title("Lab (updated)");
    event.set_location("Room 101");
    let outcome = lifecycle
        .save(&mut event, &OperationContext::importing(&migration), |_| Ok(()))
        .unwrap();

    let SaveOutcome::Saved(report) = outcome else {
        panic!("expected the sync to be saved");
    };
    assert_eq!(report.reconciliation, ImportReconciliation::FullyPreserved);
    assert_eq!(event.title, "Lab (updated)");
    assert_eq!(event.location_name, "Room 202");
    assert_eq!(migration.skipped_items().len(), 1);
}
