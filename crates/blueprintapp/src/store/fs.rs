use super::fs_backend::FsBackend;
use super::tag_store::TagStore;
use std::path::PathBuf;

/// Tag store persisted as JSON tables under one data directory.
pub type FileStore = TagStore<FsBackend>;

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        TagStore::with_backend(FsBackend::new(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentKey, ContentKind, RestrictionCategory, Restrictions};
    use crate::store::{ContentTagStore, DownstreamMerge};
    use crate::tags::{MasterContentTag, Subscription};
    use std::collections::BTreeSet;
    use tempfile::tempdir;
    use uuid::Uuid;

    #[test]
    fn test_tables_survive_reopen() {
        let dir = tempdir().unwrap();
        let course = Uuid::new_v4();
        let content = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());

        let template = {
            let store = FileStore::new(dir.path().to_path_buf());
            let template = store.find_or_create_template(&course).unwrap();
            let mut tag = MasterContentTag::new(&template, content, "mastercourse_p".into());
            tag.restrictions = Restrictions::locking(&[RestrictionCategory::Content]);
            store.save_master_tag(&tag).unwrap();
            template
        };

        let store = FileStore::new(dir.path().to_path_buf());
        assert_eq!(store.full_template_for(&course).unwrap(), Some(template));
        let tag = store.master_tag("mastercourse_p").unwrap().unwrap();
        assert!(tag.restrictions.is_locked(RestrictionCategory::Content));
        assert!(dir.path().join("master_tags.json").exists());
    }

    #[test]
    fn test_missing_tables_read_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("not-yet-created"));
        assert!(store.full_template_for(&Uuid::new_v4()).unwrap().is_none());
        assert!(store.list_child_tags(&Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_migration_id() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let template = store.find_or_create_template(&Uuid::new_v4()).unwrap();
        let content = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());

        let mut tag = MasterContentTag::new(&template, content, "mastercourse_q".into());
        store.save_master_tag(&tag).unwrap();
        tag.restrictions.set(RestrictionCategory::Points, true);
        store.save_master_tag(&tag).unwrap();

        let tags = store.list_master_tags(&template.id).unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags[0].restrictions.is_locked(RestrictionCategory::Points));
    }

    #[test]
    fn test_downstream_merge_on_disk() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        let template = store.find_or_create_template(&Uuid::new_v4()).unwrap();
        let subscription = Subscription::new(&template, Uuid::new_v4());
        let content = ContentKey::new(ContentKind::Assignment, Uuid::new_v4());
        store
            .find_or_create_child_tag(&subscription, &content, Some("mastercourse_a"))
            .unwrap();

        let columns: BTreeSet<String> = ["due_at".to_string()].into();
        assert_eq!(
            store.merge_downstream_changes(&content, &columns).unwrap(),
            DownstreamMerge::Grew(columns.clone())
        );
        assert_eq!(
            store.merge_downstream_changes(&content, &columns).unwrap(),
            DownstreamMerge::Unchanged
        );

        let reopened = FileStore::new(dir.path().to_path_buf());
        let tag = reopened.child_tag(&content).unwrap().unwrap();
        assert_eq!(tag.downstream_changes, columns);
    }

    #[test]
    fn test_corrupt_table_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("templates.json"), "{not json").unwrap();
        let store = FileStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.full_template_for(&Uuid::new_v4()),
            Err(crate::error::BlueprintError::Serialization(_))
        ));
    }
}
