use super::backend::StorageBackend;
use crate::error::{BlueprintError, Result};
use crate::model::ContentKey;
use crate::tags::{ChildContentTag, MasterContentTag, MasterTemplate, Subscription};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const TEMPLATES_FILE: &str = "templates.json";
const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";
const MASTER_TAGS_FILE: &str = "master_tags.json";
const CHILD_TAGS_FILE: &str = "child_tags.json";
const LOCK_FILE: &str = ".lock";

/// JSON-file storage backend.
///
/// Each table is one JSON array in the data directory. Writes go to a temp
/// file that is renamed into place, so readers never see a partial table.
/// Read-modify-write sequences hold an exclusive advisory lock on `.lock` in
/// the data directory, so writers in other processes and other handles on
/// the same directory are serialized too. That makes the child tag row lock a
/// directory lock here.
pub struct FsBackend {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(BlueprintError::Io)?;
        }
        Ok(())
    }

    fn read_table<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.root.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).map_err(BlueprintError::Io)?;
        let rows: Vec<T> = serde_json::from_str(&content).map_err(BlueprintError::Serialization)?;
        Ok(rows)
    }

    fn write_table<T: Serialize>(&self, file: &str, rows: &[T]) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(rows).map_err(BlueprintError::Serialization)?;

        let tmp_file = self.root.join(format!(".{}-{}.tmp", file, Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(BlueprintError::Io)?;
        fs::rename(&tmp_file, self.root.join(file)).map_err(BlueprintError::Io)?;
        Ok(())
    }

    fn lock(&self) -> Result<WriteLock<'_>> {
        let guard = self
            .write_lock
            .lock()
            .map_err(|_| BlueprintError::Store("Write lock poisoned".to_string()))?;
        self.ensure_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.root.join(LOCK_FILE))
            .map_err(BlueprintError::Io)?;
        file.lock().map_err(BlueprintError::Io)?;
        Ok(WriteLock {
            _file: file,
            _guard: guard,
        })
    }
}

/// Held for one read-modify-write. Closing the file releases the
/// advisory lock.
struct WriteLock<'a> {
    _file: File,
    _guard: MutexGuard<'a, ()>,
}

impl StorageBackend for FsBackend {
    fn load_templates(&self) -> Result<Vec<MasterTemplate>> {
        self.read_table(TEMPLATES_FILE)
    }

    fn insert_template(&self, template: MasterTemplate) -> Result<MasterTemplate> {
        let _guard = self.lock()?;
        let mut templates: Vec<MasterTemplate> = self.read_table(TEMPLATES_FILE)?;
        if let Some(existing) = templates.iter().find(|t| t.course_id == template.course_id) {
            return Ok(existing.clone());
        }
        templates.push(template.clone());
        self.write_table(TEMPLATES_FILE, &templates)?;
        Ok(template)
    }

    fn load_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.read_table(SUBSCRIPTIONS_FILE)
    }

    fn insert_subscription(&self, subscription: Subscription) -> Result<Subscription> {
        let _guard = self.lock()?;
        let mut subscriptions: Vec<Subscription> = self.read_table(SUBSCRIPTIONS_FILE)?;
        if let Some(existing) = subscriptions.iter().find(|s| s.same_pairing(&subscription)) {
            return Ok(existing.clone());
        }
        subscriptions.push(subscription.clone());
        self.write_table(SUBSCRIPTIONS_FILE, &subscriptions)?;
        Ok(subscription)
    }

    fn load_master_tags(&self, migration_ids: Option<&[String]>) -> Result<Vec<MasterContentTag>> {
        let tags: Vec<MasterContentTag> = self.read_table(MASTER_TAGS_FILE)?;
        Ok(match migration_ids {
            None => tags,
            Some(ids) => tags
                .into_iter()
                .filter(|tag| ids.contains(&tag.migration_id))
                .collect(),
        })
    }

    fn upsert_master_tag(&self, tag: &MasterContentTag) -> Result<()> {
        let _guard = self.lock()?;
        let mut tags: Vec<MasterContentTag> = self.read_table(MASTER_TAGS_FILE)?;
        match tags.iter_mut().find(|t| t.migration_id == tag.migration_id) {
            Some(existing) => *existing = tag.clone(),
            None => tags.push(tag.clone()),
        }
        self.write_table(MASTER_TAGS_FILE, &tags)
    }

    fn load_child_tags(&self) -> Result<Vec<ChildContentTag>> {
        self.read_table(CHILD_TAGS_FILE)
    }

    fn load_child_tag(&self, content: &ContentKey) -> Result<Option<ChildContentTag>> {
        let tags: Vec<ChildContentTag> = self.read_table(CHILD_TAGS_FILE)?;
        Ok(tags.into_iter().find(|tag| &tag.content == content))
    }

    fn insert_child_tag(&self, tag: ChildContentTag) -> Result<ChildContentTag> {
        let _guard = self.lock()?;
        let mut tags: Vec<ChildContentTag> = self.read_table(CHILD_TAGS_FILE)?;
        if let Some(existing) = tags.iter().find(|t| t.content == tag.content) {
            return Ok(existing.clone());
        }
        tags.push(tag.clone());
        self.write_table(CHILD_TAGS_FILE, &tags)?;
        Ok(tag)
    }

    fn update_child_tag(
        &self,
        content: &ContentKey,
        update: &mut dyn FnMut(&mut ChildContentTag) -> bool,
    ) -> Result<Option<bool>> {
        let _guard = self.lock()?;
        let mut tags: Vec<ChildContentTag> = self.read_table(CHILD_TAGS_FILE)?;
        let Some(tag) = tags.iter_mut().find(|t| &t.content == content) else {
            return Ok(None);
        };
        if !update(tag) {
            return Ok(Some(false));
        }
        tag.updated_at = Utc::now();
        self.write_table(CHILD_TAGS_FILE, &tags)?;
        Ok(Some(true))
    }
}
