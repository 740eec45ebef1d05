use super::backend::StorageBackend;
use crate::error::{BlueprintError, Result};
use crate::model::ContentKey;
use crate::tags::{ChildContentTag, MasterContentTag, MasterTemplate, Subscription};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

type Row = Arc<Mutex<ChildContentTag>>;

/// In-memory storage backend.
///
/// Child tags live in individually locked rows so that concurrent saves of
/// different items never contend, while saves of the same item serialize on
/// that item's row.
#[derive(Default)]
pub struct MemBackend {
    templates: RwLock<Vec<MasterTemplate>>,
    subscriptions: RwLock<Vec<Subscription>>,
    master_tags: RwLock<HashMap<String, MasterContentTag>>,
    child_rows: RwLock<HashMap<ContentKey, Row>>,
    master_lookups: Mutex<Vec<Vec<String>>>,
    simulate_write_error: AtomicBool,
}

fn poisoned<T>(_: PoisonError<T>) -> BlueprintError {
    BlueprintError::Store("Lock poisoned".to_string())
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Migration ids requested by each batched master tag lookup, in order.
    pub fn master_lookups(&self) -> Vec<Vec<String>> {
        self.master_lookups
            .lock()
            .map(|lookups| lookups.clone())
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(BlueprintError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn row(&self, content: &ContentKey) -> Result<Option<Row>> {
        let rows = self.child_rows.read().map_err(poisoned)?;
        Ok(rows.get(content).cloned())
    }

    fn lock_row(row: &Row) -> Result<MutexGuard<'_, ChildContentTag>> {
        row.lock().map_err(poisoned)
    }
}

impl StorageBackend for MemBackend {
    fn load_templates(&self) -> Result<Vec<MasterTemplate>> {
        Ok(self.templates.read().map_err(poisoned)?.clone())
    }

    fn insert_template(&self, template: MasterTemplate) -> Result<MasterTemplate> {
        self.check_writable()?;
        let mut templates = self.templates.write().map_err(poisoned)?;
        if let Some(existing) = templates.iter().find(|t| t.course_id == template.course_id) {
            return Ok(existing.clone());
        }
        templates.push(template.clone());
        Ok(template)
    }

    fn load_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.read().map_err(poisoned)?.clone())
    }

    fn insert_subscription(&self, subscription: Subscription) -> Result<Subscription> {
        self.check_writable()?;
        let mut subscriptions = self.subscriptions.write().map_err(poisoned)?;
        if let Some(existing) = subscriptions.iter().find(|s| s.same_pairing(&subscription)) {
            return Ok(existing.clone());
        }
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    fn load_master_tags(&self, migration_ids: Option<&[String]>) -> Result<Vec<MasterContentTag>> {
        let tags = self.master_tags.read().map_err(poisoned)?;
        match migration_ids {
            None => Ok(tags.values().cloned().collect()),
            Some(ids) => {
                self.master_lookups
                    .lock()
                    .map_err(poisoned)?
                    .push(ids.to_vec());
                Ok(ids.iter().filter_map(|id| tags.get(id)).cloned().collect())
            }
        }
    }

    fn upsert_master_tag(&self, tag: &MasterContentTag) -> Result<()> {
        self.check_writable()?;
        let mut tags = self.master_tags.write().map_err(poisoned)?;
        tags.insert(tag.migration_id.clone(), tag.clone());
        Ok(())
    }

    fn load_child_tags(&self) -> Result<Vec<ChildContentTag>> {
        let rows: Vec<Row> = self
            .child_rows
            .read()
            .map_err(poisoned)?
            .values()
            .cloned()
            .collect();
        rows.iter()
            .map(|row| Self::lock_row(row).map(|tag| tag.clone()))
            .collect()
    }

    fn load_child_tag(&self, content: &ContentKey) -> Result<Option<ChildContentTag>> {
        let Some(row) = self.row(content)? else {
            return Ok(None);
        };
        let tag = Self::lock_row(&row)?.clone();
        Ok(Some(tag))
    }

    fn insert_child_tag(&self, tag: ChildContentTag) -> Result<ChildContentTag> {
        self.check_writable()?;
        let row = {
            let mut rows = self.child_rows.write().map_err(poisoned)?;
            rows.entry(tag.content)
                .or_insert_with(|| Arc::new(Mutex::new(tag)))
                .clone()
        };
        let stored = Self::lock_row(&row)?.clone();
        Ok(stored)
    }

    fn update_child_tag(
        &self,
        content: &ContentKey,
        update: &mut dyn FnMut(&mut ChildContentTag) -> bool,
    ) -> Result<Option<bool>> {
        let Some(row) = self.row(content)? else {
            return Ok(None);
        };
        let mut locked = Self::lock_row(&row)?;

        // Work on a copy so a failed write leaves the row untouched.
        let mut working = locked.clone();
        if !update(&mut working) {
            return Ok(Some(false));
        }
        self.check_writable()?;
        working.updated_at = Utc::now();
        *locked = working;
        Ok(Some(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentKind;
    use uuid::Uuid;

    fn page() -> ContentKey {
        ContentKey::new(ContentKind::WikiPage, Uuid::new_v4())
    }

    #[test]
    fn insert_child_tag_keeps_existing_row() {
        let backend = MemBackend::new();
        let content = page();
        let first = backend
            .insert_child_tag(ChildContentTag::new(Uuid::new_v4(), content, None))
            .unwrap();
        let second = backend
            .insert_child_tag(ChildContentTag::new(Uuid::new_v4(), content, None))
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(backend.load_child_tags().unwrap().len(), 1);
    }

    #[test]
    fn update_missing_row_returns_none() {
        let backend = MemBackend::new();
        let result = backend.update_child_tag(&page(), &mut |_| true).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn failed_write_leaves_row_untouched() {
        let backend = MemBackend::new();
        let content = page();
        backend
            .insert_child_tag(ChildContentTag::new(Uuid::new_v4(), content, None))
            .unwrap();

        backend.set_simulate_write_error(true);
        let result = backend.update_child_tag(&content, &mut |tag| {
            tag.downstream_changes.insert("title".into())
        });
        assert!(result.is_err());

        backend.set_simulate_write_error(false);
        let tag = backend.load_child_tag(&content).unwrap().unwrap();
        assert!(tag.downstream_changes.is_empty());
    }

    #[test]
    fn unchanged_update_is_not_written() {
        let backend = MemBackend::new();
        let content = page();
        let before = backend
            .insert_child_tag(ChildContentTag::new(Uuid::new_v4(), content, None))
            .unwrap();
        let result = backend.update_child_tag(&content, &mut |_| false).unwrap();
        assert_eq!(result, Some(false));
        let after = backend.load_child_tag(&content).unwrap().unwrap();
        assert_eq!(after.updated_at, before.updated_at);
    }

    #[test]
    fn batched_master_lookups_are_recorded() {
        let backend = MemBackend::new();
        backend
            .load_master_tags(Some(&["a".to_string(), "b".to_string()][..]))
            .unwrap();
        backend.load_master_tags(None).unwrap();
        assert_eq!(
            backend.master_lookups(),
            vec![vec!["a".to_string(), "b".to_string()]]
        );
    }
}
