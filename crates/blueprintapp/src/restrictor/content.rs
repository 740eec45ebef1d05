//! The capability interface content types implement to take part in
//! blueprint restrictions, and a generic record that implements it.

use crate::model::{Change, ChangeSet, ContentKey, ContentKind, Restrictions};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Value of the state attribute for soft-deleted records.
pub const DELETED_STATE: &str = "deleted";

/// A persisted record whose attributes can be locked by a blueprint.
///
/// Implementors expose their dirty tracking (the change set being saved and
/// the one that was just saved) and two restriction caches the engine and
/// the preloading helpers fill in.
pub trait Restrictable {
    fn content_key(&self) -> ContentKey;

    fn migration_id(&self) -> Option<&str>;

    fn is_new_record(&self) -> bool;

    /// Changes made since the last save, not yet persisted.
    fn pending_changes(&self) -> &ChangeSet;

    /// Changes written by the most recent successful save.
    fn saved_changes(&self) -> &ChangeSet;

    /// Reverts the given attributes to their pre-write values and drops them
    /// from the pending change set.
    fn restore_attributes(&mut self, columns: &[String]);

    /// Moves pending changes into saved changes after a successful write.
    fn changes_applied(&mut self);

    fn child_content_restrictions(&self) -> Option<&Restrictions>;

    fn set_child_content_restrictions(&mut self, restrictions: Restrictions);

    fn master_template_restrictions(&self) -> Option<&Restrictions>;

    fn set_master_template_restrictions(&mut self, restrictions: Restrictions);

    fn state_attribute(&self) -> &'static str {
        self.content_key().kind.state_attribute()
    }

    /// The content whose child tag records this item's downstream changes.
    fn tag_owner(&self) -> ContentKey {
        self.content_key()
    }
}

/// Generic attribute-bag record with dirty tracking.
#[derive(Debug, Clone)]
pub struct ContentItem {
    key: ContentKey,
    migration_id: Option<String>,
    attributes: BTreeMap<String, Value>,
    new_record: bool,
    pending: ChangeSet,
    saved: ChangeSet,
    owner: Option<ContentKey>,
    child_restrictions: Option<Restrictions>,
    master_restrictions: Option<Restrictions>,
}

impl ContentItem {
    /// A record that has not been saved yet.
    pub fn new(kind: ContentKind) -> Self {
        Self::build(ContentKey::new(kind, Uuid::new_v4()), BTreeMap::new(), true)
    }

    /// A record loaded from storage with the given attributes.
    pub fn persisted(key: ContentKey, attributes: BTreeMap<String, Value>) -> Self {
        Self::build(key, attributes, false)
    }

    fn build(key: ContentKey, attributes: BTreeMap<String, Value>, new_record: bool) -> Self {
        Self {
            key,
            migration_id: None,
            attributes,
            new_record,
            pending: ChangeSet::new(),
            saved: ChangeSet::new(),
            owner: None,
            child_restrictions: None,
            master_restrictions: None,
        }
    }

    pub fn with_migration_id(mut self, migration_id: impl Into<String>) -> Self {
        self.migration_id = Some(migration_id.into());
        self
    }

    /// Records downstream changes against `owner` instead of this item, e.g.
    /// an assignment backing a graded discussion.
    pub fn with_tag_owner(mut self, owner: ContentKey) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn set_migration_id(&mut self, migration_id: Option<String>) {
        self.migration_id = migration_id;
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Assigns an attribute, tracking the change against the value it had at
    /// the last save. Setting it back to that value clears the change.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) {
        let value = value.into();
        let current = self.attributes.get(attribute).cloned().unwrap_or(Value::Null);
        if current == value {
            return;
        }
        let original = match self.pending.get(attribute) {
            Some(change) => change.old.clone(),
            None => current,
        };
        if original == value {
            self.pending.remove(attribute);
        } else {
            self.pending
                .insert(attribute.to_string(), Change::new(original, value.clone()));
        }
        self.attributes.insert(attribute.to_string(), value);
    }

    /// Soft-deletes the record through its state attribute.
    pub fn mark_deleted(&mut self) {
        let state = self.state_attribute();
        self.set(state, DELETED_STATE);
    }

    pub fn is_deleted(&self) -> bool {
        self.get(self.state_attribute()) == Some(&Value::from(DELETED_STATE))
    }
}

impl Restrictable for ContentItem {
    fn content_key(&self) -> ContentKey {
        self.key
    }

    fn migration_id(&self) -> Option<&str> {
        self.migration_id.as_deref()
    }

    fn is_new_record(&self) -> bool {
        self.new_record
    }

    fn pending_changes(&self) -> &ChangeSet {
        &self.pending
    }

    fn saved_changes(&self) -> &ChangeSet {
        &self.saved
    }

    fn restore_attributes(&mut self, columns: &[String]) {
        for column in columns {
            if let Some(change) = self.pending.remove(column) {
                if change.old.is_null() {
                    self.attributes.remove(column);
                } else {
                    self.attributes.insert(column.clone(), change.old);
                }
            }
        }
    }

    fn changes_applied(&mut self) {
        self.saved = std::mem::take(&mut self.pending);
        self.new_record = false;
    }

    fn child_content_restrictions(&self) -> Option<&Restrictions> {
        self.child_restrictions.as_ref()
    }

    fn set_child_content_restrictions(&mut self, restrictions: Restrictions) {
        self.child_restrictions = Some(restrictions);
    }

    fn master_template_restrictions(&self) -> Option<&Restrictions> {
        self.master_restrictions.as_ref()
    }

    fn set_master_template_restrictions(&mut self, restrictions: Restrictions) {
        self.master_restrictions = Some(restrictions);
    }

    fn tag_owner(&self) -> ContentKey {
        self.owner.unwrap_or(self.key)
    }
}
