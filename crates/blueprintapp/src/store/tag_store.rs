use super::backend::StorageBackend;
use super::{ContentTagStore, DownstreamMerge};
use crate::error::Result;
use crate::model::{ContentKey, Restrictions};
use crate::tags::{ChildContentTag, MasterContentTag, MasterTemplate, Subscription};
use std::collections::BTreeSet;
use uuid::Uuid;

pub struct TagStore<B: StorageBackend> {
    /// The underlying storage backend.
    pub(crate) backend: B,
}

impl<B: StorageBackend> TagStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: StorageBackend> ContentTagStore for TagStore<B> {
    fn full_template_for(&self, course_id: &Uuid) -> Result<Option<MasterTemplate>> {
        let templates = self.backend.load_templates()?;
        Ok(templates.into_iter().find(|t| &t.course_id == course_id))
    }

    fn find_or_create_template(&self, course_id: &Uuid) -> Result<MasterTemplate> {
        if let Some(template) = self.full_template_for(course_id)? {
            return Ok(template);
        }
        self.backend.insert_template(MasterTemplate::new(*course_id))
    }

    fn template(&self, id: &Uuid) -> Result<Option<MasterTemplate>> {
        let templates = self.backend.load_templates()?;
        Ok(templates.into_iter().find(|t| &t.id == id))
    }

    fn find_or_create_subscription(
        &self,
        template: &MasterTemplate,
        child_course_id: &Uuid,
    ) -> Result<Subscription> {
        let candidate = Subscription::new(template, *child_course_id);
        if let Some(existing) = self
            .backend
            .load_subscriptions()?
            .into_iter()
            .find(|s| s.same_pairing(&candidate))
        {
            return Ok(existing);
        }
        self.backend.insert_subscription(candidate)
    }

    fn subscription(&self, id: &Uuid) -> Result<Option<Subscription>> {
        Ok(self
            .backend
            .load_subscriptions()?
            .into_iter()
            .find(|s| &s.id == id))
    }

    fn master_tag(&self, migration_id: &str) -> Result<Option<MasterContentTag>> {
        let ids = [migration_id.to_string()];
        Ok(self.backend.load_master_tags(Some(&ids))?.into_iter().next())
    }

    fn master_restrictions(
        &self,
        migration_ids: &[String],
        template_id: Option<&Uuid>,
    ) -> Result<Vec<(String, Restrictions)>> {
        if migration_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.backend.load_master_tags(Some(migration_ids))?;
        Ok(tags
            .into_iter()
            .filter(|tag| template_id.map_or(true, |id| &tag.master_template_id == id))
            .map(|tag| (tag.migration_id, tag.restrictions))
            .collect())
    }

    fn save_master_tag(&self, tag: &MasterContentTag) -> Result<()> {
        self.backend.upsert_master_tag(tag)
    }

    fn list_master_tags(&self, template_id: &Uuid) -> Result<Vec<MasterContentTag>> {
        let mut tags: Vec<_> = self
            .backend
            .load_master_tags(None)?
            .into_iter()
            .filter(|tag| &tag.master_template_id == template_id)
            .collect();
        tags.sort_by(|a, b| a.migration_id.cmp(&b.migration_id));
        Ok(tags)
    }

    fn child_tag(&self, content: &ContentKey) -> Result<Option<ChildContentTag>> {
        self.backend.load_child_tag(content)
    }

    fn find_or_create_child_tag(
        &self,
        subscription: &Subscription,
        content: &ContentKey,
        migration_id: Option<&str>,
    ) -> Result<ChildContentTag> {
        if let Some(tag) = self.backend.load_child_tag(content)? {
            return Ok(tag);
        }
        self.backend.insert_child_tag(ChildContentTag::new(
            subscription.id,
            *content,
            migration_id.map(str::to_string),
        ))
    }

    fn merge_downstream_changes(
        &self,
        content: &ContentKey,
        columns: &BTreeSet<String>,
    ) -> Result<DownstreamMerge> {
        let mut added = BTreeSet::new();
        let written = self.backend.update_child_tag(content, &mut |tag| {
            added = columns
                .difference(&tag.downstream_changes)
                .cloned()
                .collect();
            tag.downstream_changes.extend(added.iter().cloned());
            !added.is_empty()
        })?;
        Ok(match written {
            None => DownstreamMerge::Missing,
            Some(false) => DownstreamMerge::Unchanged,
            Some(true) => DownstreamMerge::Grew(added),
        })
    }

    fn remove_downstream_changes(
        &self,
        content: &ContentKey,
        columns: &BTreeSet<String>,
    ) -> Result<bool> {
        let written = self.backend.update_child_tag(content, &mut |tag| {
            let before = tag.downstream_changes.len();
            tag.downstream_changes.retain(|c| !columns.contains(c));
            tag.downstream_changes.len() != before
        })?;
        Ok(written.unwrap_or(false))
    }

    fn list_child_tags(&self, subscription_id: &Uuid) -> Result<Vec<ChildContentTag>> {
        let mut tags: Vec<_> = self
            .backend
            .load_child_tags()?
            .into_iter()
            .filter(|tag| &tag.subscription_id == subscription_id)
            .collect();
        tags.sort_by_key(|tag| tag.content);
        Ok(tags)
    }
}
