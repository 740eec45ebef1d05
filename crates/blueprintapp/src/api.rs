//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for UI
//! clients. It owns what commands borrow (the store, the schema registry and
//! the resolved settings), normalizes loose inputs such as `column=value`
//! assignments, and dispatches.
//!
//! It does no I/O and holds no business logic.
//!
//! ## Generic Over ContentTagStore
//!
//! - Production: `BlueprintApi<FileStore>`
//! - Testing: `BlueprintApi<InMemoryStore>`

use crate::commands;
use crate::commands::edit::EditRequest;
use crate::commands::helpers::parse_assignment;
use crate::config::{BlueprintConfig, RestrictorSettings};
use crate::error::Result;
use crate::model::{ContentKey, ContentKind, RestrictionCategory};
use crate::schema::SchemaRegistry;
use crate::store::ContentTagStore;
use uuid::Uuid;

pub struct BlueprintApi<S: ContentTagStore> {
    store: S,
    registry: SchemaRegistry,
    settings: RestrictorSettings,
    config: BlueprintConfig,
}

impl<S: ContentTagStore> BlueprintApi<S> {
    /// Builds the registry and settings from `config`; invalid kind or
    /// category names in it fail here.
    pub fn new(store: S, config: BlueprintConfig) -> Result<Self> {
        let registry = SchemaRegistry::from_config(&config)?;
        let settings = config.restrictor_settings()?;
        Ok(Self {
            store,
            registry,
            settings,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &RestrictorSettings {
        &self.settings
    }

    pub fn init_template(&self, course_id: &Uuid) -> Result<commands::CmdResult> {
        commands::template::init(&self.store, course_id)
    }

    pub fn subscribe(&self, master_course_id: &Uuid, child_course_id: &Uuid) -> Result<commands::CmdResult> {
        commands::subscribe::run(&self.store, master_course_id, child_course_id)
    }

    /// `assignments` are the blueprint's `column=value` strings to write
    /// over the copy.
    pub fn sync<I: AsRef<str>>(
        &self,
        subscription_id: &Uuid,
        master: ContentKey,
        assignments: &[I],
    ) -> Result<commands::CmdResult> {
        let assignments = assignments
            .iter()
            .map(|a| parse_assignment(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        commands::sync::run(
            &self.store,
            &self.registry,
            &self.settings,
            subscription_id,
            master,
            &assignments,
        )
    }

    pub fn lock(
        &self,
        course_id: &Uuid,
        content: ContentKey,
        categories: &[RestrictionCategory],
    ) -> Result<commands::CmdResult> {
        self.set_locks(course_id, content, categories, true)
    }

    pub fn unlock(
        &self,
        course_id: &Uuid,
        content: ContentKey,
        categories: &[RestrictionCategory],
    ) -> Result<commands::CmdResult> {
        self.set_locks(course_id, content, categories, false)
    }

    fn set_locks(
        &self,
        course_id: &Uuid,
        content: ContentKey,
        categories: &[RestrictionCategory],
        locked: bool,
    ) -> Result<commands::CmdResult> {
        commands::lock::run(
            &self.store,
            &self.registry,
            &self.settings.migration_id_prefix,
            course_id,
            content,
            categories,
            locked,
        )
    }

    pub fn show(&self, course_id: &Uuid, content: ContentKey) -> Result<commands::CmdResult> {
        commands::show::run(&self.store, &self.registry, &self.settings, course_id, content)
    }

    pub fn inspect(&self, content: ContentKey) -> Result<commands::CmdResult> {
        commands::inspect::run(&self.store, &self.registry, &self.settings, content)
    }

    /// `assignments` are `column=value` strings.
    pub fn edit<I: AsRef<str>>(
        &self,
        content: ContentKey,
        assignments: &[I],
        delete: bool,
        system: bool,
    ) -> Result<commands::CmdResult> {
        let assignments = assignments
            .iter()
            .map(|a| parse_assignment(a.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let request = EditRequest {
            assignments,
            delete,
            system,
        };
        commands::edit::run(&self.store, &self.registry, &self.settings, content, request)
    }

    pub fn status(&self, subscription_id: &Uuid) -> Result<commands::CmdResult> {
        commands::status::run(&self.store, subscription_id)
    }

    pub fn preview(&self, content: ContentKey) -> Result<commands::CmdResult> {
        commands::preview::run(&self.store, &self.registry, &self.settings, content)
    }

    pub fn schema(&self, kind: Option<ContentKind>) -> Result<commands::CmdResult> {
        commands::schema::run(&self.registry, kind)
    }

    pub fn config(&self) -> Result<commands::CmdResult> {
        commands::config::run(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BlueprintError, ConfigurationError};
    use crate::store::memory::InMemoryStore;
    use std::collections::HashMap;

    fn make_api() -> BlueprintApi<InMemoryStore> {
        BlueprintApi::new(InMemoryStore::new(), BlueprintConfig::default()).unwrap()
    }

    #[test]
    fn test_api_blueprint_flow() {
        let api = make_api();
        let master_course = Uuid::new_v4();
        let child_course = Uuid::new_v4();
        let page = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());

        api.init_template(&master_course).unwrap();
        let subscription = api
            .subscribe(&master_course, &child_course)
            .unwrap()
            .subscriptions
            .remove(0);
        let copy = api.sync(&subscription.id, page, &[] as &[&str]).unwrap().child_tags.remove(0);

        api.lock(&master_course, page, &[RestrictionCategory::Settings])
            .unwrap();
        let rejected = api
            .edit(copy.content, &["editing_roles=teachers"], false, false)
            .unwrap();
        assert!(rejected.rejected.is_some());

        let saved = api
            .edit(copy.content, &["title=Our week 1"], false, false)
            .unwrap();
        assert!(saved.save.is_some());

        let status = api.status(&subscription.id).unwrap();
        assert_eq!(status.child_tags.len(), 1);

        let preview = api.preview(copy.content).unwrap();
        assert_eq!(preview.blocked, Some(vec![RestrictionCategory::Content]));

        api.unlock(&master_course, page, &[RestrictionCategory::Settings])
            .unwrap();
        let shown = api.show(&master_course, page).unwrap();
        assert_eq!(
            shown.summary.unwrap().restricted_by_master_course,
            Some(false)
        );
    }

    #[test]
    fn test_api_edit_rejects_bad_assignment() {
        let api = make_api();
        let content = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        assert!(matches!(
            api.edit(content, &["title"], false, false),
            Err(BlueprintError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_api_new_validates_config() {
        let mut extra = HashMap::new();
        extra.insert(
            "quiz".to_string(),
            HashMap::from([("grading".to_string(), vec!["x".to_string()])]),
        );
        let config = BlueprintConfig {
            extra_columns: Some(extra),
            ..Default::default()
        };
        assert!(matches!(
            BlueprintApi::new(InMemoryStore::new(), config),
            Err(BlueprintError::Configuration(
                ConfigurationError::UnknownCategory(_)
            ))
        ));
    }

    #[test]
    fn test_api_schema_and_config() {
        let api = make_api();
        assert!(!api.schema(None).unwrap().schemas.is_empty());
        assert_eq!(
            api.config().unwrap().config.unwrap().migration_id_prefix,
            "mastercourse_"
        );
    }
}
