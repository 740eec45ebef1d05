//! # Preloading
//!
//! Batch hydration of restriction caches before rendering or importing a list
//! of items. Each helper issues exactly one master tag lookup for the whole
//! batch, however many items it is given, and leaves every selected item with
//! a restriction map (empty when no tag exists).
//!
//! Lookups are plain reads: a concurrent writer can make the result stale but
//! never partial.

use crate::error::Result;
use crate::restrictor::Restrictable;
use crate::store::ContentTagStore;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Hydrates `child_content_restrictions` for child-course items.
///
/// Selects blueprint copies (migration id starting with `prefix`) whose cache
/// is empty, skipping containers. Items sharing a migration id all receive
/// the same restrictions. Returns the number of items hydrated.
pub fn preload_child_restrictions<'i, S, T, I>(store: &S, items: I, prefix: &str) -> Result<usize>
where
    S: ContentTagStore + ?Sized,
    T: Restrictable + ?Sized + 'i,
    I: IntoIterator<Item = &'i mut T>,
{
    let mut by_migration_id: HashMap<String, Vec<&'i mut T>> = HashMap::new();
    for item in items {
        if item.content_key().kind.skips_child_preload() || item.child_content_restrictions().is_some() {
            continue;
        }
        let Some(migration_id) = item.migration_id().filter(|id| id.starts_with(prefix)) else {
            continue;
        };
        by_migration_id
            .entry(migration_id.to_string())
            .or_default()
            .push(item);
    }
    if by_migration_id.is_empty() {
        return Ok(0);
    }

    let migration_ids: Vec<String> = by_migration_id.keys().cloned().collect();
    let found = store.master_restrictions(&migration_ids, None)?;

    let mut hydrated = 0;
    for group in by_migration_id.values_mut() {
        for item in group.iter_mut() {
            item.set_child_content_restrictions(Default::default());
            hydrated += 1;
        }
    }
    for (migration_id, restrictions) in found {
        if let Some(group) = by_migration_id.get_mut(&migration_id) {
            for item in group.iter_mut() {
                item.set_child_content_restrictions(restrictions.clone());
            }
        }
    }

    debug!(
        items = hydrated,
        migration_ids = migration_ids.len(),
        "preloaded child restrictions"
    );
    Ok(hydrated)
}

/// Hydrates `master_template_restrictions` for items in a blueprint course.
///
/// Uses the migration id each item's copies will carry, so items that were
/// never synced are covered too. Does nothing for a course without a
/// template. Returns the number of items hydrated.
pub fn preload_default_template_restrictions<'i, S, T, I>(
    store: &S,
    items: I,
    course_id: &Uuid,
    prefix: &str,
) -> Result<usize>
where
    S: ContentTagStore + ?Sized,
    T: Restrictable + ?Sized + 'i,
    I: IntoIterator<Item = &'i mut T>,
{
    let Some(template) = store.full_template_for(course_id)? else {
        return Ok(0);
    };

    let mut by_migration_id: HashMap<String, Vec<&'i mut T>> = HashMap::new();
    for item in items {
        let content = item.content_key();
        if !content.kind.allowed_in_blueprint() {
            continue;
        }
        by_migration_id
            .entry(template.migration_id_for(&content, prefix))
            .or_default()
            .push(item);
    }
    if by_migration_id.is_empty() {
        return Ok(0);
    }

    let migration_ids: Vec<String> = by_migration_id.keys().cloned().collect();
    let found = store.master_restrictions(&migration_ids, Some(&template.id))?;

    let mut hydrated = 0;
    for group in by_migration_id.values_mut() {
        for item in group.iter_mut() {
            item.set_master_template_restrictions(Default::default());
            hydrated += 1;
        }
    }
    for (migration_id, restrictions) in found {
        if let Some(group) = by_migration_id.get_mut(&migration_id) {
            for item in group.iter_mut() {
                item.set_master_template_restrictions(restrictions.clone());
            }
        }
    }

    debug!(
        template = %template.id,
        items = hydrated,
        "preloaded master template restrictions"
    );
    Ok(hydrated)
}
