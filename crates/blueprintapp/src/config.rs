//! # Configuration
//!
//! Blueprint configuration is managed by [`clapfig`], which handles layered loading
//! from TOML files, environment variables, and programmatic overrides.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `BLUEPRINT__MIGRATION_ID_PREFIX`, etc.
//! 2. **Data directory config**: `<data>/blueprint.toml`.
//! 3. **Compiled defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `migration_id_prefix` | `mastercourse_` | Marks an item as an imported blueprint copy |
//! | `restriction_exempt_kinds` | none | Kinds whose locked columns are never enforced |
//! | `extra_columns` | none | `kind -> category -> [column]` added to the built-in schema |
//!
//! ```toml
//! migration_id_prefix = "mastercourse_"
//! restriction_exempt_kinds = ["line_item"]
//!
//! [extra_columns.wiki_page]
//! content = ["url"]
//! ```

use crate::error::Result;
use crate::model::ContentKind;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_MIGRATION_ID_PREFIX: &str = "mastercourse_";

/// Configuration for blueprint restriction handling, stored in `blueprint.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlueprintConfig {
    /// Prefix of the migration id carried by content copied from a blueprint.
    #[config(default = "mastercourse_")]
    pub migration_id_prefix: String,

    /// Content kinds whose locked columns are not enforced on save.
    /// Downstream changes are still tracked for them. When absent, none are exempt.
    pub restriction_exempt_kinds: Option<Vec<String>>,

    /// Extra restricted columns, keyed by content kind then category.
    pub extra_columns: Option<HashMap<String, HashMap<String, Vec<String>>>>,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            migration_id_prefix: DEFAULT_MIGRATION_ID_PREFIX.to_string(),
            restriction_exempt_kinds: None,
            extra_columns: None,
        }
    }
}

impl BlueprintConfig {
    /// Resolve the engine settings, validating kind names.
    pub fn restrictor_settings(&self) -> Result<RestrictorSettings> {
        let exempt_kinds = self
            .restriction_exempt_kinds
            .iter()
            .flatten()
            .map(|name| name.parse::<ContentKind>())
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(RestrictorSettings {
            migration_id_prefix: self.migration_id_prefix.clone(),
            exempt_kinds,
        })
    }
}

/// The resolved, typed subset of configuration the engine reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictorSettings {
    pub migration_id_prefix: String,
    pub exempt_kinds: BTreeSet<ContentKind>,
}

impl Default for RestrictorSettings {
    fn default() -> Self {
        Self {
            migration_id_prefix: DEFAULT_MIGRATION_ID_PREFIX.to_string(),
            exempt_kinds: BTreeSet::new(),
        }
    }
}

impl RestrictorSettings {
    pub fn with_exempt_kind(mut self, kind: ContentKind) -> Self {
        self.exempt_kinds.insert(kind);
        self
    }

    pub fn is_exempt(&self, kind: ContentKind) -> bool {
        self.exempt_kinds.contains(&kind)
    }
}
