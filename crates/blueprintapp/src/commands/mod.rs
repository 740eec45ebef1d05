//! # Command Layer
//!
//! The operations behind the CLI, one submodule per command. Commands are
//! plain functions over a [`ContentTagStore`](crate::store::ContentTagStore)
//! and return a [`CmdResult`]; they never print, parse arguments or exit.
//!
//! ## Structured Returns
//!
//! [`CmdResult`] carries whatever records the command touched or listed plus
//! leveled messages. The UI decides how to render them; the CLI prints styled
//! text or, with `--json`, serializes the whole result.
//!
//! ## Testing Strategy
//!
//! Command tests use `InMemoryStore` through the store fixtures and assert on
//! `CmdResult` contents, including error paths.
//!
//! ## Command Modules
//!
//! - [`template`]: Create a course's blueprint template
//! - [`subscribe`]: Associate a child course with a template
//! - [`sync`]: Copy master content into a child course
//! - [`lock`]: Lock or unlock restriction categories on master content
//! - [`show`]: Show the restrictions on a blueprint item
//! - [`inspect`]: Show how a child copy is restricted
//! - [`edit`]: Save a child-side edit through the restrictor
//! - [`status`]: List downstream changes for a subscription
//! - [`preview`]: Dry-run what an import could not overwrite
//! - [`schema`]: List the restricted columns per content kind
//! - [`config`]: Show the resolved configuration
//! - [`helpers`]: Shared parsing and lookups

use crate::config::BlueprintConfig;
use crate::lifecycle::SaveReport;
use crate::model::RestrictionCategory;
use crate::restrictor::RestrictedColumnError;
use crate::summary::RestrictionSummary;
use crate::tags::{ChildContentTag, MasterContentTag, MasterTemplate, Subscription};
use serde::Serialize;
use std::collections::BTreeMap;

pub mod config;
pub mod edit;
pub mod helpers;
pub mod inspect;
pub mod lock;
pub mod preview;
pub mod schema;
pub mod show;
pub mod status;
pub mod subscribe;
pub mod sync;
pub mod template;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Restricted columns of one content kind, by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaListing {
    pub kind: String,
    pub columns: BTreeMap<RestrictionCategory, Vec<String>>,
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<MasterTemplate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subscriptions: Vec<Subscription>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub master_tags: Vec<MasterContentTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub child_tags: Vec<ChildContentTag>,
    /// Categories an import would be blocked from overwriting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<Vec<RestrictionCategory>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RestrictionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<SaveReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RestrictedColumnError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<SchemaListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<BlueprintConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_templates(mut self, templates: Vec<MasterTemplate>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_subscriptions(mut self, subscriptions: Vec<Subscription>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    pub fn with_master_tags(mut self, tags: Vec<MasterContentTag>) -> Self {
        self.master_tags = tags;
        self
    }

    pub fn with_child_tags(mut self, tags: Vec<ChildContentTag>) -> Self {
        self.child_tags = tags;
        self
    }

    pub fn with_config(mut self, config: BlueprintConfig) -> Self {
        self.config = Some(config);
        self
    }
}
