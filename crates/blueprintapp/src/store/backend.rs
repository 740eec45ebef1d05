use crate::error::Result;
use crate::model::ContentKey;
use crate::tags::{ChildContentTag, MasterContentTag, MasterTemplate, Subscription};

/// Abstract interface for raw tag persistence.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while TagStore handles the "what" (lookups, find-or-create, change merging).
///
/// All methods take `&self`: backends are shared between concurrent saves and
/// synchronize internally.
pub trait StorageBackend {
    // --- Templates ---

    fn load_templates(&self) -> Result<Vec<MasterTemplate>>;

    /// Insert `template` unless the course already has one.
    /// Returns whichever template is stored for the course afterwards.
    fn insert_template(&self, template: MasterTemplate) -> Result<MasterTemplate>;

    // --- Subscriptions ---

    fn load_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Insert `subscription` unless the child course already subscribes to
    /// the same template. Returns whichever subscription is stored afterwards.
    fn insert_subscription(&self, subscription: Subscription) -> Result<Subscription>;

    // --- Master tags ---

    /// Load master tags, optionally restricted to a set of migration ids.
    fn load_master_tags(&self, migration_ids: Option<&[String]>) -> Result<Vec<MasterContentTag>>;

    /// Insert or replace the tag with the same migration id.
    fn upsert_master_tag(&self, tag: &MasterContentTag) -> Result<()>;

    // --- Child tags ---

    fn load_child_tags(&self) -> Result<Vec<ChildContentTag>>;

    fn load_child_tag(&self, content: &ContentKey) -> Result<Option<ChildContentTag>>;

    /// Insert `tag` unless one already exists for its content.
    /// Returns whichever tag is stored afterwards.
    fn insert_child_tag(&self, tag: ChildContentTag) -> Result<ChildContentTag>;

    /// Row-locked read-modify-write of the child tag for `content`.
    ///
    /// `update` runs while the row is held exclusively and returns whether the
    /// tag changed; only then is it written back. Returns `None` when there is
    /// no tag for `content`, otherwise `Some(written)`.
    fn update_child_tag(
        &self,
        content: &ContentKey,
        update: &mut dyn FnMut(&mut ChildContentTag) -> bool,
    ) -> Result<Option<bool>>;
}
