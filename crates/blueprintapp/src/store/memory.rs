use super::mem_backend::MemBackend;
use super::tag_store::TagStore;

pub type InMemoryStore = TagStore<MemBackend>;

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        TagStore::with_backend(MemBackend::new())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::config::DEFAULT_MIGRATION_ID_PREFIX;
    use crate::model::{ContentKey, RestrictionCategory, Restrictions};
    use crate::store::ContentTagStore;
    use crate::tags::{MasterContentTag, MasterTemplate, Subscription};
    use uuid::Uuid;

    /// A blueprint course with one subscribed child course.
    pub struct StoreFixture {
        pub store: InMemoryStore,
        pub template: MasterTemplate,
        pub subscription: Subscription,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            let store = InMemoryStore::new();
            let template = store.find_or_create_template(&Uuid::new_v4()).unwrap();
            let subscription = store
                .find_or_create_subscription(&template, &Uuid::new_v4())
                .unwrap();
            Self {
                store,
                template,
                subscription,
            }
        }

        /// Migration id that copies of `master` carry.
        pub fn migration_id(&self, master: &ContentKey) -> String {
            self.template
                .migration_id_for(master, DEFAULT_MIGRATION_ID_PREFIX)
        }

        /// Tags `master` in the template with `categories` locked.
        pub fn with_master_item(self, master: ContentKey, categories: &[RestrictionCategory]) -> Self {
            self.with_master_restrictions(master, Restrictions::locking(categories))
        }

        pub fn with_master_restrictions(self, master: ContentKey, restrictions: Restrictions) -> Self {
            let mut tag = MasterContentTag::new(&self.template, master, self.migration_id(&master));
            tag.restrictions = restrictions;
            self.store.save_master_tag(&tag).unwrap();
            self
        }

        /// Records `child` as the synced copy of `master`.
        pub fn with_child_copy(self, child: ContentKey, master: &ContentKey) -> Self {
            let migration_id = self.migration_id(master);
            self.store
                .find_or_create_child_tag(&self.subscription, &child, Some(&migration_id))
                .unwrap();
            self
        }
    }
}
