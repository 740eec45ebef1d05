use super::helpers::require_subscription;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::ContentTagStore;
use uuid::Uuid;

/// Copies in a subscription that diverged from the blueprint since the last
/// sync.
pub fn run<S: ContentTagStore + ?Sized>(store: &S, subscription_id: &Uuid) -> Result<CmdResult> {
    let subscription = require_subscription(store, subscription_id)?;
    let changed: Vec<_> = store
        .list_child_tags(&subscription.id)?
        .into_iter()
        .filter(|tag| !tag.downstream_changes.is_empty())
        .collect();

    let mut result = CmdResult::default();
    if changed.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "No downstream changes in course {}",
            subscription.child_course_id
        )));
    }
    Ok(result
        .with_subscriptions(vec![subscription])
        .with_child_tags(changed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlueprintError;
    use crate::model::{ContentKey, ContentKind};
    use crate::store::memory::fixtures::StoreFixture;
    use std::collections::BTreeSet;

    #[test]
    fn test_status_lists_only_diverged_copies() {
        let master_a = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let master_b = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let child_a = ContentKey::new(ContentKind::WikiPage, Uuid::new_v4());
        let child_b = ContentKey::new(ContentKind::Quiz, Uuid::new_v4());
        let fixture = StoreFixture::new()
            .with_child_copy(child_a, &master_a)
            .with_child_copy(child_b, &master_b);
        let columns: BTreeSet<String> = ["title".to_string()].into();
        fixture
            .store
            .merge_downstream_changes(&child_b, &columns)
            .unwrap();

        let result = run(&fixture.store, &fixture.subscription.id).unwrap();
        assert_eq!(result.child_tags.len(), 1);
        assert_eq!(result.child_tags[0].content, child_b);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_status_clean_subscription() {
        let fixture = StoreFixture::new();
        let result = run(&fixture.store, &fixture.subscription.id).unwrap();
        assert!(result.child_tags.is_empty());
        assert!(result.messages[0].content.contains("No downstream changes"));
    }

    #[test]
    fn test_status_unknown_subscription() {
        let fixture = StoreFixture::new();
        assert!(matches!(
            run(&fixture.store, &Uuid::new_v4()),
            Err(BlueprintError::NotFound(_))
        ));
    }
}
