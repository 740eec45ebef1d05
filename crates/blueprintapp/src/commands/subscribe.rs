use super::helpers::require_template;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{BlueprintError, Result};
use crate::store::ContentTagStore;
use uuid::Uuid;

/// Associates `child_course_id` with the blueprint of `master_course_id`.
pub fn run<S: ContentTagStore + ?Sized>(
    store: &S,
    master_course_id: &Uuid,
    child_course_id: &Uuid,
) -> Result<CmdResult> {
    if master_course_id == child_course_id {
        return Err(BlueprintError::InvalidArgument(
            "a blueprint course cannot subscribe to itself".to_string(),
        ));
    }
    let template = require_template(store, master_course_id)?;
    let subscription = store.find_or_create_subscription(&template, child_course_id)?;

    let mut result = CmdResult::default().with_subscriptions(vec![subscription.clone()]);
    result.add_message(CmdMessage::success(format!(
        "Course {} subscribed to blueprint {} (subscription {})",
        child_course_id, master_course_id, subscription.id
    )));
    Ok(result)
}
