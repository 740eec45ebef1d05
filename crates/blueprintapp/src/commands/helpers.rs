use crate::error::{BlueprintError, Result};
use crate::model::ContentKey;
use crate::store::ContentTagStore;
use crate::tags::{ChildContentTag, MasterTemplate, Subscription};
use serde_json::Value;
use uuid::Uuid;

pub fn require_template<S: ContentTagStore + ?Sized>(
    store: &S,
    course_id: &Uuid,
) -> Result<MasterTemplate> {
    store.full_template_for(course_id)?.ok_or_else(|| {
        BlueprintError::NotFound(format!("course {} has no blueprint template", course_id))
    })
}

pub fn require_subscription<S: ContentTagStore + ?Sized>(
    store: &S,
    subscription_id: &Uuid,
) -> Result<Subscription> {
    store
        .subscription(subscription_id)?
        .ok_or_else(|| BlueprintError::NotFound(format!("subscription {}", subscription_id)))
}

pub fn require_child_tag<S: ContentTagStore + ?Sized>(
    store: &S,
    content: &ContentKey,
) -> Result<ChildContentTag> {
    store.child_tag(content)?.ok_or_else(|| {
        BlueprintError::NotFound(format!("{} is not a synced blueprint copy", content))
    })
}

/// Parses `column=value`. The value is read as JSON when it is valid JSON
/// (`points_possible=10`, `locked=true`) and as a plain string otherwise.
pub fn parse_assignment(input: &str) -> Result<(String, Value)> {
    let (column, raw) = input.split_once('=').ok_or_else(|| {
        BlueprintError::InvalidArgument(format!("expected column=value, got '{}'", input))
    })?;
    let column = column.trim();
    if column.is_empty() {
        return Err(BlueprintError::InvalidArgument(format!(
            "missing column name in '{}'",
            input
        )));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((column.to_string(), value))
}

pub fn join_names<T: ToString>(names: impl IntoIterator<Item = T>) -> String {
    names
        .into_iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
