use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::ContentTagStore;
use uuid::Uuid;

/// Turns `course_id` into a blueprint course by giving it a full template.
pub fn init<S: ContentTagStore + ?Sized>(store: &S, course_id: &Uuid) -> Result<CmdResult> {
    let existing = store.full_template_for(course_id)?;
    let created = existing.is_none();
    let template = match existing {
        Some(template) => template,
        None => store.find_or_create_template(course_id)?,
    };

    let mut result = CmdResult::default().with_templates(vec![template.clone()]);
    if created {
        result.add_message(CmdMessage::success(format!(
            "Course {} is now a blueprint (template {})",
            course_id, template.id
        )));
    } else {
        result.add_message(CmdMessage::info(format!(
            "Course {} already has blueprint template {}",
            course_id, template.id
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_init_creates_template_once() {
        let store = InMemoryStore::new();
        let course = Uuid::new_v4();

        let first = init(&store, &course).unwrap();
        assert_eq!(first.templates.len(), 1);
        assert!(matches!(first.messages[0].level, MessageLevel::Success));

        let second = init(&store, &course).unwrap();
        assert_eq!(second.templates[0].id, first.templates[0].id);
        assert!(matches!(second.messages[0].level, MessageLevel::Info));
        assert!(second.messages[0].content.contains("already"));
    }
}
