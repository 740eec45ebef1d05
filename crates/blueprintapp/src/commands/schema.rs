use crate::commands::{CmdMessage, CmdResult, SchemaListing};
use crate::error::Result;
use crate::model::ContentKind;
use crate::schema::SchemaRegistry;

/// Lists restricted columns for `kind`, or for every kind that has any.
pub fn run(registry: &SchemaRegistry, kind: Option<ContentKind>) -> Result<CmdResult> {
    let kinds: Vec<ContentKind> = match kind {
        Some(kind) => vec![kind],
        None => ContentKind::ALL.to_vec(),
    };

    let mut result = CmdResult::default();
    for current in kinds {
        let schema = registry.restrictions_for(current);
        if schema.is_empty() {
            continue;
        }
        result.schemas.push(SchemaListing {
            kind: current.to_string(),
            columns: schema
                .iter()
                .map(|(category, columns)| (category, columns.to_vec()))
                .collect(),
        });
    }
    if let (Some(kind), true) = (kind, result.schemas.is_empty()) {
        result.add_message(CmdMessage::info(format!(
            "{} has no restricted columns",
            kind
        )));
    }
    Ok(result)
}
