//! Text rendering of command results.
//!
//! Sections are printed in a fixed order: records first, then the summary,
//! then messages last so they read as the outcome of the command.

use blueprintapp::commands::{CmdMessage, CmdResult, MessageLevel, SchemaListing};
use blueprintapp::config::BlueprintConfig;
use blueprintapp::model::{RestrictionCategory, Restrictions};
use blueprintapp::summary::RestrictionSummary;
use blueprintapp::tags::{ChildContentTag, MasterContentTag};
use console::Style;

pub fn print_result(result: &CmdResult) {
    for line in render_result(result) {
        println!("{}", line);
    }
}

pub fn render_result(result: &CmdResult) -> Vec<String> {
    let dim = Style::new().dim();
    let mut lines = Vec::new();

    for template in &result.templates {
        lines.push(format!(
            "template {} {}",
            template.id,
            dim.apply_to(format!("course {}", template.course_id))
        ));
    }
    for subscription in &result.subscriptions {
        lines.push(format!(
            "subscription {} {}",
            subscription.id,
            dim.apply_to(format!("child course {}", subscription.child_course_id))
        ));
    }
    for tag in &result.master_tags {
        lines.push(render_master_tag(tag));
    }
    for tag in &result.child_tags {
        lines.push(render_child_tag(tag));
    }
    for listing in &result.schemas {
        lines.extend(render_schema(listing));
    }
    if let Some(summary) = &result.summary {
        lines.extend(render_summary(summary));
    }
    if let Some(blocked) = &result.blocked {
        lines.push(format!("kept on sync: {}", category_list(blocked)));
    }
    if let Some(config) = &result.config {
        lines.extend(render_config(config));
    }
    if let Some(rejected) = &result.rejected {
        lines.push(format!(
            "{} {}",
            Style::new().red().apply_to("rejected:"),
            rejected.columns.join(", ")
        ));
    }
    lines.extend(result.messages.iter().map(render_message));
    lines
}

fn render_message(message: &CmdMessage) -> String {
    let style = match message.level {
        MessageLevel::Info => Style::new().dim(),
        MessageLevel::Success => Style::new().green(),
        MessageLevel::Warning => Style::new().yellow(),
        MessageLevel::Error => Style::new().red(),
    };
    style.apply_to(&message.content).to_string()
}

fn render_master_tag(tag: &MasterContentTag) -> String {
    format!(
        "{} {} locked: {}",
        tag.content,
        Style::new().dim().apply_to(&tag.migration_id),
        locked_list(&tag.restrictions)
    )
}

fn render_child_tag(tag: &ChildContentTag) -> String {
    let changes = if tag.downstream_changes.is_empty() {
        "-".to_string()
    } else {
        tag.downstream_changes
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{} {} changed: {}",
        tag.content,
        Style::new()
            .dim()
            .apply_to(tag.migration_id.as_deref().unwrap_or("-")),
        changes
    )
}

fn render_schema(listing: &SchemaListing) -> Vec<String> {
    let mut lines = vec![Style::new().bold().apply_to(&listing.kind).to_string()];
    for (category, columns) in &listing.columns {
        lines.push(format!("  {:<20} {}", category.as_str(), columns.join(", ")));
    }
    lines
}

fn render_summary(summary: &RestrictionSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.is_master_course_master_content == Some(true) {
        lines.push("blueprint content".to_string());
    }
    if summary.is_master_course_child_content == Some(true) {
        lines.push("blueprint copy".to_string());
    }
    match (&summary.restricted_by_master_course, &summary.master_course_restrictions) {
        (Some(true), Some(restrictions)) => {
            lines.push(format!("locked: {}", locked_list(restrictions)))
        }
        (Some(false), _) => lines.push("locked: -".to_string()),
        _ => {}
    }
    lines
}

fn render_config(config: &BlueprintConfig) -> Vec<String> {
    let mut lines = vec![format!(
        "migration_id_prefix = {:?}",
        config.migration_id_prefix
    )];
    if let Some(kinds) = &config.restriction_exempt_kinds {
        lines.push(format!("restriction_exempt_kinds = {:?}", kinds));
    }
    if let Some(extra) = &config.extra_columns {
        let mut kinds: Vec<_> = extra.iter().collect();
        kinds.sort_by(|a, b| a.0.cmp(b.0));
        for (kind, categories) in kinds {
            let mut categories: Vec<_> = categories.iter().collect();
            categories.sort_by(|a, b| a.0.cmp(b.0));
            for (category, columns) in categories {
                lines.push(format!(
                    "extra_columns.{}.{} = {:?}",
                    kind, category, columns
                ));
            }
        }
    }
    lines
}

fn locked_list(restrictions: &Restrictions) -> String {
    let locked: Vec<RestrictionCategory> = restrictions
        .iter()
        .filter(|(_, locked)| *locked)
        .map(|(category, _)| category)
        .collect();
    category_list(&locked)
}

fn category_list(categories: &[RestrictionCategory]) -> String {
    if categories.is_empty() {
        return "-".to_string();
    }
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
