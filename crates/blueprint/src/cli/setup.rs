use blueprintapp::model::{ContentKey, ContentKind, RestrictionCategory};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "blueprint", bin_name = "blueprint", version)]
#[command(
    about = "Lock blueprint course content and track what child courses change",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: $BLUEPRINT_DATA, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

/// A content record: kind and id.
#[derive(Args, Debug, Clone)]
pub struct ContentArgs {
    /// Content kind (assignment, quiz, wiki_page, ...)
    pub kind: ContentKind,

    /// Content id
    pub id: Uuid,
}

impl ContentArgs {
    pub fn key(&self) -> ContentKey {
        ContentKey::new(self.kind, self.id)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage blueprint templates
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },

    /// Subscribe a child course to a blueprint course
    Subscribe {
        master_course: Uuid,
        child_course: Uuid,
    },

    /// Copy a blueprint item into a subscribed course, or re-sync its copy
    /// with the blueprint's values (column=value ...)
    Sync {
        subscription: Uuid,
        #[command(flatten)]
        content: ContentArgs,
        assignments: Vec<String>,
    },

    /// Lock restriction categories on a blueprint item
    Lock {
        course: Uuid,
        #[command(flatten)]
        content: ContentArgs,
        /// content, settings, due_dates, availability_dates, points, all
        #[arg(required = true, num_args = 1..)]
        categories: Vec<RestrictionCategory>,
    },

    /// Unlock restriction categories on a blueprint item
    Unlock {
        course: Uuid,
        #[command(flatten)]
        content: ContentArgs,
        #[arg(required = true, num_args = 1..)]
        categories: Vec<RestrictionCategory>,
    },

    /// Show the restrictions on a blueprint item
    Show {
        course: Uuid,
        #[command(flatten)]
        content: ContentArgs,
    },

    /// Show how a child copy is restricted
    Inspect {
        #[command(flatten)]
        content: ContentArgs,
    },

    /// Edit a child copy (column=value ...)
    Edit {
        #[command(flatten)]
        content: ContentArgs,
        assignments: Vec<String>,
        /// Delete the copy
        #[arg(long)]
        delete: bool,
        /// Save as a system edit: skip restriction checks and tracking
        #[arg(long)]
        system: bool,
    },

    /// List copies changed in a child course since the last sync
    Status { subscription: Uuid },

    /// Show what the next sync would not overwrite on a copy
    Preview {
        #[command(flatten)]
        content: ContentArgs,
    },

    /// List restricted columns per content kind
    Schema { kind: Option<ContentKind> },

    /// Show the resolved configuration
    Config,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Make a course a blueprint
    Init { course: Uuid },
}
