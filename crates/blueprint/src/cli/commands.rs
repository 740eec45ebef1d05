use super::render::print_result;
use super::setup::{Cli, Commands, TemplateCommands};
use anyhow::{bail, Result};
use blueprintapp::api::BlueprintApi;
use blueprintapp::commands::CmdResult;
use blueprintapp::init::initialize;
use blueprintapp::store::ContentTagStore;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BLUEPRINT_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = initialize(cli.data.clone())?;
    debug!(data_dir = %ctx.data_dir.display(), json = cli.json, "dispatching");
    let result = dispatch(&ctx.api, &cli.command)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    if let Some(rejection) = &result.rejected {
        bail!("{}", rejection);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs share the terminal with command output, so they go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch<S: ContentTagStore>(api: &BlueprintApi<S>, command: &Commands) -> Result<CmdResult> {
    let result = match command {
        Commands::Template { action } => match action {
            TemplateCommands::Init { course } => api.init_template(course)?,
        },
        Commands::Subscribe {
            master_course,
            child_course,
        } => api.subscribe(master_course, child_course)?,
        Commands::Sync {
            subscription,
            content,
            assignments,
        } => api.sync(subscription, content.key(), assignments)?,
        Commands::Lock {
            course,
            content,
            categories,
        } => api.lock(course, content.key(), categories)?,
        Commands::Unlock {
            course,
            content,
            categories,
        } => api.unlock(course, content.key(), categories)?,
        Commands::Show { course, content } => api.show(course, content.key())?,
        Commands::Inspect { content } => api.inspect(content.key())?,
        Commands::Edit {
            content,
            assignments,
            delete,
            system,
        } => api.edit(content.key(), assignments, *delete, *system)?,
        Commands::Status { subscription } => api.status(subscription)?,
        Commands::Preview { content } => api.preview(content.key())?,
        Commands::Schema { kind } => api.schema(*kind)?,
        Commands::Config => api.config()?,
    };
    Ok(result)
}
