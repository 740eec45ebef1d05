use crate::commands::CmdResult;
use crate::config::BlueprintConfig;
use crate::error::Result;

/// The configuration in effect, after file and environment layering.
pub fn run(config: &BlueprintConfig) -> Result<CmdResult> {
    Ok(CmdResult::default().with_config(config.clone()))
}
