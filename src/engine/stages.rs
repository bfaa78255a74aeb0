//! Build stages run after every dependency is unpacked.

use crate::core::config::Config;
use crate::core::error::{BootstrapError, Result};
use crate::core::manifest::BuildStage;
use crate::core::output;
use crate::helpers::util::ProcessRunner;

/// Environment variable holding the cache root, set for every stage.
pub const CACHE_ENV: &str = "LOCALLY_CACHE";
/// Environment variable holding the workspace root, set for every stage.
pub const WORKSPACE_ENV: &str = "LOCALLY_WORKSPACE";

/// Run one stage. A non-zero exit is `StageFailure`.
pub fn run_stage(config: &Config, stage: &BuildStage) -> Result<()> {
    let dir = match &stage.dir {
        Some(dir) => config.workspace_root.join(dir),
        None => config.workspace_root.clone(),
    };

    let runner = ProcessRunner::new(&stage.command)
        .dir(&dir)
        .env(CACHE_ENV, config.cache_root.to_string_lossy())
        .env(WORKSPACE_ENV, config.workspace_root.to_string_lossy())
        .envs(stage.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let result = match stage.capture {
        Some(lines) => runner.run_capture_limited(lines)?,
        None => runner.run()?,
    };

    if !result.success {
        return Err(BootstrapError::StageFailure {
            stage: stage.name.clone(),
            command: result.command,
            exit_code: result.exit_code,
            output: result.output,
        });
    }
    Ok(())
}

/// Run `stages` in order, stopping at the first failure.
pub fn run_all(config: &Config, stages: &[BuildStage]) -> Result<()> {
    let total = stages.len();
    for (i, stage) in stages.iter().enumerate() {
        if !config.quiet {
            output::action_numbered(i + 1, total, &stage.name);
        }
        run_stage(config, stage)?;
    }
    Ok(())
}
