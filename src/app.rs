//! Per-invocation context shared by CLI commands.

use std::path::PathBuf;

use crate::agents::Agents;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::storage::Database;

pub struct AppContext {
    pub config: Config,
    /// Explicit `--config` path, if one was given.
    pub config_path: Option<PathBuf>,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &project_root)?;
        tracing::debug!(db = %config.database.path.display(), "configuration loaded");
        Ok(Self {
            config,
            config_path: cli.config.clone(),
            robot_mode: cli.robot,
        })
    }

    /// Open (and migrate) the configured database.
    pub fn open_database(&self) -> Result<Database> {
        Database::open(&self.config.database.path)
    }

    pub fn agents(&self) -> Result<Agents> {
        Agents::from_config(&self.config)
    }
}
