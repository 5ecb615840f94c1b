//! sprintboard config - print the effective configuration
//!
//! `llm.api_key` never serializes, so it is absent from both forms.

use crate::app::AppContext;
use crate::cli::output;
use crate::config::Config;
use crate::error::{Result, SbError};

pub fn run(ctx: &AppContext) -> Result<()> {
    if ctx.robot_mode {
        return output::emit_json(&ctx.config);
    }

    if let Some(path) = &ctx.config_path {
        println!("# loaded from {}", path.display());
    }
    print!("{}", render_toml(&ctx.config)?);
    Ok(())
}

fn render_toml(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).map_err(|err| SbError::Config(format!("serialize config: {err}")))
}
