//! sprintboard serve - run the REST API

use clap::Args;

use crate::api::{self, AppState};
use crate::app::AppContext;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides `server.bind`)
    #[arg(long)]
    pub bind: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ServeArgs) -> Result<()> {
    let db = ctx.open_database()?;
    let agents = ctx.agents()?;
    let bind = args
        .bind
        .clone()
        .unwrap_or_else(|| ctx.config.server.bind.clone());

    let state = AppState::new(db, agents, ctx.config.clone());
    match state.train_models() {
        Ok(report) => tracing::info!(rows = report.rows, "models trained at startup"),
        Err(err) => tracing::warn!(error = %err, "startup training skipped"),
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(api::serve(state, &bind))
}
