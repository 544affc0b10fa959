//! StyleMirror interactive CLI.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the store.
//! - Hand a ready session to the interactive loop in `ui`.

mod ui;

use anyhow::{anyhow, Context, Result};
use log::info;
use stylemirror_core::db::open_db;
use stylemirror_core::{init_logging, AppConfig, OpenAiChatClient};

fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    init_logging(&config.log_level, &config.log_dir)
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    let client = OpenAiChatClient::new(
        &config.base_url,
        config.api_key.as_str(),
        config.request_timeout,
    )
    .context("failed to build chat client")?;
    info!(
        "event=cli_start module=cli status=ok model={} endpoint={}",
        config.generation.model,
        client.endpoint()
    );

    ui::run(&conn, &client, &config.generation)
}
