// ABOUTME: Server binary for the procedure assistant REST API
// ABOUTME: Loads configuration, opens the database, bootstraps the admin account and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Procedure Assistant Server Binary
//!
//! Reads configuration from the environment, connects to SQLite, creates the
//! configured admin account if needed and serves the API until SIGINT or
//! SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use procedure_assistant::{
    config::ServerConfig, database::Database, logging, resources::ServerResources, server,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "procedure-assistant-server")]
#[command(about = "Procedure Assistant - internal procedure knowledge base with an AI assistant")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override bind host
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    config.validate()?;

    info!("Starting Procedure Assistant");
    config.log_summary();

    let database = Database::new(&config.database.url)
        .await
        .context("Failed to open database")?;
    info!("Database initialized");

    let admin = config.admin.clone();
    let resources = Arc::new(ServerResources::from_config(config, database)?);

    if let Some(admin) = admin {
        let user = resources.auth_service.ensure_bootstrap_admin(&admin).await?;
        info!(user_id = %user.id, "Admin account ready");
    }

    if let Err(e) = server::serve(resources).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
