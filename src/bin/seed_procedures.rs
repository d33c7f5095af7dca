// ABOUTME: Sample data seeding utility for the procedure assistant
// ABOUTME: Creates the default categories and procedures in the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Sample procedure seeder.
//!
//! Usage:
//! ```bash
//! # Seed sample data (uses DATABASE_URL from environment)
//! cargo run --bin seed-procedures
//!
//! # Override database URL
//! cargo run --bin seed-procedures -- --database-url sqlite:./procedures.db
//!
//! # Add missing samples to a database that already has procedures
//! cargo run --bin seed-procedures -- --force
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use procedure_assistant::database::{seed::seed_sample_data, Database};
use std::env;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "seed-procedures",
    about = "Procedure Assistant sample data seeder",
    long_about = "Create the default categories and procedures for a fresh knowledge base"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Seed even if procedures already exist
    #[arg(long)]
    force: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    info!("=== Procedure Assistant Sample Data Seeder ===");

    let database_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:./procedures.db".into());

    info!("Connecting to database: {}", database_url);
    let database = Database::new(&database_url)
        .await
        .context("Failed to open database")?;

    let report = seed_sample_data(&database, args.force).await?;
    if report.skipped {
        info!("Procedures already exist. Use --force to add missing samples.");
        return Ok(());
    }

    info!("=== Seeding Complete ===");
    info!(
        "Created {} categories and {} procedures",
        report.categories, report.procedures
    );
    Ok(())
}
