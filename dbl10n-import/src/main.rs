//! DB-l10n import of predefined data.
//!
//! Connects to the target PostgreSQL database, runs the import of the IANA
//! Language Subtag Registry data in one transaction, then runs post-load
//! maintenance on the target schema.
//!
//! # Security
//! - The password is never logged; `-W` reads it without echo
//! - Connection summaries omit user and password

use clap::Parser;
use dbl10n_core::{DbL10nError, Result, init_logging};
use dbl10n_import::{Cli, execute, render_report};
use tracing::{error, info};
use zeroize::Zeroizing;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet, &cli.log_filename) {
        eprintln!("Error: {}", e.report());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli).await {
        error!("Import failed: {}", e.report());
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut params = cli.connection_params();
    if cli.connection.password_prompt {
        let password = rpassword::prompt_password("Password: ")
            .map_err(|e| DbL10nError::io("Failed to read password", e))?;
        params.password = Some(Zeroizing::new(password));
    }

    let report = execute(cli, &params).await?;
    info!(
        "✓ Import finished in {} ms ({} tables maintained)",
        report.elapsed_ms,
        report.tables_maintained.len()
    );

    println!("{}", render_report(&report, cli.json)?);
    Ok(())
}
