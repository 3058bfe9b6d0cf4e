//! Library module for dbl10n-import
//!
//! Exposes the command-line interface and the command runner so they can be
//! tested without spawning the binary. The entry point is in main.rs.

use clap::{Args, Parser};
use dbl10n_core::{
    ConnectionParams, DEFAULT_SCHEMA, ImportOptions, ImportReport, PostgresSession, RegistrySource,
    Result, run_import,
};
use std::path::PathBuf;
use tracing::info;
use zeroize::Zeroizing;

/// Default location of the import log.
pub const DEFAULT_LOG_FILENAME: &str = "import.log";

const BANNER: &str = "
DB-l10n Import of predefined data
Copyright (C) 2013  Basil Peace

  This program comes with ABSOLUTELY NO WARRANTY.
  This is free software, and you are welcome to redistribute it
  under certain conditions; read 'LICENSE' for details.
";

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dbl10n-import")]
#[command(about = "DB-l10n Import of predefined data")]
#[command(version)]
#[command(long_about = BANNER)]
pub struct Cli {
    /// Verbosity flags
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Connection flags
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Target schema
    #[arg(
        long,
        default_value = DEFAULT_SCHEMA,
        help = "The schema name where DB-l10n should be installed"
    )]
    pub schema: String,

    /// Import log
    #[arg(
        long = "log-filename",
        value_name = "FILE",
        default_value = DEFAULT_LOG_FILENAME,
        help = "filename of log"
    )]
    pub log_filename: PathBuf,

    /// Registry file
    #[arg(
        long,
        value_name = "FILE",
        help = "name of file containing registry [download the latest version from internet]"
    )]
    pub registry: Option<PathBuf>,

    /// Report format
    #[arg(long, help = "Print the import report as JSON")]
    pub json: bool,
}

/// Logging verbosity flags
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// libpq connection parameters, passed through unchanged
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Host name or socket directory
    #[arg(long, help = "Name of host to connect to")]
    pub host: Option<String>,

    /// Host IP address
    #[arg(long, help = "Numeric IP address of host to connect to")]
    pub hostaddr: Option<String>,

    /// Server port
    #[arg(
        long,
        help = "Port number to connect to at the server host, or socket file name extension for Unix-domain connections"
    )]
    pub port: Option<String>,

    /// User name
    #[arg(long, help = "PostgreSQL user name to connect as")]
    pub user: Option<String>,

    /// Password
    #[arg(
        long,
        help = "Password to be used if the server demands password authentication"
    )]
    pub password: Option<String>,

    /// Prompt for the password instead of taking it from the command line
    #[arg(
        short = 'W',
        long,
        conflicts_with = "password",
        help = "Prompt for the password"
    )]
    pub password_prompt: bool,

    /// Target database
    #[arg(
        long,
        help = "The database name where DB-l10n should be installed"
    )]
    pub database: Option<String>,

    /// SSL mode
    #[arg(
        long,
        help = "Method of negotiation of secure SSL TCP/IP connection"
    )]
    pub sslmode: Option<String>,

    /// SSL compression
    #[arg(long, help = "Compress data sent over SSL connections")]
    pub sslcompression: Option<String>,

    /// Client certificate
    #[arg(long, help = "The file name of the client SSL certificate")]
    pub sslcert: Option<String>,

    /// Client certificate key
    #[arg(
        long,
        help = "The location for the secret key used for the client certificate"
    )]
    pub sslkey: Option<String>,

    /// CA certificate
    #[arg(
        long,
        help = "The name of a file containing SSL certificate authority (CA) certificate(s)"
    )]
    pub sslrootcert: Option<String>,

    /// Certificate revocation list
    #[arg(
        long,
        help = "The file name of the SSL certificate revocation list (CRL)"
    )]
    pub sslcrl: Option<String>,

    /// Expected server OS user
    #[arg(long, help = "The operating-system user name of the server")]
    pub requirepeer: Option<String>,

    /// Kerberos service name
    #[arg(
        long,
        help = "Kerberos service name to use when authenticating with Kerberos 5 or GSSAPI"
    )]
    pub krbsrvname: Option<String>,

    /// GSS library
    #[arg(long, help = "GSS library to use for GSSAPI authentication")]
    pub gsslib: Option<String>,
}

impl Cli {
    /// Copies the connection flags into `ConnectionParams` unchanged.
    pub fn connection_params(&self) -> ConnectionParams {
        let c = &self.connection;
        ConnectionParams {
            host: c.host.clone(),
            hostaddr: c.hostaddr.clone(),
            port: c.port.clone(),
            user: c.user.clone(),
            password: c.password.clone().map(Zeroizing::new),
            database: c.database.clone(),
            sslmode: c.sslmode.clone(),
            sslcompression: c.sslcompression.clone(),
            sslcert: c.sslcert.clone(),
            sslkey: c.sslkey.clone(),
            sslrootcert: c.sslrootcert.clone(),
            sslcrl: c.sslcrl.clone(),
            requirepeer: c.requirepeer.clone(),
            krbsrvname: c.krbsrvname.clone(),
            gsslib: c.gsslib.clone(),
        }
    }
}

/// Opens the registry (if any), connects and runs the import.
///
/// The registry is opened before connecting so a bad path fails without
/// touching the database.
///
/// # Errors
/// Returns the first registry, connection or statement error.
pub async fn execute(cli: &Cli, params: &ConnectionParams) -> Result<ImportReport> {
    let registry = match &cli.registry {
        Some(path) => Some(RegistrySource::open(path).await?),
        None => None,
    };
    let options = ImportOptions {
        schema: cli.schema.clone(),
        registry,
    };

    info!("Starting import into schema '{}'", options.schema);
    let mut session = PostgresSession::connect(params).await?;
    run_import(&mut session, &options).await
}

/// Renders the report for stdout, as JSON or as summary lines.
///
/// # Errors
/// Returns a serialization error if JSON output fails.
pub fn render_report(report: &ImportReport, json: bool) -> Result<String> {
    if json {
        return report.to_json();
    }

    let mut lines = vec![
        "Import completed successfully".to_string(),
        format!("Schema: {}", report.schema),
    ];
    if let (Some(path), Some(bytes)) = (&report.registry, report.registry_bytes) {
        lines.push(format!("Registry: {} ({} bytes)", path.display(), bytes));
    }
    lines.push(format!(
        "Tables maintained: {}",
        report.tables_maintained.len()
    ));
    lines.push(format!("Elapsed: {} ms", report.elapsed_ms));
    Ok(lines.join("\n"))
}
