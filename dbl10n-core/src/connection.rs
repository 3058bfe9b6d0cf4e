//! Database connection parameters.
//!
//! `ConnectionParams` mirrors the libpq connection keywords the import tool
//! accepts on its command line. Every field is optional; anything left unset
//! falls back to the driver's own defaults, including the `PG*` environment
//! variables.
//!
//! # Security
//! The password lives in a `Zeroizing` container and is never shown by
//! `Debug` or `Display`.

use crate::{DbL10nError, Result};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use zeroize::Zeroizing;

/// Connection keywords accepted on the command line but not understood by
/// the PostgreSQL driver.
pub const UNSUPPORTED_KEYWORDS: [&str; 5] = [
    "sslcompression",
    "sslcrl",
    "requirepeer",
    "krbsrvname",
    "gsslib",
];

/// Name reported to the server in `pg_stat_activity`.
pub fn application_name() -> String {
    format!("dbl10n-import-{}", env!("CARGO_PKG_VERSION"))
}

/// libpq-style connection parameters, each one optional.
///
/// # Example
/// ```rust
/// use dbl10n_core::ConnectionParams;
///
/// let params = ConnectionParams {
///     host: Some("db.example.com".to_string()),
///     port: Some("5433".to_string()),
///     database: Some("l10n".to_string()),
///     ..Default::default()
/// };
///
/// let options = params.to_connect_options().unwrap();
/// assert_eq!(options.get_port(), 5433);
/// ```
#[derive(Clone, Default)]
pub struct ConnectionParams {
    /// Name of host, or directory of a Unix-domain socket when it starts with `/`
    pub host: Option<String>,
    /// Numeric IP address of host
    pub hostaddr: Option<String>,
    /// Port number
    pub port: Option<String>,
    /// User name to connect as
    pub user: Option<String>,
    /// Password, zeroed on drop
    pub password: Option<Zeroizing<String>>,
    /// Database name
    pub database: Option<String>,
    /// SSL negotiation mode
    pub sslmode: Option<String>,
    /// SSL compression flag
    pub sslcompression: Option<String>,
    /// Client certificate file
    pub sslcert: Option<String>,
    /// Client certificate key file
    pub sslkey: Option<String>,
    /// CA certificate file
    pub sslrootcert: Option<String>,
    /// Certificate revocation list file
    pub sslcrl: Option<String>,
    /// Operating-system user name of the server
    pub requirepeer: Option<String>,
    /// Kerberos service name
    pub krbsrvname: Option<String>,
    /// GSS library
    pub gsslib: Option<String>,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("hostaddr", &self.hostaddr)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("database", &self.database)
            .field("sslmode", &self.sslmode)
            .field("sslcompression", &self.sslcompression)
            .field("sslcert", &self.sslcert)
            .field("sslkey", &self.sslkey)
            .field("sslrootcert", &self.sslrootcert)
            .field("sslcrl", &self.sslcrl)
            .field("requirepeer", &self.requirepeer)
            .field("krbsrvname", &self.krbsrvname)
            .field("gsslib", &self.gsslib)
            .finish()
    }
}

impl std::fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let host = self
            .hostaddr
            .as_deref()
            .or(self.host.as_deref())
            .unwrap_or("<default host>");
        write!(f, "ConnectionParams({}", host)?;
        if let Some(port) = &self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(database) = &self.database {
            write!(f, "/{}", database)?;
        }
        // User and password intentionally omitted
        write!(f, ")")
    }
}

impl ConnectionParams {
    /// Keywords that were given but that the driver cannot honour.
    pub fn unsupported(&self) -> Vec<&'static str> {
        let given = [
            &self.sslcompression,
            &self.sslcrl,
            &self.requirepeer,
            &self.krbsrvname,
            &self.gsslib,
        ];
        UNSUPPORTED_KEYWORDS
            .into_iter()
            .zip(given)
            .filter_map(|(keyword, value)| value.as_ref().map(|_| keyword))
            .collect()
    }

    /// Builds driver options from the given parameters.
    ///
    /// Starts from `PgConnectOptions::new()`, so unset parameters keep the
    /// driver defaults (`PGHOST`, `PGPORT`, `PGUSER`, ...). `hostaddr` wins
    /// over `host` for the address actually dialled; `host` is then only a
    /// label and a warning says so.
    ///
    /// # Errors
    /// Returns a configuration error if `port` is not a TCP port number,
    /// `sslmode` is not a libpq SSL mode, or `host` and `hostaddr` are both
    /// given under `verify-full`.
    pub fn to_connect_options(&self) -> Result<PgConnectOptions> {
        let mut options = PgConnectOptions::new().application_name(&application_name());

        match (&self.hostaddr, &self.host) {
            (Some(addr), _) => options = options.host(addr),
            (None, Some(host)) if host.starts_with('/') => options = options.socket(host),
            (None, Some(host)) => options = options.host(host),
            (None, None) => {}
        }

        if let Some(port) = &self.port {
            options = options.port(parse_port(port)?);
        }
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password.as_str());
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        if let Some(mode) = &self.sslmode {
            options = options.ssl_mode(parse_ssl_mode(mode)?);
        }
        if let Some(cert) = &self.sslcert {
            options = options.ssl_client_cert(cert);
        }
        if let Some(key) = &self.sslkey {
            options = options.ssl_client_key(key);
        }
        if let Some(root) = &self.sslrootcert {
            options = options.ssl_root_cert(root);
        }

        // The driver verifies the certificate against the dialled address, so
        // `host` cannot serve as the TLS name once `hostaddr` is set.
        if let (Some(host), Some(addr)) = (&self.host, &self.hostaddr) {
            if matches!(options.get_ssl_mode(), PgSslMode::VerifyFull) {
                return Err(DbL10nError::configuration(format!(
                    "sslmode verify-full cannot check host '{}' while connecting to hostaddr '{}'; drop one of them",
                    host, addr
                )));
            }
            tracing::warn!(
                "Connecting to hostaddr '{}'; host '{}' is kept only as a label",
                addr,
                host
            );
        }

        for keyword in self.unsupported() {
            tracing::warn!(
                "Connection parameter '{}' is not supported by the PostgreSQL driver and will be ignored",
                keyword
            );
        }

        Ok(options)
    }
}

fn parse_port(port: &str) -> Result<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(DbL10nError::configuration(format!(
            "Invalid port '{}': expected a number between 1 and 65535",
            port
        ))),
        Ok(port) => Ok(port),
    }
}

fn parse_ssl_mode(mode: &str) -> Result<PgSslMode> {
    mode.parse::<PgSslMode>().map_err(|_| {
        DbL10nError::configuration(format!(
            "Invalid sslmode '{}': expected one of disable, allow, prefer, require, verify-ca, verify-full",
            mode
        ))
    })
}
