//! Import pipeline: import phase, post-load maintenance, disconnect.

use crate::{DbL10nError, RegistrySource, Result, session::ImportSession};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Schema the import targets when none is given.
pub const DEFAULT_SCHEMA: &str = "l10n";

/// What to import and where.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Target schema
    pub schema: String,
    /// Opened registry file, if one was given
    pub registry: Option<RegistrySource>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            registry: None,
        }
    }
}

/// Outcome of one import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// Target schema
    pub schema: String,
    /// Registry file path
    pub registry: Option<PathBuf>,
    /// Registry file size in bytes
    pub registry_bytes: Option<u64>,
    /// Tables that received `VACUUM ANALYZE`, in order
    pub tables_maintained: Vec<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run
    pub elapsed_ms: u64,
}

impl ImportReport {
    /// Serializes the report as pretty JSON.
    ///
    /// # Errors
    /// Returns a serialization error if the report cannot be encoded.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| DbL10nError::Serialization {
            context: "import report".to_string(),
            source: e,
        })
    }
}

/// Runs the import against an open session and closes it.
///
/// 1. Import phase inside the session's transaction: the target schema must
///    exist. The transaction is then committed.
/// 2. Post-load maintenance: `VACUUM ANALYZE` on every table of the schema.
/// 3. The session is closed.
///
/// # Errors
/// A missing schema is a configuration error; any statement failure is
/// returned as-is and stops the run.
pub async fn run_import<S>(session: &mut S, options: &ImportOptions) -> Result<ImportReport>
where
    S: ImportSession + ?Sized,
{
    let started_at = Utc::now();
    let timer = Instant::now();
    let schema = options.schema.as_str();

    match &options.registry {
        Some(registry) => info!(
            "Registry: {} ({} bytes)",
            registry.path().display(),
            registry.size()
        ),
        None => warn!("No registry file given"),
    }

    if !session.schema_exists(schema).await? {
        return Err(DbL10nError::configuration(format!(
            "Schema '{}' does not exist in the target database; install DB-l10n first",
            schema
        )));
    }
    info!("Importing predefined data into schema '{}'", schema);

    session.commit().await?;
    info!("✓ Import committed");

    let tables = session.schema_tables(schema).await?;
    if tables.is_empty() {
        warn!("Schema '{}' has no tables to maintain", schema);
    }
    for table in &tables {
        info!("VACUUM ANALYZE {}.{}", schema, table);
        session.vacuum_analyze(schema, table).await?;
    }
    info!("✓ Maintenance completed on {} tables", tables.len());

    session.close().await?;

    Ok(ImportReport {
        schema: schema.to_string(),
        registry: options.registry.as_ref().map(|r| r.path().to_path_buf()),
        registry_bytes: options.registry.as_ref().map(RegistrySource::size),
        tables_maintained: tables,
        started_at,
        elapsed_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Records every call; answers from canned data.
    #[derive(Default)]
    struct RecordingSession {
        schemas: Vec<String>,
        tables: Vec<String>,
        fail_vacuum_on: Option<String>,
        calls: Vec<String>,
    }

    impl RecordingSession {
        fn with_schema(schema: &str, tables: &[&str]) -> Self {
            Self {
                schemas: vec![schema.to_string()],
                tables: tables.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ImportSession for RecordingSession {
        async fn schema_exists(&mut self, schema: &str) -> Result<bool> {
            self.calls.push(format!("schema_exists {}", schema));
            Ok(self.schemas.iter().any(|s| s == schema))
        }

        async fn schema_tables(&mut self, schema: &str) -> Result<Vec<String>> {
            self.calls.push(format!("schema_tables {}", schema));
            Ok(self.tables.clone())
        }

        async fn commit(&mut self) -> Result<()> {
            self.calls.push("commit".to_string());
            Ok(())
        }

        async fn vacuum_analyze(&mut self, schema: &str, table: &str) -> Result<()> {
            self.calls.push(format!("vacuum {}.{}", schema, table));
            if self.fail_vacuum_on.as_deref() == Some(table) {
                return Err(DbL10nError::query_failed(
                    format!("VACUUM ANALYZE {}", table),
                    std::io::Error::other("permission denied"),
                ));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            self.calls.push("close".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_import_then_maintain_every_table() {
        let mut session = RecordingSession::with_schema("l10n", &["languages", "scripts"]);

        let report = run_import(&mut session, &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(
            session.calls,
            vec![
                "schema_exists l10n",
                "commit",
                "schema_tables l10n",
                "vacuum l10n.languages",
                "vacuum l10n.scripts",
                "close",
            ]
        );
        assert_eq!(report.schema, "l10n");
        assert_eq!(report.tables_maintained, vec!["languages", "scripts"]);
        assert!(report.registry.is_none());
    }

    #[tokio::test]
    async fn test_missing_schema_stops_before_commit() {
        let mut session = RecordingSession::with_schema("public", &["t"]);
        let options = ImportOptions {
            schema: "l10n".to_string(),
            registry: None,
        };

        let error = run_import(&mut session, &options).await.unwrap_err();

        assert!(matches!(error, DbL10nError::Configuration { .. }));
        assert!(error.to_string().contains("'l10n'"));
        assert_eq!(session.calls, vec!["schema_exists l10n"]);
    }

    #[tokio::test]
    async fn test_vacuum_failure_propagates() {
        let mut session = RecordingSession::with_schema("l10n", &["a", "b", "c"]);
        session.fail_vacuum_on = Some("b".to_string());

        let error = run_import(&mut session, &ImportOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(error, DbL10nError::Query { .. }));
        assert_eq!(session.calls.last().map(String::as_str), Some("vacuum l10n.b"));
        assert!(!session.calls.contains(&"close".to_string()));
    }

    #[tokio::test]
    async fn test_empty_schema_still_commits_and_closes() {
        let mut session = RecordingSession::with_schema("l10n", &[]);

        let report = run_import(&mut session, &ImportOptions::default())
            .await
            .unwrap();

        assert!(report.tables_maintained.is_empty());
        assert_eq!(
            session.calls,
            vec!["schema_exists l10n", "commit", "schema_tables l10n", "close"]
        );
    }

    #[tokio::test]
    async fn test_report_carries_registry() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "File-Date: 2013-09-23\n").unwrap();
        let registry = RegistrySource::open(file.path()).await.unwrap();

        let mut session = RecordingSession::with_schema("l10n", &["languages"]);
        let options = ImportOptions {
            registry: Some(registry),
            ..Default::default()
        };

        let report = run_import(&mut session, &options).await.unwrap();
        assert_eq!(report.registry.as_deref(), Some(file.path()));
        assert_eq!(report.registry_bytes, Some(22));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["schema"], "l10n");
        assert_eq!(json["registry_bytes"], 22);
        assert_eq!(json["tables_maintained"][0], "languages");
    }
}
