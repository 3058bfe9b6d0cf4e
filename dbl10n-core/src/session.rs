//! Database session used by the import pipeline.
//!
//! `ImportSession` is the seam between the pipeline and the database;
//! `PostgresSession` implements it over a single `PgConnection`.
//!
//! The session opens with an explicit import transaction. `VACUUM` refuses
//! to run inside a transaction block, so maintenance is only accepted after
//! `commit()` and is sent over the simple query protocol.

use crate::{ConnectionParams, DbL10nError, Result};
use async_trait::async_trait;
use sqlx::{Connection, Executor, PgConnection};
use tracing::{debug, info};

/// Operations the import pipeline needs from the target database.
#[async_trait]
pub trait ImportSession: Send {
    /// Returns whether the named schema exists.
    async fn schema_exists(&mut self, schema: &str) -> Result<bool>;

    /// Ordinary tables and materialized views of the schema, sorted by name.
    async fn schema_tables(&mut self, schema: &str) -> Result<Vec<String>>;

    /// Commits the import transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Runs `VACUUM ANALYZE` on one table, outside any transaction.
    async fn vacuum_analyze(&mut self, schema: &str, table: &str) -> Result<()>;

    /// Closes the session. Later calls fail.
    async fn close(&mut self) -> Result<()>;
}

/// Quotes a PostgreSQL identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Builds the post-load maintenance statement for one table.
pub fn vacuum_analyze_statement(schema: &str, table: &str) -> String {
    format!(
        "VACUUM ANALYZE {}.{}",
        quote_ident(schema),
        quote_ident(table)
    )
}

/// Import session over one PostgreSQL connection.
pub struct PostgresSession {
    conn: Option<PgConnection>,
    in_transaction: bool,
}

impl std::fmt::Debug for PostgresSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSession")
            .field("open", &self.conn.is_some())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

impl PostgresSession {
    /// Opens one connection and starts the import transaction.
    ///
    /// # Errors
    /// Returns a configuration error for malformed parameters and a
    /// connection error if the server cannot be reached or rejects the
    /// login. Neither carries the password.
    pub async fn connect(params: &ConnectionParams) -> Result<Self> {
        let options = params.to_connect_options()?;

        info!("Connecting to {}", params);
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(DbL10nError::connection_failed)?;

        sqlx::raw_sql("BEGIN")
            .execute(&mut conn)
            .await
            .map_err(|e| DbL10nError::query_failed("Failed to start import transaction", e))?;
        debug!("Import transaction started");

        Ok(Self {
            conn: Some(conn),
            in_transaction: true,
        })
    }

    /// Whether the import transaction is still open.
    pub const fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| DbL10nError::configuration("Database session is already closed"))
    }
}

#[async_trait]
impl ImportSession for PostgresSession {
    async fn schema_exists(&mut self, schema: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM pg_catalog.pg_namespace WHERE nspname = $1)",
        )
        .bind(schema)
        .fetch_one(self.conn()?)
        .await
        .map_err(|e| DbL10nError::query_failed(format!("Failed to look up schema '{}'", schema), e))
    }

    async fn schema_tables(&mut self, schema: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.relname::text
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = $1
              AND c.relkind IN ('r', 'm')
            ORDER BY c.relname
            "#,
        )
        .bind(schema)
        .fetch_all(self.conn()?)
        .await
        .map_err(|e| {
            DbL10nError::query_failed(format!("Failed to list tables of schema '{}'", schema), e)
        })
    }

    async fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(DbL10nError::configuration(
                "No import transaction is open",
            ));
        }
        let conn = self.conn()?;
        conn.execute("COMMIT")
            .await
            .map_err(|e| DbL10nError::query_failed("Failed to commit import transaction", e))?;
        self.in_transaction = false;
        debug!("Import transaction committed");
        Ok(())
    }

    async fn vacuum_analyze(&mut self, schema: &str, table: &str) -> Result<()> {
        if self.in_transaction {
            return Err(DbL10nError::configuration(
                "VACUUM cannot run inside the import transaction; commit first",
            ));
        }
        let statement = vacuum_analyze_statement(schema, table);
        let conn = self.conn()?;
        conn.execute(statement.as_str())
            .await
            .map_err(|e| DbL10nError::query_failed(statement.clone(), e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let conn = self
            .conn
            .take()
            .ok_or_else(|| DbL10nError::configuration("Database session is already closed"))?;
        if self.in_transaction {
            // Closing without COMMIT discards the import
            debug!("Closing session with an uncommitted import transaction");
            self.in_transaction = false;
        }
        conn.close()
            .await
            .map_err(|e| DbL10nError::query_failed("Failed to close database session", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_import_session<S: ImportSession + ?Sized>() {}

    #[test]
    fn test_postgres_session_is_an_import_session() {
        assert_import_session::<PostgresSession>();
        assert_import_session::<dyn ImportSession>();

        let sessions: Vec<Box<dyn ImportSession>> = Vec::new();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_maintenance() {
        let mut session = PostgresSession {
            conn: None,
            in_transaction: false,
        };
        let session: &mut dyn ImportSession = &mut session;

        let error = session.vacuum_analyze("l10n", "languages").await.unwrap_err();
        assert!(error.to_string().contains("already closed"));
        assert!(session.commit().await.is_err());
        assert!(session.close().await.is_err());
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("l10n"), "\"l10n\"");
        assert_eq!(quote_ident("Mixed Case"), "\"Mixed Case\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_ident(""), "\"\"");
    }

    #[test]
    fn test_vacuum_analyze_statement() {
        assert_eq!(
            vacuum_analyze_statement("l10n", "languages"),
            "VACUUM ANALYZE \"l10n\".\"languages\""
        );
        assert_eq!(
            vacuum_analyze_statement("l10n", "x\"; DROP TABLE t; --"),
            "VACUUM ANALYZE \"l10n\".\"x\"\"; DROP TABLE t; --\""
        );
    }
}
