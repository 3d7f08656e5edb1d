//! Blocking PostgreSQL connection.

use keel_migrate::{Connection, Dialect, MigrateResult};
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::{debug, trace};

use crate::config::PgConfig;
use crate::error::{PgError, PgResult};

/// A PostgreSQL client used for migrations and schema snapshots.
pub struct PostgresDatabase {
    client: Client,
    schema: String,
}

impl std::fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl PostgresDatabase {
    /// Connect using a parsed configuration.
    pub fn open_with(config: &PgConfig) -> PgResult<Self> {
        let mut client = config.to_pg_config().connect(NoTls)?;
        debug!(host = %config.host, database = %config.database, "connected to postgres");

        let session = config.session_sql();
        if !session.is_empty() {
            client.batch_execute(&session)?;
        }
        Ok(Self {
            client,
            schema: config.schema_name().to_string(),
        })
    }

    /// Connect to a `postgres://` URL.
    pub fn connect(url: &str) -> PgResult<Self> {
        Self::open_with(&PgConfig::from_url(url)?)
    }

    /// Wrap an existing client working in `schema`.
    pub fn from_client(client: Client, schema: impl Into<String>) -> Self {
        Self {
            client,
            schema: schema.into(),
        }
    }

    /// Schema snapshots read by default.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// The underlying client.
    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }
}

fn bind<'a>(params: &'a [Option<&'a str>]) -> Vec<&'a (dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl Connection for PostgresDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str) -> MigrateResult<()> {
        trace!(sql = %sql, "executing batch");
        self.client.batch_execute(sql).map_err(PgError::from)?;
        Ok(())
    }

    fn execute_with(&mut self, sql: &str, params: &[Option<&str>]) -> MigrateResult<u64> {
        trace!(sql = %sql, params = params.len(), "executing statement");
        Ok(self.client.execute(sql, &bind(params)).map_err(PgError::from)?)
    }

    fn query_row(
        &mut self,
        sql: &str,
        params: &[Option<&str>],
    ) -> MigrateResult<Option<Vec<Option<String>>>> {
        trace!(sql = %sql, "querying row");
        let Some(row) = self
            .client
            .query_opt(sql, &bind(params))
            .map_err(PgError::from)?
        else {
            return Ok(None);
        };

        let values = (0..row.len())
            .map(|i| row.try_get::<_, Option<String>>(i))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PgError::from)?;
        Ok(Some(values))
    }

    fn table_exists(&mut self, table: &str) -> MigrateResult<bool> {
        let (schema, name) = match table.split_once('.') {
            Some((schema, name)) => (Some(schema), name),
            None => (None, table),
        };
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                     SELECT 1 FROM information_schema.tables
                     WHERE table_schema::text = COALESCE($1::text, current_schema()::text)
                       AND table_name::text = $2::text
                 )",
                &[&schema, &name],
            )
            .map_err(PgError::from)?;
        Ok(row.try_get::<_, bool>(0).map_err(PgError::from)?)
    }
}
