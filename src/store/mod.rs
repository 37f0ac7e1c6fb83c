//! Pooled SQLite store shared by every handler.
//!
//! The store is created once in `main` and handed to actix as `web::Data`. Workflows receive a
//! `&mut SqliteConnection` and open their own transaction on it.

pub mod allocator;

use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::HospitalResult;

pub use allocator::{IdSequence, next_id};

// Database connection pool type
pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const SCHEMA_SQL: &str = include_str!("../../migrations/0001_hospital_schema.sql");

/// Pragmas every pooled connection needs before it serves a request.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas {
    busy_timeout: Duration,
    /// Set for `:memory:`, where each new connection starts from an empty database.
    apply_schema: bool,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(r2d2::Error::QueryError)?;
        if self.apply_schema {
            conn.batch_execute(SCHEMA_SQL)
                .map_err(r2d2::Error::QueryError)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct HospitalStore {
    pool: DbPool,
}

impl HospitalStore {
    /// Build the pool and make sure the schema exists.
    pub fn open(config: &DatabaseConfig) -> HospitalResult<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(config.url.as_str());
        let mut builder = r2d2::Pool::builder()
            .max_size(config.pool_size)
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout: config.busy_timeout,
                apply_schema: config.is_memory(),
            }));
        if config.is_memory() {
            // The single connection is the database; the reaper must never replace it.
            builder = builder.idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;

        let store = Self { pool };
        let mut conn = store.conn()?;
        if !config.is_memory() {
            conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        }
        conn.batch_execute(SCHEMA_SQL)?;
        tracing::info!(url = %config.url, pool_size = config.pool_size, "store ready");

        Ok(store)
    }

    /// Check out a connection for synchronous callers.
    pub fn conn(&self) -> HospitalResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Run blocking store work on actix's blocking pool.
    pub async fn run<F, T>(&self, f: F) -> HospitalResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> HospitalResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }

    pub async fn ping(&self) -> HospitalResult<()> {
        self.run(|conn| Ok(conn.batch_execute("SELECT 1;")?)).await
    }
}
