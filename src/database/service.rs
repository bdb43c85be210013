//! The application-facing persistence service.

use std::sync::Arc;

use crate::config::{DatabaseConfig, Validate};
use crate::database::ConnectionSource;
use crate::driver::{Connection, PoolProvider, ResultSet, Statement};
use crate::error::DbError;
use crate::proxy::{GuardedConnection, Reconnector};

/// Entry point for application code: hands out guarded connections and
/// owns the shared reconnection state.
///
/// Cloning is cheap and every clone shares the same guard and source, so
/// a rebuild triggered through one clone is observed by all of them.
#[derive(Clone, Debug)]
pub struct PersistenceService {
    shared: Arc<Reconnector>,
}

impl PersistenceService {
    /// Validate `config`, build the initial pool through `provider` and
    /// start the service.
    pub async fn connect(
        provider: Box<dyn PoolProvider>,
        config: DatabaseConfig,
    ) -> Result<Self, DbError> {
        config
            .validate()
            .map_err(|error| DbError::Config(error.to_string()))?;
        tracing::info!(database = %config.url(), "starting persistence service");

        let source = ConnectionSource::connect(provider, config.pool_options()).await?;

        Ok(Self {
            shared: Arc::new(Reconnector::new(source)),
        })
    }

    /// Like [`connect`], with the configuration loaded from files and
    /// environment (see [`crate::config::load`]).
    ///
    /// [`connect`]: PersistenceService::connect
    pub async fn from_env(provider: Box<dyn PoolProvider>) -> Result<Self, DbError> {
        let config = crate::config::load().map_err(|error| DbError::Config(error.to_string()))?;
        Self::connect(provider, config).await
    }

    /// Check a guarded connection out of the pool.
    ///
    /// Fails immediately with [`DbError::Unavailable`] while a rebuild is
    /// in flight. A network failure during acquisition itself triggers
    /// the rebuild and is reported as [`DbError::Unavailable`] too; any
    /// other acquisition failure propagates unchanged.
    pub async fn get_connection(&self) -> Result<GuardedConnection, DbError> {
        self.shared.ensure_available()?;

        match self.shared.source().acquire().await {
            Ok(raw) => Ok(GuardedConnection::new(raw, Arc::clone(&self.shared))),
            Err(error) => Err(self.shared.absorb(error).await),
        }
    }

    /// Whether a pool rebuild is currently in flight.
    pub fn is_rebuilding(&self) -> bool {
        self.shared.guard().is_rebuilding()
    }
}

/// Close a connection if it is still open. Failures raised purely by the
/// close attempt are logged and swallowed; they must never mask the
/// outcome of the operation that preceded them.
pub async fn close_connection(conn: &mut dyn Connection) {
    match conn.is_closed().await {
        Ok(true) => {}
        Ok(false) => {
            if let Err(error) = conn.close().await {
                tracing::debug!(error = %error, "ignoring connection close failure");
            }
        }
        Err(error) => tracing::debug!(error = %error, "ignoring connection close failure"),
    }
}

/// Close a statement, swallowing any close failure.
pub async fn close_statement(statement: &mut dyn Statement) {
    if let Err(error) = statement.close().await {
        tracing::debug!(error = %error, "ignoring statement close failure");
    }
}

/// Close a result set, swallowing any close failure.
pub async fn close_result_set(rows: &mut dyn ResultSet) {
    if let Err(error) = rows.close().await {
        tracing::debug!(error = %error, "ignoring result set close failure");
    }
}

/// Alias of [`close_connection`].
pub async fn release_connection(conn: &mut dyn Connection) {
    close_connection(conn).await;
}

/// Alias of [`close_statement`].
pub async fn release_statement(statement: &mut dyn Statement) {
    close_statement(statement).await;
}

/// Alias of [`close_result_set`].
pub async fn release_result_set(rows: &mut dyn ResultSet) {
    close_result_set(rows).await;
}
