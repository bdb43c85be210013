//! Guarded decorators, one per connection-family role.
//!
//! Each decorator exclusively owns its raw delegate and shares the
//! process-wide [`Reconnector`]. Connection-producing operations return
//! freshly wrapped decorators; plain values pass through untouched.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::{
    CallableStatement, Connection, DatabaseMetadata, PreparedStatement, ResultSet, Statement,
};
use crate::error::DbError;
use crate::proxy::Reconnector;

/// Fail fast, forward to the delegate, absorb network failures.
macro_rules! forward {
    ($self:ident, $call:expr) => {{
        $self.shared.ensure_available()?;
        match $call.await {
            Ok(value) => Ok(value),
            Err(error) => Err($self.shared.absorb(error).await),
        }
    }};
}

/// Same interception for synchronous calls; these never touch the
/// network, so classification is not involved.
macro_rules! forward_sync {
    ($self:ident, $call:expr) => {{
        $self.shared.ensure_available()?;
        $call
    }};
}

pub struct GuardedConnection {
    inner: Box<dyn Connection>,
    shared: Arc<Reconnector>,
}

impl GuardedConnection {
    pub(crate) fn new(inner: Box<dyn Connection>, shared: Arc<Reconnector>) -> Self {
        Self { inner, shared }
    }
}

impl std::fmt::Debug for GuardedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedConnection").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for GuardedConnection {
    async fn create_statement(&mut self) -> Result<Box<dyn Statement>, DbError> {
        let raw = forward!(self, self.inner.create_statement())?;
        Ok(Box::new(GuardedStatement {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn prepare_statement(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement>, DbError> {
        let raw = forward!(self, self.inner.prepare_statement(sql))?;
        Ok(Box::new(GuardedPreparedStatement {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn CallableStatement>, DbError> {
        let raw = forward!(self, self.inner.prepare_call(sql))?;
        Ok(Box::new(GuardedCallableStatement {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn metadata(&mut self) -> Result<Box<dyn DatabaseMetadata>, DbError> {
        let raw = forward!(self, self.inner.metadata())?;
        Ok(Box::new(GuardedMetadata {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn is_closed(&self) -> Result<bool, DbError> {
        forward!(self, self.inner.is_closed())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        // Intercepted like any other call, then simply forwarded.
        forward!(self, self.inner.close())
    }
}

pub struct GuardedStatement {
    inner: Box<dyn Statement>,
    shared: Arc<Reconnector>,
}

#[async_trait]
impl Statement for GuardedStatement {
    async fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, DbError> {
        let raw = forward!(self, self.inner.execute_query(sql))?;
        Ok(Box::new(GuardedResultSet {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn execute_update(&mut self, sql: &str) -> Result<u64, DbError> {
        forward!(self, self.inner.execute_update(sql))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        forward!(self, self.inner.close())
    }
}

pub struct GuardedPreparedStatement {
    inner: Box<dyn PreparedStatement>,
    shared: Arc<Reconnector>,
}

#[async_trait]
impl Statement for GuardedPreparedStatement {
    async fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, DbError> {
        let raw = forward!(self, self.inner.execute_query(sql))?;
        Ok(Box::new(GuardedResultSet {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn execute_update(&mut self, sql: &str) -> Result<u64, DbError> {
        forward!(self, self.inner.execute_update(sql))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        forward!(self, self.inner.close())
    }
}

#[async_trait]
impl PreparedStatement for GuardedPreparedStatement {
    fn bind(&mut self, index: usize, value: Value) -> Result<(), DbError> {
        forward_sync!(self, self.inner.bind(index, value))
    }

    async fn query(&mut self) -> Result<Box<dyn ResultSet>, DbError> {
        let raw = forward!(self, self.inner.query())?;
        Ok(Box::new(GuardedResultSet {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn update(&mut self) -> Result<u64, DbError> {
        forward!(self, self.inner.update())
    }
}

pub struct GuardedCallableStatement {
    inner: Box<dyn CallableStatement>,
    shared: Arc<Reconnector>,
}

#[async_trait]
impl Statement for GuardedCallableStatement {
    async fn execute_query(&mut self, sql: &str) -> Result<Box<dyn ResultSet>, DbError> {
        let raw = forward!(self, self.inner.execute_query(sql))?;
        Ok(Box::new(GuardedResultSet {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn execute_update(&mut self, sql: &str) -> Result<u64, DbError> {
        forward!(self, self.inner.execute_update(sql))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        forward!(self, self.inner.close())
    }
}

#[async_trait]
impl PreparedStatement for GuardedCallableStatement {
    fn bind(&mut self, index: usize, value: Value) -> Result<(), DbError> {
        forward_sync!(self, self.inner.bind(index, value))
    }

    async fn query(&mut self) -> Result<Box<dyn ResultSet>, DbError> {
        let raw = forward!(self, self.inner.query())?;
        Ok(Box::new(GuardedResultSet {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn update(&mut self) -> Result<u64, DbError> {
        forward!(self, self.inner.update())
    }
}

#[async_trait]
impl CallableStatement for GuardedCallableStatement {
    fn register_out(&mut self, index: usize) -> Result<(), DbError> {
        forward_sync!(self, self.inner.register_out(index))
    }

    fn out_value(&self, index: usize) -> Result<Value, DbError> {
        forward_sync!(self, self.inner.out_value(index))
    }
}

pub struct GuardedMetadata {
    inner: Box<dyn DatabaseMetadata>,
    shared: Arc<Reconnector>,
}

#[async_trait]
impl DatabaseMetadata for GuardedMetadata {
    async fn product_name(&mut self) -> Result<String, DbError> {
        forward!(self, self.inner.product_name())
    }

    async fn product_version(&mut self) -> Result<String, DbError> {
        forward!(self, self.inner.product_version())
    }

    async fn tables(&mut self, name_pattern: &str) -> Result<Box<dyn ResultSet>, DbError> {
        let raw = forward!(self, self.inner.tables(name_pattern))?;
        Ok(Box::new(GuardedResultSet {
            inner: raw,
            shared: Arc::clone(&self.shared),
        }))
    }
}

pub struct GuardedResultSet {
    inner: Box<dyn ResultSet>,
    shared: Arc<Reconnector>,
}

#[async_trait]
impl ResultSet for GuardedResultSet {
    async fn next(&mut self) -> Result<bool, DbError> {
        forward!(self, self.inner.next())
    }

    fn get(&self, index: usize) -> Result<Value, DbError> {
        forward_sync!(self, self.inner.get(index))
    }

    async fn close(&mut self) -> Result<(), DbError> {
        forward!(self, self.inner.close())
    }
}
