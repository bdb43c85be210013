//! The scripted mock driver.

use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::{
    CallableStatement, Connection, DatabaseMetadata, Pool, PoolOptions, PoolProvider,
    PreparedStatement, ResultSet, Statement,
};
use crate::error::{BoxError, DbError};

/// A database failure with an optional cause, for building the nested
/// error chains real drivers produce.
#[derive(Debug)]
pub struct SqlFailure {
    message: String,
    cause: Option<BoxError>,
}

impl SqlFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn caused_by(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }
}

impl fmt::Display for SqlFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for SqlFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Shared brain of the mock driver.
///
/// Tests plan one-shot failures per operation name, can rows for the
/// next query, and read back counters afterwards.
#[derive(Debug, Default)]
pub struct DriverScript {
    pools_built: AtomicUsize,
    acquires: AtomicUsize,
    statements_created: AtomicUsize,
    connection_closes: AtomicUsize,
    statement_closes: AtomicUsize,
    result_set_closes: AtomicUsize,
    last_acquire_pool: Mutex<Option<usize>>,
    next_build_failure: Mutex<Option<String>>,
    build_delay: Mutex<Option<Duration>>,
    planned: Mutex<HashMap<&'static str, VecDeque<DbError>>>,
    rows: Mutex<Vec<Vec<Value>>>,
}

impl DriverScript {
    /// Queue a failure for the next invocation of `operation`
    /// (`"acquire"`, `"execute_query"`, `"next"`, `"close"`, …).
    pub fn plan_failure(&self, operation: &'static str, error: DbError) {
        self.planned
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Make the next pool build fail with a configuration error.
    pub fn fail_next_build(&self, message: impl Into<String>) {
        *self.next_build_failure.lock().unwrap() = Some(message.into());
    }

    /// Slow every pool build down, so tests can hold a rebuild open long
    /// enough for concurrent callers to pile up against it.
    pub fn set_build_delay(&self, delay: Duration) {
        *self.build_delay.lock().unwrap() = Some(delay);
    }

    /// Drop planned failures that were never consumed (calls rejected at
    /// the guard before reaching the driver do not consume theirs).
    pub fn clear_planned(&self) {
        self.planned.lock().unwrap().clear();
    }

    /// Rows served by every subsequent query.
    pub fn set_rows(&self, rows: Vec<Vec<Value>>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn pools_built(&self) -> usize {
        self.pools_built.load(Ordering::SeqCst)
    }

    pub fn acquires(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    pub fn statements_created(&self) -> usize {
        self.statements_created.load(Ordering::SeqCst)
    }

    pub fn connection_closes(&self) -> usize {
        self.connection_closes.load(Ordering::SeqCst)
    }

    pub fn statement_closes(&self) -> usize {
        self.statement_closes.load(Ordering::SeqCst)
    }

    pub fn result_set_closes(&self) -> usize {
        self.result_set_closes.load(Ordering::SeqCst)
    }

    /// Which pool (1-based build ordinal) served the most recent acquire.
    pub fn last_acquire_pool(&self) -> Option<usize> {
        *self.last_acquire_pool.lock().unwrap()
    }

    fn take(&self, operation: &'static str) -> Option<DbError> {
        self.planned
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
    }

    fn rows_snapshot(&self) -> Vec<Vec<Value>> {
        self.rows.lock().unwrap().clone()
    }
}

/// Pool provider handed to [`ConnectionSource::connect`].
///
/// [`ConnectionSource::connect`]: crate::database::ConnectionSource::connect
pub struct MockProvider {
    script: Arc<DriverScript>,
}

impl MockProvider {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            script: Arc::new(DriverScript::default()),
        }
    }

    pub fn script(&self) -> Arc<DriverScript> {
        Arc::clone(&self.script)
    }
}

#[async_trait]
impl PoolProvider for MockProvider {
    async fn build(&self, _options: &PoolOptions) -> Result<Box<dyn Pool>, DbError> {
        if let Some(message) = self.script.next_build_failure.lock().unwrap().take() {
            return Err(DbError::Config(message));
        }

        let delay = *self.script.build_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let ordinal = self.script.pools_built.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MockPool {
            script: Arc::clone(&self.script),
            ordinal,
        }))
    }
}

struct MockPool {
    script: Arc<DriverScript>,
    ordinal: usize,
}

#[async_trait]
impl Pool for MockPool {
    async fn acquire(&self) -> Result<Box<dyn Connection>, DbError> {
        if let Some(error) = self.script.take("acquire") {
            return Err(error);
        }

        self.script.acquires.fetch_add(1, Ordering::SeqCst);
        *self.script.last_acquire_pool.lock().unwrap() = Some(self.ordinal);

        Ok(Box::new(MockConnection {
            script: Arc::clone(&self.script),
            closed: false,
        }))
    }
}

struct MockConnection {
    script: Arc<DriverScript>,
    closed: bool,
}

#[async_trait]
impl Connection for MockConnection {
    async fn create_statement(&mut self) -> Result<Box<dyn Statement>, DbError> {
        if let Some(error) = self.script.take("create_statement") {
            return Err(error);
        }
        self.script.statements_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStatement {
            script: Arc::clone(&self.script),
        }))
    }

    async fn prepare_statement(&mut self, _sql: &str) -> Result<Box<dyn PreparedStatement>, DbError> {
        if let Some(error) = self.script.take("prepare_statement") {
            return Err(error);
        }
        self.script.statements_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPreparedStatement {
            script: Arc::clone(&self.script),
            params: Vec::new(),
        }))
    }

    async fn prepare_call(&mut self, _sql: &str) -> Result<Box<dyn CallableStatement>, DbError> {
        if let Some(error) = self.script.take("prepare_call") {
            return Err(error);
        }
        self.script.statements_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCallableStatement {
            script: Arc::clone(&self.script),
            params: Vec::new(),
            registered: HashSet::new(),
        }))
    }

    async fn metadata(&mut self) -> Result<Box<dyn DatabaseMetadata>, DbError> {
        if let Some(error) = self.script.take("metadata") {
            return Err(error);
        }
        Ok(Box::new(MockMetadata {
            script: Arc::clone(&self.script),
        }))
    }

    async fn is_closed(&self) -> Result<bool, DbError> {
        Ok(self.closed)
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(error) = self.script.take("close") {
            return Err(error);
        }
        self.closed = true;
        self.script.connection_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockStatement {
    script: Arc<DriverScript>,
}

#[async_trait]
impl Statement for MockStatement {
    async fn execute_query(&mut self, _sql: &str) -> Result<Box<dyn ResultSet>, DbError> {
        if let Some(error) = self.script.take("execute_query") {
            return Err(error);
        }
        Ok(Box::new(MockResultSet::over(
            Arc::clone(&self.script),
            self.script.rows_snapshot(),
        )))
    }

    async fn execute_update(&mut self, _sql: &str) -> Result<u64, DbError> {
        if let Some(error) = self.script.take("execute_update") {
            return Err(error);
        }
        Ok(1)
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(error) = self.script.take("close") {
            return Err(error);
        }
        self.script.statement_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockPreparedStatement {
    script: Arc<DriverScript>,
    params: Vec<(usize, Value)>,
}

#[async_trait]
impl Statement for MockPreparedStatement {
    async fn execute_query(&mut self, _sql: &str) -> Result<Box<dyn ResultSet>, DbError> {
        if let Some(error) = self.script.take("execute_query") {
            return Err(error);
        }
        Ok(Box::new(MockResultSet::over(
            Arc::clone(&self.script),
            self.script.rows_snapshot(),
        )))
    }

    async fn execute_update(&mut self, _sql: &str) -> Result<u64, DbError> {
        if let Some(error) = self.script.take("execute_update") {
            return Err(error);
        }
        Ok(1)
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(error) = self.script.take("close") {
            return Err(error);
        }
        self.script.statement_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PreparedStatement for MockPreparedStatement {
    fn bind(&mut self, index: usize, value: Value) -> Result<(), DbError> {
        self.params.push((index, value));
        Ok(())
    }

    async fn query(&mut self) -> Result<Box<dyn ResultSet>, DbError> {
        if let Some(error) = self.script.take("query") {
            return Err(error);
        }
        Ok(Box::new(MockResultSet::over(
            Arc::clone(&self.script),
            self.script.rows_snapshot(),
        )))
    }

    async fn update(&mut self) -> Result<u64, DbError> {
        if let Some(error) = self.script.take("update") {
            return Err(error);
        }
        Ok(self.params.len() as u64)
    }
}

struct MockCallableStatement {
    script: Arc<DriverScript>,
    params: Vec<(usize, Value)>,
    registered: HashSet<usize>,
}

#[async_trait]
impl Statement for MockCallableStatement {
    async fn execute_query(&mut self, _sql: &str) -> Result<Box<dyn ResultSet>, DbError> {
        if let Some(error) = self.script.take("execute_query") {
            return Err(error);
        }
        Ok(Box::new(MockResultSet::over(
            Arc::clone(&self.script),
            self.script.rows_snapshot(),
        )))
    }

    async fn execute_update(&mut self, _sql: &str) -> Result<u64, DbError> {
        if let Some(error) = self.script.take("execute_update") {
            return Err(error);
        }
        Ok(1)
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(error) = self.script.take("close") {
            return Err(error);
        }
        self.script.statement_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PreparedStatement for MockCallableStatement {
    fn bind(&mut self, index: usize, value: Value) -> Result<(), DbError> {
        self.params.push((index, value));
        Ok(())
    }

    async fn query(&mut self) -> Result<Box<dyn ResultSet>, DbError> {
        if let Some(error) = self.script.take("query") {
            return Err(error);
        }
        Ok(Box::new(MockResultSet::over(
            Arc::clone(&self.script),
            self.script.rows_snapshot(),
        )))
    }

    async fn update(&mut self) -> Result<u64, DbError> {
        if let Some(error) = self.script.take("update") {
            return Err(error);
        }
        Ok(self.params.len() as u64)
    }
}

#[async_trait]
impl CallableStatement for MockCallableStatement {
    fn register_out(&mut self, index: usize) -> Result<(), DbError> {
        self.registered.insert(index);
        Ok(())
    }

    fn out_value(&self, index: usize) -> Result<Value, DbError> {
        if self.registered.contains(&index) {
            Ok(Value::Null)
        } else {
            Err(DbError::driver(io::Error::other(format!(
                "out parameter {index} was never registered"
            ))))
        }
    }
}

struct MockMetadata {
    script: Arc<DriverScript>,
}

#[async_trait]
impl DatabaseMetadata for MockMetadata {
    async fn product_name(&mut self) -> Result<String, DbError> {
        if let Some(error) = self.script.take("product_name") {
            return Err(error);
        }
        Ok("mockdb".to_string())
    }

    async fn product_version(&mut self) -> Result<String, DbError> {
        Ok("1.0".to_string())
    }

    async fn tables(&mut self, _name_pattern: &str) -> Result<Box<dyn ResultSet>, DbError> {
        if let Some(error) = self.script.take("tables") {
            return Err(error);
        }
        Ok(Box::new(MockResultSet::over(
            Arc::clone(&self.script),
            vec![vec![Value::from("users")], vec![Value::from("orders")]],
        )))
    }
}

struct MockResultSet {
    script: Arc<DriverScript>,
    rows: Vec<Vec<Value>>,
    position: usize,
    current: Option<Vec<Value>>,
}

impl MockResultSet {
    fn over(script: Arc<DriverScript>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            script,
            rows,
            position: 0,
            current: None,
        }
    }
}

#[async_trait]
impl ResultSet for MockResultSet {
    async fn next(&mut self) -> Result<bool, DbError> {
        if let Some(error) = self.script.take("next") {
            return Err(error);
        }

        if self.position < self.rows.len() {
            self.current = Some(self.rows[self.position].clone());
            self.position += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn get(&self, index: usize) -> Result<Value, DbError> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| DbError::driver(io::Error::other("no current row")))?;

        row.get(index).cloned().ok_or_else(|| {
            DbError::driver(io::Error::other(format!("no column {index} in current row")))
        })
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if let Some(error) = self.script.take("close") {
            return Err(error);
        }
        self.script.result_set_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
