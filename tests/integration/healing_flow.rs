//! End-to-end healing scenarios through the public API.

use std::sync::Arc;

use dbguard::config::DatabaseConfig;
use dbguard::driver::{CallableStatement, Connection, PreparedStatement, Statement};
use dbguard::testing::{DriverScript, MockProvider, socket_reset, sql_failure};
use dbguard::database::string_cell;
use dbguard::{
    DbError, PersistenceService, close_result_set, close_statement, map_rows, release_connection,
};
use serde_json::{Value, json};

async fn service_with_cap(max_connections: Option<u32>) -> (PersistenceService, Arc<DriverScript>) {
    let provider = MockProvider::new();
    let script = provider.script();

    let config = DatabaseConfig {
        max_connections,
        ..DatabaseConfig::default()
    };
    let service = PersistenceService::connect(Box::new(provider), config)
        .await
        .unwrap();

    (service, script)
}

#[tokio::test]
async fn socket_drop_mid_read_heals_the_pool() {
    let (service, script) = service_with_cap(Some(10)).await;
    script.set_rows(vec![vec![json!(1)], vec![json!(2)]]);

    let mut conn = service.get_connection().await.unwrap();
    let mut statement = conn.create_statement().await.unwrap();
    let mut rows = statement
        .execute_query("SELECT id FROM accounts")
        .await
        .unwrap();

    assert!(rows.next().await.unwrap());

    // The socket dies between two rows.
    script.plan_failure("next", socket_reset());
    let err = rows.next().await.unwrap_err();

    // The caller never sees the raw network error, and exactly one
    // rebuild happened.
    assert!(matches!(err, DbError::Unavailable));
    assert_eq!(script.pools_built(), 2);
    assert!(!service.is_rebuilding());

    close_result_set(&mut *rows).await;
    close_statement(&mut *statement).await;
    release_connection(&mut conn).await;

    // Re-acquiring succeeds against the freshly built pool.
    let _conn = service.get_connection().await.unwrap();
    assert_eq!(script.last_acquire_pool(), Some(2));
}

#[tokio::test]
async fn syntax_error_passes_through_without_a_rebuild() {
    let (service, script) = service_with_cap(Some(10)).await;

    let mut conn = service.get_connection().await.unwrap();
    let mut statement = conn.create_statement().await.unwrap();

    script.plan_failure("execute_query", sql_failure("syntax error at or near \"SELCT\""));
    let err = statement.execute_query("SELCT 1").await.unwrap_err();

    assert!(err.to_string().contains("syntax error at or near \"SELCT\""));
    assert!(!service.is_rebuilding());
    assert_eq!(script.pools_built(), 1);
}

#[tokio::test]
async fn uncapped_pool_configuration_is_honored() {
    let (_service, script) = service_with_cap(None).await;
    assert_eq!(script.pools_built(), 1);
}

#[tokio::test]
async fn every_branch_of_the_handle_tree_is_guarded() {
    let (service, script) = service_with_cap(Some(10)).await;
    script.set_rows(vec![vec![json!("alice")]]);

    let mut conn = service.get_connection().await.unwrap();

    // connection -> metadata -> result set
    let mut metadata = conn.metadata().await.unwrap();
    let mut tables = metadata.tables("%").await.unwrap();
    script.plan_failure("next", socket_reset());
    assert!(matches!(
        tables.next().await.unwrap_err(),
        DbError::Unavailable
    ));
    assert_eq!(script.pools_built(), 2);

    // connection -> prepared statement -> result set, on a fresh
    // connection from the rebuilt pool.
    let mut conn = service.get_connection().await.unwrap();
    let mut prepared = conn
        .prepare_statement("SELECT name FROM accounts WHERE id = ?")
        .await
        .unwrap();
    prepared.bind(1, json!(7)).unwrap();
    let mut rows = prepared.query().await.unwrap();

    script.plan_failure("next", socket_reset());
    assert!(matches!(rows.next().await.unwrap_err(), DbError::Unavailable));
    assert_eq!(script.pools_built(), 3);
}

#[tokio::test]
async fn callable_statements_pass_plain_values_through() {
    let (service, _script) = service_with_cap(Some(10)).await;

    let mut conn = service.get_connection().await.unwrap();
    let mut call = conn.prepare_call("{call settle_account(?)}").await.unwrap();

    call.bind(1, json!(7)).unwrap();
    call.register_out(2).unwrap();
    call.update().await.unwrap();

    // Out parameters are plain values: no wrapping involved.
    assert_eq!(call.out_value(2).unwrap(), Value::Null);
    assert!(call.out_value(3).is_err());
}

#[tokio::test]
async fn mapped_reads_work_through_the_guarded_tree() {
    let (service, script) = service_with_cap(Some(10)).await;
    script.set_rows(vec![vec![json!(" alice ")], vec![json!("bob")]]);

    let mut conn = service.get_connection().await.unwrap();
    let mut statement = conn.create_statement().await.unwrap();
    let mut rows = statement
        .execute_query("SELECT name FROM accounts")
        .await
        .unwrap();

    let names = map_rows(&mut *rows, &|row: &dyn dbguard::driver::ResultSet| {
        string_cell(row, 0)
    })
    .await
    .unwrap();

    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
}

#[tokio::test]
async fn release_helpers_never_raise() {
    let (service, script) = service_with_cap(Some(10)).await;

    let mut conn = service.get_connection().await.unwrap();
    let mut statement = conn.create_statement().await.unwrap();

    // A close failure is swallowed, and releasing again is fine.
    script.plan_failure("close", sql_failure("cursor already gone"));
    close_statement(&mut *statement).await;
    close_statement(&mut *statement).await;

    release_connection(&mut conn).await;
    release_connection(&mut conn).await;
    assert_eq!(script.connection_closes(), 1);
}
