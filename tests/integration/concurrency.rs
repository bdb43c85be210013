//! Rebuild election under concurrent network failures.

use std::sync::Arc;
use std::time::Duration;

use dbguard::config::DatabaseConfig;
use dbguard::driver::Connection;
use dbguard::testing::{MockProvider, socket_reset};
use dbguard::{DbError, PersistenceService};
use tokio::sync::Barrier;

/// Several tasks hit a dead socket at the same time. Only one of them
/// may rebuild the pool; the rest must join the in-flight rebuild and
/// fail fast, so the pool is built exactly once beyond startup.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_failures_produce_a_single_rebuild() {
    const TASKS: usize = 8;

    let provider = MockProvider::new();
    let script = provider.script();
    let service = PersistenceService::connect(Box::new(provider), DatabaseConfig::default())
        .await
        .unwrap();

    // Check out one connection per task up front, then make every
    // statement creation fail with a dropped socket. The slow rebuild
    // keeps the episode open long enough for all tasks to pile in.
    let mut connections = Vec::new();
    for _ in 0..TASKS {
        connections.push(service.get_connection().await.unwrap());
    }
    for _ in 0..TASKS {
        script.plan_failure("create_statement", socket_reset());
    }
    script.set_build_delay(Duration::from_millis(750));

    let barrier = Arc::new(Barrier::new(TASKS));
    let mut workers = Vec::new();

    for mut conn in connections {
        let barrier = Arc::clone(&barrier);
        workers.push(tokio::spawn(async move {
            barrier.wait().await;
            conn.create_statement().await.map(|_| ())
        }));
    }

    for worker in workers {
        let result = worker.await.unwrap();
        assert!(matches!(result, Err(DbError::Unavailable)));
    }

    // One pool at startup, one from the single elected rebuild.
    assert_eq!(script.pools_built(), 2);
    assert!(!service.is_rebuilding());

    // Tasks rejected at the guard never consumed their planned failure.
    script.clear_planned();

    // And the service serves again once the episode is over.
    script.set_build_delay(Duration::from_millis(0));
    let mut conn = service.get_connection().await.unwrap();
    let _statement = conn.create_statement().await.unwrap();
    assert_eq!(script.last_acquire_pool(), Some(2));
}

/// Callers that arrive while the rebuild is still running are rejected
/// before they ever reach the driver.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_arrivals_fail_fast_during_the_rebuild() {
    let provider = MockProvider::new();
    let script = provider.script();
    let service = PersistenceService::connect(Box::new(provider), DatabaseConfig::default())
        .await
        .unwrap();

    let mut conn = service.get_connection().await.unwrap();
    let acquires_before = script.acquires();

    script.plan_failure("create_statement", socket_reset());
    script.set_build_delay(Duration::from_millis(750));

    let trigger = tokio::spawn(async move { conn.create_statement().await.map(|_| ()) });

    // Let the trigger task start its rebuild, then knock on the door.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(service.is_rebuilding());

    let err = service.get_connection().await.unwrap_err();
    assert!(matches!(err, DbError::Unavailable));
    // The rejected call never touched the pool.
    assert_eq!(script.acquires(), acquires_before);

    assert!(matches!(
        trigger.await.unwrap(),
        Err(DbError::Unavailable)
    ));
    assert!(!service.is_rebuilding());
}
