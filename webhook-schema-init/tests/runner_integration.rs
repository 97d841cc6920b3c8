//! Integration tests for the schema init runner.
//!
//! These tests use the real runner and initializer but swap MongoDB for the
//! in-memory catalog (or a deliberately stalled one) so they run anywhere.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use webhook_schema::{
    CatalogOp, ExistingIndex, InMemoryCatalog, IndexSpec, InitError, SchemaCatalog,
    SortDirection,
};
use webhook_schema_init::{
    connect_and_run, run, BootstrapError, Dependencies, InitConfig, Outcome, RunMode,
};

const DB: &str = "webhook_db";
const COLL: &str = "webhook_requests";
const LIMIT: Duration = Duration::from_secs(30);

fn config(mode: &str) -> InitConfig {
    let vars: HashMap<&str, &str> = HashMap::from([("SCHEMA_INIT_MODE", mode)]);
    InitConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn deps(catalog: &Arc<InMemoryCatalog>, mode: &str) -> Dependencies {
    Dependencies::with_catalog(&config(mode), catalog.clone())
}

// A catalog whose server never answers.
struct StalledCatalog {
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl SchemaCatalog for StalledCatalog {
    async fn ping(&self) -> Result<(), InitError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn collection_exists(&self, _: &str, _: &str) -> Result<bool, InitError> {
        Ok(false)
    }

    async fn create_collection(&self, _: &str, _: &str) -> Result<bool, InitError> {
        panic!("must not mutate after a timeout");
    }

    async fn list_indexes(&self, _: &str, _: &str) -> Result<Vec<ExistingIndex>, InitError> {
        Ok(Vec::new())
    }

    async fn create_index(&self, _: &str, _: &str, _: &IndexSpec) -> Result<String, InitError> {
        panic!("must not mutate after a timeout");
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_apply_on_empty_server() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let outcome = run(deps(&catalog, "apply"), RunMode::Apply, LIMIT)
        .await
        .unwrap();

    match outcome {
        Outcome::Initialized(report) => {
            assert!(report.collection_created);
            assert_eq!(report.created.len(), 4);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(catalog.indexes(DB, COLL).await.len(), 5);
    assert!(catalog.is_closed());
}

#[tokio::test]
async fn test_apply_twice_leaves_same_state() {
    let catalog = Arc::new(InMemoryCatalog::new());
    run(deps(&catalog, "apply"), RunMode::Apply, LIMIT)
        .await
        .unwrap();
    let state = catalog.indexes(DB, COLL).await;

    let outcome = run(deps(&catalog, "apply"), RunMode::Apply, LIMIT)
        .await
        .unwrap();
    let Outcome::Initialized(report) = outcome else {
        panic!("expected an initialization report");
    };
    assert!(report.created.is_empty());
    assert_eq!(catalog.indexes(DB, COLL).await, state);
}

#[tokio::test]
async fn test_check_reports_drift_without_changes() {
    let catalog = Arc::new(InMemoryCatalog::new().with_collection(DB, COLL, 10));
    let err = run(deps(&catalog, "check"), RunMode::Check, LIMIT)
        .await
        .unwrap_err();

    match &err {
        BootstrapError::Drift {
            collection_missing,
            pending,
        } => {
            assert!(!collection_missing);
            assert_eq!(pending.len(), 4);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.exit_code(), 5);
    assert_eq!(catalog.mutation_count(), 0);
    assert!(catalog.is_closed());
}

#[tokio::test]
async fn test_check_after_apply_is_up_to_date() {
    let catalog = Arc::new(InMemoryCatalog::new());
    run(deps(&catalog, "apply"), RunMode::Apply, LIMIT)
        .await
        .unwrap();

    let outcome = run(deps(&catalog, "check"), RunMode::Check, LIMIT)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Checked(plan) if plan.is_up_to_date()));
}

#[tokio::test]
async fn test_conflict_fails_and_closes() {
    let reversed = IndexSpec::single("method", SortDirection::Descending).unwrap();
    let catalog = Arc::new(InMemoryCatalog::new().with_index(
        DB,
        COLL,
        ExistingIndex::from_spec(&reversed),
    ));
    let err = run(deps(&catalog, "apply"), RunMode::Apply, LIMIT)
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 4);
    assert_eq!(catalog.mutation_count(), 0);
    assert!(catalog.is_closed());
}

#[tokio::test]
async fn test_connection_refused_fails_and_closes() {
    let catalog = Arc::new(
        InMemoryCatalog::new().with_failure(CatalogOp::Ping, InitError::connection("refused")),
    );
    let err = run(deps(&catalog, "apply"), RunMode::Apply, LIMIT)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Init(InitError::ConnectionError(_))
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(catalog.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_connection_error() {
    let closed = Arc::new(AtomicBool::new(false));
    let catalog = Arc::new(StalledCatalog {
        closed: closed.clone(),
    });
    let deps = Dependencies::with_catalog(&config("apply"), catalog);

    let err = run(deps, RunMode::Apply, Duration::from_secs(5))
        .await
        .unwrap_err();

    match err {
        BootstrapError::Init(InitError::ConnectionError(msg)) => assert!(msg.contains("5s")),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_slow_connect_counts_against_limit() {
    let connect = async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        let catalog = Arc::new(InMemoryCatalog::new());
        Ok::<_, BootstrapError>(Dependencies::with_catalog(&config("apply"), catalog))
    };

    let err = connect_and_run(connect, RunMode::Apply, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Init(InitError::ConnectionError(ref msg)) if msg.contains("5s")
    ));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_connect_time_is_deducted_from_run_limit() {
    let closed = Arc::new(AtomicBool::new(false));
    let stalled = Arc::new(StalledCatalog {
        closed: closed.clone(),
    });
    let connect = async move {
        tokio::time::sleep(Duration::from_secs(4)).await;
        Ok::<_, BootstrapError>(Dependencies::with_catalog(&config("apply"), stalled))
    };

    let started = tokio::time::Instant::now();
    let err = connect_and_run(connect, RunMode::Apply, Duration::from_secs(5))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 2);
    assert!(started.elapsed() < Duration::from_secs(6));
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_connect_and_run_applies_schema() {
    let catalog = Arc::new(InMemoryCatalog::new());
    let connect = async { Ok::<_, BootstrapError>(deps(&catalog, "apply")) };

    let outcome = connect_and_run(connect, RunMode::Apply, LIMIT).await.unwrap();

    assert!(matches!(outcome, Outcome::Initialized(ref report) if report.created.len() == 4));
    assert!(catalog.is_closed());
}
