//! Lifecycle events emitted by the engine

mod common;

use common::{orders, ts, FakeSource, T0, T1};
use strata_core::logging_facility::init_test_capture;
use strata_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ACTION, FIELD_DURATION_MS, FIELD_ERR_CODE,
    FIELD_ROWS_AFTER, FIELD_RUN_ID, FIELD_TABLE, FIELD_TRACE_ID,
};
use strata_core_types::{RunContext, RunId, TraceId};
use strata_engine::{ReconciliationEngine, RunCoordinator};
use strata_store::{MemoryObjectStore, SnapshotStore};

#[test]
fn test_reconcile_table_start_and_end() {
    let capture = init_test_capture();
    let source = FakeSource::new().with_table("lifecycle_orders", orders(3));
    let store = SnapshotStore::new(MemoryObjectStore::new());
    let engine = ReconciliationEngine::new(&source, &store, "created_at");

    engine
        .reconcile_table("lifecycle_orders", &ts(T0), None)
        .unwrap();

    let events = capture.events_for("reconcile_table", FIELD_TABLE, "lifecycle_orders");
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.as_deref()).collect();
    assert_eq!(kinds, vec![EVENT_START, EVENT_END]);

    let end = &events[1];
    assert_eq!(end.field(FIELD_ACTION), Some("created"));
    assert_eq!(end.field(FIELD_ROWS_AFTER), Some("3"));
    assert!(end.field(FIELD_DURATION_MS).is_some());
    assert_eq!(
        end.component.as_deref(),
        Some("strata_engine::commands::reconcile")
    );
}

#[test]
fn test_reconcile_table_error_event() {
    let capture = init_test_capture();
    let source = FakeSource::new().with_table("lifecycle_failing", orders(3));
    source.fail_on("lifecycle_failing");
    let store = SnapshotStore::new(MemoryObjectStore::new());

    ReconciliationEngine::new(&source, &store, "created_at")
        .reconcile_table("lifecycle_failing", &ts(T0), None)
        .unwrap_err();

    let errors: Vec<_> = capture
        .events_for("reconcile_table", FIELD_TABLE, "lifecycle_failing")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_SOURCE_READ"));
    assert_eq!(errors[0].level, tracing::Level::ERROR);
}

#[test]
fn test_execute_run_events_carry_run_id() {
    let capture = init_test_capture();
    let source = FakeSource::new().with_table("lifecycle_run", orders(1));
    let store = SnapshotStore::new(MemoryObjectStore::new());
    let run_id = RunId::new();
    let coordinator = RunCoordinator::new(&source, &store, "created_at")
        .with_context(RunContext {
            run_id: run_id.clone(),
            trace_id: None,
        });

    assert!(coordinator.execute_run(&ts(T0)).is_success());
    assert!(!coordinator.execute_run(&ts(T0)).is_success());
    assert!(coordinator.execute_run(&ts(T1)).is_success());

    let events = capture.events_for("execute_run", FIELD_RUN_ID, run_id.as_str());
    let count = |kind: &str| {
        events
            .iter()
            .filter(|e| e.event.as_deref() == Some(kind))
            .count()
    };
    assert_eq!(count(EVENT_START), 3);
    assert_eq!(count(EVENT_END), 2);
    assert_eq!(count(EVENT_END_ERROR), 1);

    let failed = events
        .iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .unwrap();
    assert_eq!(failed.field(FIELD_ERR_CODE), Some("ERR_INVALID_INPUT"));
}

#[test]
fn test_execute_run_events_carry_trace_id() {
    let capture = init_test_capture();
    let source = FakeSource::new().with_table("lifecycle_traced", orders(2));
    let store = SnapshotStore::new(MemoryObjectStore::new());
    let context = RunContext::new().with_trace_id(TraceId::from_string("sched-trace-7".to_string()));
    let run_id = context.run_id.clone();
    let coordinator = RunCoordinator::new(&source, &store, "created_at").with_context(context);

    assert!(coordinator.execute_run(&ts(T0)).is_success());
    assert!(!coordinator.execute_run(&ts(T0)).is_success());

    let events = capture.events_for("execute_run", FIELD_TRACE_ID, "sched-trace-7");
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.as_deref()).collect();
    assert_eq!(kinds, vec![EVENT_START, EVENT_END, EVENT_START, EVENT_END_ERROR]);
    assert!(events.iter().all(|e| e.field(FIELD_RUN_ID) == Some(run_id.as_str())));
}

#[test]
fn test_execute_run_without_trace_id_omits_field() {
    let capture = init_test_capture();
    let source = FakeSource::new().with_table("lifecycle_untraced", orders(1));
    let store = SnapshotStore::new(MemoryObjectStore::new());
    let coordinator = RunCoordinator::new(&source, &store, "created_at");
    let run_id = coordinator.context().run_id.clone();

    assert!(coordinator.execute_run(&ts(T0)).is_success());

    let events = capture.events_for("execute_run", FIELD_RUN_ID, run_id.as_str());
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.field(FIELD_TRACE_ID).is_none()));
}
