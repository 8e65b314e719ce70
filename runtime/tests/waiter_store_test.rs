//! The waiter store end to end: calls, completions and stale handling.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use serde_json::json;
use std::time::Duration;
use waiters_core::{
    LifecycleEvent, StaleCompletionPolicy, WaiterAction, WaiterReducer, WaiterStatus,
};
use waiters_runtime::{StoreConfig, WaiterStore};
use waiters_testing::{ScriptedRequest, init_tracing, test_environment, test_store};

#[tokio::test]
async fn test_call_goes_pending_then_resolves() {
    init_tracing();
    let store = test_store();
    let request = ScriptedRequest::new();
    let gate = request.then_gate();

    let mut handle = store
        .call("profile", Some(request.shared()), Some(json!({"user": 1})))
        .await
        .unwrap();

    let record = store.waiter("profile").await;
    assert_eq!(record.status(), WaiterStatus::Pending);
    assert_eq!(record.id, 1);

    gate.resolve(json!({"name": "Ada"}));
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    let record = store.waiter("profile").await;
    assert_eq!(record.status(), WaiterStatus::Resolved);
    assert_eq!(
        store.waiter_response("profile").await,
        Some(json!({"name": "Ada"}))
    );
    assert_eq!(request.calls(), vec![Some(json!({"user": 1}))]);
}

#[tokio::test]
async fn test_failed_request_surfaces_as_rejected_data() {
    let store = test_store();
    let request = ScriptedRequest::new().then_reject(json!("boom"));

    let mut handle = store.call("x", Some(request.shared()), None).await.unwrap();
    handle.wait().await;

    assert!(store.waiter("x").await.is_rejected);
    assert_eq!(store.waiter_error("x").await, Some(json!("boom")));
}

#[tokio::test]
async fn test_refresh_reuses_carried_creator_and_keeps_stale_response() {
    let store = test_store();
    let request = ScriptedRequest::new().then_resolve(json!({"v": 5}));
    let second = request.then_gate();

    let mut handle = store
        .call("x", Some(request.shared()), Some(json!("p")))
        .await
        .unwrap();
    handle.wait().await;

    let mut handle = store.call("x", None, None).await.unwrap();
    let record = store.waiter("x").await;
    assert!(record.is_refreshing);
    assert_eq!(record.response, Some(json!({"v": 5})));
    assert_eq!(record.id, 2);

    second.resolve(json!({"v": 6}));
    handle.wait().await;

    let record = store.waiter("x").await;
    assert!(!record.is_refreshing);
    assert_eq!(record.response, Some(json!({"v": 6})));
    assert_eq!(request.calls(), vec![Some(json!("p")), Some(json!("p"))]);
}

#[tokio::test]
async fn test_late_completion_overrides_cancel_by_default() {
    let store = test_store();
    let request = ScriptedRequest::new();
    let gate = request.then_gate();

    let mut handle = store.call("x", Some(request.shared()), None).await.unwrap();
    store.cancel("x").await.unwrap();
    assert!(store.waiter("x").await.is_canceled);

    gate.resolve(json!("late"));
    handle.wait().await;

    let record = store.waiter("x").await;
    assert!(record.is_resolved);
    assert_eq!(record.response, Some(json!("late")));
}

#[tokio::test]
async fn test_discard_policy_keeps_cancel() {
    let store = WaiterStore::waiters_with(
        WaiterReducer::new().with_stale_completions(StaleCompletionPolicy::Discard),
        test_environment(),
        StoreConfig::default(),
    );
    let request = ScriptedRequest::new();
    let gate = request.then_gate();

    let mut handle = store.call("x", Some(request.shared()), None).await.unwrap();
    store.cancel("x").await.unwrap();

    gate.resolve(json!("late"));
    handle.wait().await;

    let record = store.waiter("x").await;
    assert!(record.is_canceled);
    assert_eq!(record.response, None);
}

#[tokio::test]
async fn test_discard_policy_drops_superseded_request() {
    let store = WaiterStore::waiters_with(
        WaiterReducer::new().with_stale_completions(StaleCompletionPolicy::Discard),
        test_environment(),
        StoreConfig::default(),
    );
    let request = ScriptedRequest::new();
    let first = request.then_gate();
    let second = request.then_gate();
    let creator = request.shared();

    let mut first_handle = store.call("x", Some(creator.clone()), None).await.unwrap();
    let mut second_handle = store.call("x", Some(creator), None).await.unwrap();

    first.resolve(json!("old"));
    first_handle.wait().await;
    assert!(store.waiter("x").await.is_pending);

    second.resolve(json!("new"));
    second_handle.wait().await;
    assert_eq!(store.waiter_response("x").await, Some(json!("new")));
}

#[tokio::test]
async fn test_observers_see_settled_completion() {
    let store = test_store();
    let request = ScriptedRequest::new().then_resolve(json!(1));

    let settled = store
        .send_and_wait_for(
            WaiterAction::call("x", Some(request.shared()), None),
            |action| matches!(action, WaiterAction::Settled { .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(
        settled,
        WaiterAction::Settled {
            name: "x".to_string(),
            observed_id: 1,
            outcome: Ok(json!(1)),
        }
    );
}

#[tokio::test]
async fn test_clear_keeps_identity_and_unknown_event_is_ignored() {
    let store = test_store();

    store
        .dispatch("x", LifecycleEvent::prepare("x", None, Some(json!(1))))
        .await
        .unwrap();
    store
        .dispatch("x", LifecycleEvent::init("x", json!("req")))
        .await
        .unwrap();
    store.clear("x").await.unwrap();
    store.dispatch("ghost", LifecycleEvent::Unknown).await.unwrap();

    let record = store.waiter("x").await;
    assert!(record.is_idle());
    assert_eq!(record.id, 1);
    assert_eq!(record.params, Some(json!(1)));
    assert!(!store.state(|s| s.contains("ghost")).await);
}

#[tokio::test]
async fn test_call_without_creator_stays_idle() {
    let store = test_store();

    let handle = store.call("x", None, Some(json!(1))).await.unwrap();

    assert_eq!(handle.pending(), 0);
    let record = store.waiter("x").await;
    assert!(record.is_idle());
    assert_eq!(record.params, Some(json!(1)));
}
