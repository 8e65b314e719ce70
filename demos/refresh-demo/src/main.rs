//! Refresh demo
//!
//! Binds a view to the `profile` waiter and walks it through a first load,
//! a refresh on input change and a failed request, logging every edge.
//!
//! Run with `RUST_LOG=debug` to see the store and binding internals.

use serde_json::{Value, json};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waiters_binding::{BindingConfig, RenderOutcome, WaiterBinding};
use waiters_core::{WaiterEnvironment, WaiterRecord, request_fn};
use waiters_runtime::WaiterStore;

#[derive(Debug, Clone, PartialEq)]
struct Props {
    user: u64,
}

/// Pretend backend: user 3 does not exist
fn load_profile(params: Option<Value>) -> impl Future<Output = Result<Value, Value>> {
    async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let user = params
            .as_ref()
            .and_then(|p| p.get("user"))
            .and_then(Value::as_u64)
            .unwrap_or_default();

        if user == 3 {
            Err(json!({ "status": 404, "user": user }))
        } else {
            Ok(json!({ "user": user, "name": format!("user #{user}") }))
        }
    }
}

fn profile_view(props: &Props, record: &WaiterRecord) -> anyhow::Result<String> {
    let name = record
        .response
        .as_ref()
        .and_then(|r| r.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("no profile loaded for user {}", props.user))?;
    Ok(format!("Profile: {name}"))
}

fn print_render(outcome: RenderOutcome<String>) {
    match outcome {
        RenderOutcome::Rendered(text) => println!("    render: {text}"),
        RenderOutcome::Defect(defect) => println!("    render defect: {defect}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresh_demo=info,waiters_binding=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Refresh Demo: edge-triggered waiters ===\n");

    let store = WaiterStore::waiters(WaiterEnvironment::system());

    let config = BindingConfig::<Props, String>::named("profile")
        .request_creator(request_fn(load_profile))
        .request_on_mount_params(|props| json!({ "user": props.user }))
        .request_on_props_change(|new, old| new != old)
        .clear_on_unmount(true)
        .on_mount(|_, props| tracing::info!(user = props.user, "mounted"))
        .on_unmount(|record, _| tracing::info!(id = record.id, "unmounted"))
        .on_pending(|record, _| tracing::info!(id = record.id, "pending"))
        .on_refresh(|record, _| {
            tracing::info!(stale = ?record.response, "refreshing");
        })
        .on_resolve(|record, _| tracing::info!(response = ?record.response, "resolved"))
        .on_reject(|record, _| tracing::warn!(error = ?record.error, "rejected"))
        .on_complete(|record, _| {
            tracing::info!(elapsed_ms = ?record.elapsed_ms, "completed");
        })
        .pending_view(|_, record| {
            Ok(if record.is_refreshing {
                "Refreshing...".to_string()
            } else {
                "Loading...".to_string()
            })
        })
        .rejected_view(|props, record| {
            Ok(format!(
                "Could not load user {}: {}",
                props.user,
                record.error.clone().unwrap_or(Value::Null)
            ))
        });

    let mut binding = WaiterBinding::new(store.clone(), config, profile_view);

    println!(">>> mount(user 1)");
    let mut reaction = binding.mount(Props { user: 1 }).await?;
    print_render(binding.render().await?);
    reaction.settle().await;
    binding.observe().await?;
    print_render(binding.render().await?);

    for user in [2, 3] {
        println!("\n>>> update(user {user})");
        let mut reaction = binding.update(Props { user }).await?;
        binding.observe().await?;
        print_render(binding.render().await?);
        reaction.settle().await;
        binding.observe().await?;
        print_render(binding.render().await?);
    }

    println!("\n>>> unmount");
    binding.unmount().await?;
    let record = store.waiter("profile").await;
    println!("    record after unmount: {:?}, id {}", record.status(), record.id);

    store.shutdown(Duration::from_secs(1)).await?;
    println!("\n=== Done ===");
    Ok(())
}
