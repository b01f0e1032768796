use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scope_activation::{
    ExecutionContext, FixedScopeClassifier, HostExit, Orchestrator, Scope, ScopeAwareHost,
    ServiceCatalog, ServiceKey, ServiceRegistration, StartupState,
};
use tokio::sync::oneshot;

struct Panel;
struct Indexer;

fn host_in(context: ExecutionContext) -> ScopeAwareHost {
    let catalog = ServiceCatalog::new()
        .add(ServiceRegistration::with_factory(|_| Ok(Panel)).scope(Scope::Window))
        .add(
            ServiceRegistration::with_factory(|_| Ok(Indexer))
                .background()
                .scope(Scope::DedicatedWorker),
        );
    let orchestrator =
        Orchestrator::from_catalog(catalog, Arc::new(FixedScopeClassifier::new(context)))
            .expect("Failed to build orchestrator");
    ScopeAwareHost::new(Arc::new(orchestrator))
}

/// The window runs the application with its services already started.
#[tokio::test]
async fn test_window_host_runs_app() {
    let host = host_in(ExecutionContext::Window);
    let saw_panel = Arc::new(AtomicBool::new(false));
    let flag = saw_panel.clone();

    let exit = host
        .run(
            move |services| async move {
                let panel = services
                    .activate_as::<Panel>()
                    .await
                    .ok()
                    .flatten();
                flag.store(panel.is_some(), Ordering::SeqCst);
            },
            std::future::pending(),
        )
        .await
        .expect("Host failed");

    assert_eq!(exit, HostExit::AppCompleted);
    assert!(saw_panel.load(Ordering::SeqCst));
}

/// A worker serves its background services until told to stop.
#[tokio::test]
async fn test_worker_host_parks_until_shutdown() {
    let host = host_in(ExecutionContext::DedicatedWorker);
    let (stop, stopped) = oneshot::channel::<()>();
    let orchestrator = host.orchestrator().clone();
    let app_started = Arc::new(AtomicBool::new(false));
    let flag = app_started.clone();

    let stopper = tokio::spawn(async move {
        // Ask for shutdown only once the worker's services are up
        while orchestrator.state_of(&ServiceKey::of::<Indexer>()) != Some(StartupState::Started) {
            tokio::task::yield_now().await;
        }
        let _ = stop.send(());
    });

    let exit = host
        .run(
            move |_| async move { flag.store(true, Ordering::SeqCst) },
            async {
                let _ = stopped.await;
            },
        )
        .await
        .expect("Host failed");

    stopper.await.expect("Stopper task failed");
    assert_eq!(exit, HostExit::Shutdown);
    assert!(!app_started.load(Ordering::SeqCst));
    assert_eq!(
        host.orchestrator().state_of(&ServiceKey::of::<Panel>()),
        Some(StartupState::None)
    );
}
