//! # Scope Activation Demo
//!
//! Builds a three-service catalog and runs it through [`ScopeAwareHost`]:
//!
//! - `Clock` is an async background service that starts everywhere.
//! - `Telemetry` depends on `Clock` and starts in the window only.
//! - `Indexer` starts in the dedicated worker only. The window activates it on demand.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! SCOPE_ACTIVATION_CONTEXT=dedicated-worker RUST_LOG=info cargo run
//! RUST_LOG=debug cargo run -- activation.toml
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use scope_activation::lifecycle::tracing::setup_tracing;
use scope_activation::{
    ActivationConfig, AsyncBackgroundService, BackgroundService, BoxError, HostExit,
    Orchestrator, Scope, ScopeAwareHost, ServiceCatalog, ServiceRegistration,
};
use tracing::{error, info};

#[derive(Default)]
struct Clock {
    offset_ms: AtomicU64,
    synced: AtomicBool,
}

impl Clock {
    fn now_ms(&self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        wall + self.offset_ms.load(Ordering::Relaxed)
    }
}

impl BackgroundService for Clock {}

#[async_trait]
impl AsyncBackgroundService for Clock {
    async fn init_async(&self) -> Result<(), BoxError> {
        tokio::task::yield_now().await;
        self.offset_ms.store(0, Ordering::Relaxed);
        self.synced.store(true, Ordering::Relaxed);
        info!("Clock synchronized");
        Ok(())
    }
}

struct Telemetry {
    clock: Arc<Clock>,
}

impl Telemetry {
    fn report(&self, event: &str) {
        info!(
            event,
            at_ms = self.clock.now_ms(),
            synced = self.clock.synced.load(Ordering::Relaxed),
            "Telemetry event"
        );
    }
}

struct Indexer {
    clock: Arc<Clock>,
}

impl BackgroundService for Indexer {}

fn catalog() -> ServiceCatalog {
    ServiceCatalog::new()
        .add(
            ServiceRegistration::with_instance(Clock::default())
                .async_background::<Clock>()
                .scope(Scope::All),
        )
        .add(
            ServiceRegistration::with_factory(|provider| {
                Ok(Telemetry {
                    clock: provider.resolve::<Clock>()?,
                })
            })
            .depends_on::<Clock>()
            .scope(Scope::Window),
        )
        .add(
            ServiceRegistration::with_factory(|provider| {
                Ok(Indexer {
                    clock: provider.resolve::<Clock>()?,
                })
            })
            .depends_on::<Clock>()
            .background()
            .scope(Scope::DedicatedWorker),
        )
}

async fn run_app(services: Arc<Orchestrator>) {
    match services.activate_as::<Telemetry>().await {
        Ok(Some(telemetry)) => telemetry.report("app_started"),
        Ok(None) => error!("Telemetry is not registered"),
        Err(e) => error!(error = %e, "Telemetry unavailable"),
    }

    // Worker-scoped, so the window has to ask for it.
    match services.activate_as::<Indexer>().await {
        Ok(Some(indexer)) => info!(at_ms = indexer.clock.now_ms(), "Indexer ready on demand"),
        Ok(None) => error!("Indexer is not registered"),
        Err(e) => error!(error = %e, "Indexer unavailable"),
    }

    info!(started = ?services.started_in_order(), "Activation order");
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    setup_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => ActivationConfig::load(Path::new(&path))?,
        None => ActivationConfig::default(),
    };

    let orchestrator = Orchestrator::from_catalog(catalog(), Arc::new(config.classifier()?))?;
    config.apply(&orchestrator)?;

    let host = ScopeAwareHost::new(Arc::new(orchestrator));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
    };

    match host.run(run_app, shutdown).await? {
        HostExit::AppCompleted => info!("Application finished"),
        HostExit::Shutdown => info!("Shut down"),
    }
    Ok(())
}
