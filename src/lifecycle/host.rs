use std::future::Future;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::framework::{ActivationError, ScopeClassifier};
use crate::lifecycle::orchestrator::Orchestrator;

/// How [`ScopeAwareHost::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExit {
    /// The application future ran to completion (window context only).
    AppCompleted,
    /// The shutdown future resolved first.
    Shutdown,
}

/// Entry point for one execution context.
///
/// `ScopeAwareHost` is responsible for:
/// - **Startup**: Running bulk activation before anything else
/// - **UI Gating**: Starting the application future only in the window context
/// - **Worker Parking**: Keeping worker contexts alive, serving their background
///   services, until shutdown is requested
///
/// # Example
///
/// ```ignore
/// let host = ScopeAwareHost::new(Arc::new(orchestrator));
/// let exit = host
///     .run(|services| async move { render(services).await }, tokio::signal::ctrl_c().map(|_| ()))
///     .await?;
/// ```
pub struct ScopeAwareHost {
    orchestrator: Arc<Orchestrator>,
}

impl ScopeAwareHost {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Runs bulk activation, then either the application or the worker park.
    ///
    /// # Returns
    ///
    /// - `Ok(HostExit::AppCompleted)` when `app` finishes first (window context)
    /// - `Ok(HostExit::Shutdown)` when `shutdown` resolves first
    /// - `Err(_)` if bulk activation fails; `app` is never started in that case
    #[instrument(skip_all, fields(context = %self.orchestrator.classifier().current()))]
    pub async fn run<F, A, S>(&self, app: F, shutdown: S) -> Result<HostExit, ActivationError>
    where
        F: FnOnce(Arc<Orchestrator>) -> A,
        A: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        // =====================================================================
        // Step 1: Start everything that belongs in this context
        // =====================================================================

        self.orchestrator.run_bulk_activation().await?;

        // =====================================================================
        // Step 2: UI in the window, park everywhere else
        // =====================================================================

        if !self.orchestrator.classifier().is_window() {
            info!("Worker context; parking until shutdown");
            shutdown.await;
            info!("Worker shutdown requested");
            return Ok(HostExit::Shutdown);
        }

        info!("Starting application");
        let app = app(Arc::clone(&self.orchestrator));
        tokio::select! {
            () = app => {
                info!("Application completed");
                Ok(HostExit::AppCompleted)
            }
            () = shutdown => {
                info!("Shutdown requested");
                Ok(HostExit::Shutdown)
            }
        }
    }
}
