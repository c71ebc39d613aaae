//! `run` command implementation.

use std::future::Future;

use actor_factory::ActorFactory;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::rig::{load_rig, print_rig_summary, ConnectionOverrides};

/// Execute the `run` command
///
/// Returns once the rig has been torn down: Ok after a shutdown signal,
/// Err if connecting or provisioning failed.
pub async fn run_provisioner(args: &RunArgs) -> Result<()> {
    let overrides = ConnectionOverrides {
        host: args.host.clone(),
        port: args.port,
        timeout_secs: args.timeout,
    };
    let rig = load_rig(args.config.as_deref(), &overrides).context("Failed to load rig")?;

    info!(
        host = %rig.connection.host,
        port = rig.connection.port,
        vehicle = %rig.vehicle.blueprint.id,
        sensors = rig.sensors.len(),
        "Rig loaded"
    );

    if args.dry_run {
        info!("Dry run mode - rig is valid, exiting");
        print_rig_summary(&rig);
        return Ok(());
    }

    // Listeners go in before connecting so an interrupt while spawning
    // still reaches teardown.
    let shutdown = shutdown_signal()?;
    let mut factory = ActorFactory::new(simulator_client());

    let held = factory
        .run(&rig, shutdown)
        .await
        .map_err(CliError::from)
        .with_context(|| {
            format!(
                "CARLA rig at {}:{} did not come up",
                rig.connection.host, rig.connection.port
            )
        })?;

    info!(actors = held, stats = %factory.stats(), "CARLA rig finished");
    Ok(())
}

#[cfg(feature = "real-carla")]
fn simulator_client() -> actor_factory::RealCarlaClient {
    actor_factory::RealCarlaClient::new()
}

#[cfg(not(feature = "real-carla"))]
fn simulator_client() -> actor_factory::MockCarlaClient {
    warn!("built without `real-carla`; provisioning against the in-memory mock simulator");
    actor_factory::MockCarlaClient::new()
}

/// Install Ctrl+C and SIGTERM listeners now; the returned future resolves
/// on the first of either.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("Failed to install Ctrl+C handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => warn!("Received Ctrl+C"),
            _ = terminate.recv() => warn!("Received SIGTERM"),
        }
    })
}

/// Ctrl+C only. `ActorFactory::run` polls the future before connecting,
/// which registers the listener.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => warn!("Received Ctrl+C"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    })
}
