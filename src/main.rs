use std::path::Path;
use std::sync::Arc;

use failover_drill::ClusterDirectory;
use failover_drill::Error;
use failover_drill::FailoverController;
use failover_drill::Result;
use failover_drill::Settings;
use failover_drill::SimulatedCluster;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

const LOG_FILE_NAME: &str = "failover-drill.log";

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = Settings::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(settings.observability.log_dir.as_deref())?;

    let directory = Arc::new(ClusterDirectory::from_config(&settings.cluster));
    let cluster = SimulatedCluster::shared(&directory, &settings.simulation);
    let mut controller = FailoverController::new(settings, directory, cluster.clone(), cluster);

    info!("Failover drill started. Press CTRL+C to abort.");
    // Dropping the scenario future cancels its workload task
    let report = tokio::select! {
        result = controller.run_scenario() => result,
        signal = shutdown_signal() => {
            signal?;
            warn!("scenario interrupted");
            return Err(Error::Fatal("interrupted".to_string()));
        }
    };

    match report {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "scenario aborted");
            Err(e)
        }
    }
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::signal;
        use tokio::signal::unix::SignalKind;

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => info!("SIGTERM detected."),
            r = tokio::signal::ctrl_c() => {
                r?;
                info!("Ctrl+C detected.");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Ctrl+C detected.");
    }
    Ok(())
}

/// Stdout logging, or a non-blocking file writer under `log_dir`. The
/// returned guard must live until exit so buffered lines are flushed.
fn init_observability(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(filter());
            tracing_subscriber::registry().with(layer).init();
            Ok(Some(guard))
        }
        None => {
            let layer = tracing_subscriber::fmt::layer().with_filter(filter());
            tracing_subscriber::registry().with(layer).init();
            Ok(None)
        }
    }
}
