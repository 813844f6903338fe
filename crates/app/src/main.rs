//! Splat Painter - headless host
//!
//! Replays a recorded host session (tool commands, viewport pointer events
//! and frame ticks) against a splat texture on disk.

use std::process::ExitCode;

use painting::{CpuBackend, FileAssetStore, PaintError};
use splat_painter_ipc::{PainterToHost, SessionScript};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod host;
mod replay;

use config::{AppConfig, BackendKind};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let painter_config = match config.load_painter_config() {
        Ok(painter_config) => painter_config,
        Err(e) => {
            error!("Failed to load painter config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let script = match SessionScript::load(&config.script) {
        Ok(script) => script,
        Err(e) => {
            error!("Failed to load session script {}: {}", config.script.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Replaying {} step(s) from {} with {:?} backend, assets in {}",
        script.steps.len(),
        config.script.display(),
        config.backend,
        config.asset_root.display()
    );

    let assets = FileAssetStore::new(&config.asset_root);
    let notifications = match config.backend {
        BackendKind::Cpu => replay::run(&script, painter_config, assets, || {
            Ok::<_, PaintError>(CpuBackend::new())
        }),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => replay::run(&script, painter_config, assets, || {
            painting::WgpuBackend::new().map_err(PaintError::from)
        }),
        #[cfg(not(feature = "gpu"))]
        BackendKind::Gpu => {
            error!("GPU backend requested but splat-painter was built without the `gpu` feature");
            return ExitCode::FAILURE;
        }
    };

    let errors = notifications
        .iter()
        .filter(|note| matches!(note, PainterToHost::Error { .. }))
        .count();
    if errors > 0 {
        error!("Replay finished with {} error(s)", errors);
        ExitCode::FAILURE
    } else {
        info!("Replay finished");
        ExitCode::SUCCESS
    }
}
