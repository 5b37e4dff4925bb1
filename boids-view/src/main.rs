//! Application entry point for the boids viewer.
//!
//! This binary sets up logging and eframe/egui and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use boids_core::{Params, Simulation, WorldConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

/// Starts the native eframe application.
///
/// An optional JSON [`WorldConfig`] path may be passed as the first
/// argument; if it cannot be loaded the defaults are used instead.
/// Log verbosity follows `RUST_LOG` (default `info`).
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let sim = match std::env::args().nth(1) {
        Some(path) => match Simulation::from_config_file(&path, Params::default()) {
            Ok(sim) => {
                info!(%path, "loaded world config");
                sim
            }
            Err(err) => {
                error!(%path, %err, "could not load world config, using defaults");
                Simulation::new(WorldConfig::default(), Params::default())
            }
        },
        None => Simulation::new(WorldConfig::default(), Params::default()),
    };

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Boids",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new(sim)))),
    )
}
