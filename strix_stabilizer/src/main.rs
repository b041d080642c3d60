//! Stabilizer binary: wires the core to the simulation collaborators and
//! runs the paced loop on the host.
//!
//! Usage: `strix_stabilizer [config.toml] [max_ticks]`
//! With no arguments the stock configuration runs indefinitely.

use std::path::Path;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use strix_common::config::StabilizerConfig;
use strix_stabilizer::config::load_config;
use strix_stabilizer::cycle::{Collaborators, StabilizerTask, rt_setup};
use strix_stabilizer::sim::{
    HoverCommander, NoExternalPosition, PassthroughSituationAwareness, QuadXMixer, SimEstimator,
    SimSensors,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => StabilizerConfig::default(),
    };
    let max_ticks: Option<u64> = match args.next() {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };

    info!(
        main_hz = config.rates.main_hz,
        attitude_hz = config.rates.attitude_hz,
        position_hz = config.rates.position_hz,
        "strix stabilizer starting"
    );

    let collaborators = Collaborators {
        sensors: SimSensors::new(std::time::Duration::from_millis(20)),
        estimator: SimEstimator::new(config.rates.main_hz),
        external_position: NoExternalPosition,
        commander: HoverCommander { altitude: 1.0 },
        situation_awareness: PassthroughSituationAwareness,
        power: QuadXMixer,
    };

    let mut task = StabilizerTask::new(&config, collaborators)?;
    if !task.self_test() {
        error!("collaborator self test failed, refusing to start");
        std::process::exit(1);
    }

    rt_setup(0, 80)?;

    match max_ticks {
        Some(ticks) => {
            task.run_ticks(ticks)?;
            let stats = task.stats();
            let snapshot = task.snapshot();
            info!(
                cycles = stats.cycle_count,
                avg_ns = stats.avg_cycle_ns(),
                max_ns = stats.max_cycle_ns,
                overruns = stats.overruns,
                thrust = snapshot.control_thrust,
                altitude = snapshot.state_position.z,
                "run complete"
            );
        }
        None => task.run()?,
    }

    Ok(())
}
