use birdwatcher::{Birdwatcher, BirdwatcherError, BoidData};
use flock::Flock;
use options::{OptionsError, RunOptions};
use thiserror::Error;

pub mod boid;
pub mod flock;

pub mod birdwatcher;
pub mod math_helpers;
pub mod options;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid run options")]
    Options(#[from] OptionsError),
    #[error("can't save the trace")]
    Save(#[from] BirdwatcherError),
}

/// Runs `no_iter` ticks headlessly and returns the sampled trace, saving it when the save
/// options ask for it.
pub fn flock_base(no_iter: u64, run_options: &RunOptions) -> Result<Vec<BoidData>, SimulationError> {
    let mut flock = Flock::new(run_options)?;
    let mut bird_watcher = Birdwatcher::new(run_options.sample_rate);

    (0..no_iter).for_each(|_| {
        flock.update(run_options);
        bird_watcher.watch(&flock);
    });

    let data = bird_watcher.pop_data_save(&run_options.save_options)?;

    Ok(data)
}
