use std::f32::consts::TAU;

use glam::Vec2;
use itertools::Itertools;
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;

use crate::boid::{Boid, FatigueBand};
use crate::options::{OptionsError, RunOptions, UpdateOrder, WindowSize};

#[derive(Debug, Error, PartialEq)]
pub enum FlockError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    /// self-exclusion goes by id, two boids sharing one would ignore each other
    #[error("boid id {0} is already taken")]
    DuplicateId(usize),
}

/// Aggregate view of the flock, cheap enough to compute every tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlockStats {
    pub population: usize,
    pub mean_speed: f32,
    pub mean_fatigue: f32,
    pub rested: usize,
    pub tired: usize,
    pub fatigued: usize,
    /// boids whose position, velocity or fatigue is NaN or infinite
    pub non_finite: usize,
}

/// Owns the population and drives it one tick at a time.
///
/// Neighbour search is a brute force scan of the whole population, O(n²) per tick.
pub struct Flock {
    boids: Vec<Boid>,
    // reused between ticks for UpdateOrder::Snapshot
    snapshot: Vec<Boid>,
    window: WindowSize,
    rng: Xoshiro256PlusPlus,
    next_id: usize,
    ticks: u64,
}

impl Flock {
    pub fn new(run_options: &RunOptions) -> Result<Self, OptionsError> {
        run_options.validate()?;

        let mut rng = match run_options.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        let boids = get_boids(&mut rng, run_options, &run_options.window);

        debug!(
            "spawned {} boids in {}x{}",
            boids.len(),
            run_options.window.width,
            run_options.window.height
        );

        Ok(Flock {
            next_id: boids.len(),
            snapshot: Vec::with_capacity(boids.len()),
            boids,
            window: run_options.window,
            rng,
            ticks: 0,
        })
    }

    /// Builds a flock around an existing population, ids must be unique.
    pub fn from_boids(boids: Vec<Boid>, run_options: &RunOptions) -> Result<Self, FlockError> {
        if let Some(id) = boids.iter().map(|b| b.id).duplicates().next() {
            return Err(FlockError::DuplicateId(id));
        }

        let mut flock = Flock::new(&RunOptions {
            init_boids: 0,
            ..run_options.clone()
        })?;

        flock.next_id = boids.iter().map(|b| b.id + 1).max().unwrap_or(0);
        flock.boids = boids;

        Ok(flock)
    }

    /// Advances every boid by one tick.
    pub fn update(&mut self, run_options: &RunOptions) {
        let WindowSize { width, height } = self.window;

        match run_options.update_order {
            UpdateOrder::Snapshot => {
                self.snapshot.clear();
                self.snapshot.extend_from_slice(&self.boids);

                for boid in self.boids.iter_mut() {
                    boid.step(&self.snapshot, width, height, run_options);
                }
            }
            UpdateOrder::Sequential => {
                // the stale copy of the current boid in the slice is skipped by id
                for i_cur in 0..self.boids.len() {
                    let mut boid = self.boids[i_cur];
                    boid.step(&self.boids, width, height, run_options);
                    self.boids[i_cur] = boid;
                }
            }
        }

        self.ticks += 1;

        let non_finite = self.boids.iter().filter(|b| !b.is_finite()).count();
        if non_finite > 0 {
            warn!(
                "tick {}: {} boid(s) carry non-finite state",
                self.ticks, non_finite
            );
        }

        if log::log_enabled!(log::Level::Debug) {
            let stats = self.stats();
            debug!(
                "tick {}: mean speed {:.3}, mean fatigue {:.3}, rested/tired/fatigued {}/{}/{}",
                self.ticks,
                stats.mean_speed,
                stats.mean_fatigue,
                stats.rested,
                stats.tired,
                stats.fatigued
            );
        }
    }

    /// Changes the bounds wall avoidance steers against, positions are left as they are.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.window = WindowSize { width, height };
    }

    /// Spawns one boid with a fresh id.
    pub fn insert(&mut self, run_options: &RunOptions) -> Result<(), OptionsError> {
        run_options.validate()?;

        let b = get_boid(&mut self.rng, run_options, &self.window, self.next_id);
        self.next_id += 1;
        self.boids.push(b);

        Ok(())
    }

    pub fn insert_boid(&mut self, b: Boid) -> Result<(), FlockError> {
        if self.boids.iter().any(|other| other.id == b.id) {
            return Err(FlockError::DuplicateId(b.id));
        }

        self.next_id = self.next_id.max(b.id + 1);
        self.boids.push(b);

        Ok(())
    }

    pub fn delete_last(&mut self) -> Option<Boid> {
        self.boids.pop()
    }

    /// Respawns the population, not the simulation: the RNG stream carries on.
    pub fn restart(&mut self, run_options: &RunOptions) -> Result<(), OptionsError> {
        run_options.validate()?;

        self.boids = get_boids(&mut self.rng, run_options, &self.window);
        self.next_id = self.boids.len();
        self.ticks = 0;

        Ok(())
    }

    pub fn view(&self) -> &[Boid] {
        &self.boids
    }

    pub fn window(&self) -> WindowSize {
        self.window
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stats(&self) -> FlockStats {
        let population = self.boids.len();
        if population == 0 {
            return FlockStats::default();
        }

        let bands = self.boids.iter().map(|b| b.fatigue_band()).counts();
        let band = |band: FatigueBand| bands.get(&band).copied().unwrap_or(0);

        FlockStats {
            population,
            mean_speed: self.boids.iter().map(|b| b.velocity.length()).sum::<f32>()
                / population as f32,
            mean_fatigue: self.boids.iter().map(|b| b.fatigue()).sum::<f32>()
                / population as f32,
            rested: band(FatigueBand::Rested),
            tired: band(FatigueBand::Tired),
            fatigued: band(FatigueBand::Fatigued),
            non_finite: self.boids.iter().filter(|b| !b.is_finite()).count(),
        }
    }
}

fn get_boids<R: Rng>(rng: &mut R, run_options: &RunOptions, window: &WindowSize) -> Vec<Boid> {
    (0..run_options.init_boids)
        .map(|id| get_boid(rng, run_options, window, id))
        .collect()
}

fn get_boid<R: Rng>(rng: &mut R, run_options: &RunOptions, window: &WindowSize, id: usize) -> Boid {
    // x in [0, width), y in [0, height)
    let x = rng.gen::<f32>() * window.width;
    let y = rng.gen::<f32>() * window.height;

    let angle = rng.gen::<f32>() * TAU;
    let speed = rng.gen_range(run_options.init_speed_min..=run_options.init_speed_max);
    let velocity = Vec2::new(angle.cos(), angle.sin()) * speed;

    Boid::from_options(x, y, velocity, id, run_options)
}
