use std::{fs::File, io, mem, path::PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::{boid::FatigueBand, flock::Flock, options::SaveOptions};

/// One sampled boid, as written to the trace file.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoidData {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub fatigue: f32,
    pub band: FatigueBand,
    pub time: u64,
}

#[derive(Debug, Error)]
pub enum BirdwatcherError {
    #[error("can't open trace file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("can't write trace data")]
    Write(#[from] csv::Error),
    #[error("can't flush trace file")]
    Flush(#[from] io::Error),
}

/// Samples the flock every `sample_rate` ticks and accumulates the data in memory.
pub struct Birdwatcher {
    locations: Vec<BoidData>,
    render_ticker: u64,
    sample_rate: u64,
}

const PREFIX: &str = "boids-data";

impl Birdwatcher {
    /// `sample_rate` of 0 is treated as 1.
    pub fn new(sample_rate: u64) -> Self {
        Birdwatcher {
            locations: Vec::new(),
            render_ticker: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Triggers data collection
    pub fn watch(&mut self, flock: &Flock) {
        if !self.should_sample() {
            return;
        }

        let time = self.render_ticker / self.sample_rate;
        self.locations
            .extend(flock.view().iter().map(|b| BoidData {
                id: b.id,
                x: b.position.x,
                y: b.position.y,
                heading: b.heading(),
                fatigue: b.fatigue(),
                band: b.fatigue_band(),
                time,
            }));
    }

    pub fn restart(&mut self) {
        self.locations.clear();
        self.render_ticker = 0;
    }

    pub fn pop_data(&mut self) -> Vec<BoidData> {
        mem::take(&mut self.locations)
    }

    /// Saves the latest data in CSV format, then returns it while emptying the birdwatcher's memory
    ///
    /// Depending on save options, either attempts to overwrite the current file or writes a new
    /// timestamped file. On error the data is lost together with the file.
    pub fn pop_data_save(
        &mut self,
        save_options: &SaveOptions,
    ) -> Result<Vec<BoidData>, BirdwatcherError> {
        let data = self.pop_data();

        if !save_options.save_locations {
            return Ok(data);
        }

        if let Some(path) = &save_options.save_locations_path {
            let file_path = PathBuf::from(path)
                .join(Birdwatcher::get_dataset_name(save_options, Utc::now()));

            let file = File::create(&file_path).map_err(|source| BirdwatcherError::Open {
                path: file_path.clone(),
                source,
            })?;
            let mut wtr = csv::Writer::from_writer(file);

            for b in data.iter() {
                wtr.serialize(b)?;
            }
            wtr.flush()?;

            info!("saved {} samples to {}", data.len(), file_path.display());
        }

        Ok(data)
    }

    fn get_dataset_name(save_options: &SaveOptions, now: DateTime<Utc>) -> String {
        match save_options.save_locations_timestamp {
            true => {
                let datetime_part = now.timestamp_millis();
                format!(
                    "{prefix}_{datetime}.csv",
                    prefix = PREFIX,
                    datetime = datetime_part
                )
            }
            false => format!("{prefix}.csv", prefix = PREFIX),
        }
    }

    fn should_sample(&mut self) -> bool {
        self.render_ticker += 1;

        self.render_ticker % self.sample_rate == 0
    }
}
