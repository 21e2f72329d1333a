use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math_helpers::deg_to_rad;

/// Simulation-level configuration.
///
/// Per-agent parameters (`turn_factor`, `max_fatigue`, `fatigue_rate`) are only defaults here,
/// they are copied into every [`Boid`](crate::boid::Boid) at spawn time and stay constant for
/// its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub init_boids: usize,
    pub window: WindowSize,
    /// initial speed is drawn uniformly from this range
    pub init_speed_min: f32,
    pub init_speed_max: f32,
    /// `None` seeds from entropy
    pub seed: Option<u64>,
    pub update_order: UpdateOrder,

    pub turn_factor: f32,
    pub max_fatigue: f32,
    pub fatigue_rate: f32,

    pub max_speed: f32,
    /// applied only to a non-zero velocity
    pub min_speed: Option<f32>,
    /// share of the steered velocity taken each tick, in (0, 1]; 1 applies the steer directly
    pub velocity_blend: f32,

    pub separation_distance: f32,
    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub fatigue_distance: f32,
    pub wall_margin: f32,

    pub separation_coefficient: f32,
    pub alignment_coefficient: f32,
    pub cohesion_coefficient: f32,
    pub wall_coefficient: f32,
    pub fatigue_coefficient: f32,

    pub separation_on: bool,
    pub alignment_on: bool,
    pub cohesion_on: bool,
    pub wall_avoidance_on: bool,

    pub field_of_vision_on: bool,
    /// compared against the unsigned angle between heading and the direction to a neighbour
    pub field_of_vision_deg: f32,

    pub fatigue_on: bool,
    /// fewer visible neighbours than this makes a boid tired
    pub fatigue_neighbour_threshold: usize,
    pub fatigue_drag: f32,

    pub sample_rate: u64,
    pub save_options: SaveOptions,
}

impl RunOptions {
    /// The first iteration of the model: the three classic rules plus walls, steer applied
    /// directly, no fatigue, no field of view, no speed floor.
    pub fn classic() -> Self {
        RunOptions {
            min_speed: None,
            velocity_blend: 1.,
            alignment_coefficient: 1.,
            cohesion_coefficient: 1.,
            field_of_vision_on: false,
            fatigue_on: false,
            ..Default::default()
        }
    }

    pub fn field_of_vision_rad(&self) -> f32 {
        deg_to_rad(self.field_of_vision_deg)
    }

    /// Checks the parameters the force model relies on to keep its invariants.
    pub fn validate(&self) -> Result<(), OptionsError> {
        for (name, value) in [
            ("max_speed", self.max_speed),
            ("separation_distance", self.separation_distance),
            ("alignment_distance", self.alignment_distance),
            ("cohesion_distance", self.cohesion_distance),
            ("fatigue_distance", self.fatigue_distance),
        ] {
            if !(value > 0.) {
                return Err(OptionsError::NotPositive { name, value });
            }
        }

        for (name, value) in [
            ("turn_factor", self.turn_factor),
            ("max_fatigue", self.max_fatigue),
            ("fatigue_rate", self.fatigue_rate),
            ("fatigue_drag", self.fatigue_drag),
            ("wall_margin", self.wall_margin),
            ("window.width", self.window.width),
            ("window.height", self.window.height),
            ("init_speed_min", self.init_speed_min),
        ] {
            if !(value >= 0.) {
                return Err(OptionsError::Negative { name, value });
            }
        }

        if let Some(min) = self.min_speed {
            if !(min >= 0. && min <= self.max_speed) {
                return Err(OptionsError::SpeedRange {
                    min,
                    max: self.max_speed,
                });
            }
        }

        if !(self.init_speed_min <= self.init_speed_max) {
            return Err(OptionsError::InitSpeedRange {
                min: self.init_speed_min,
                max: self.init_speed_max,
            });
        }

        if !(self.velocity_blend > 0. && self.velocity_blend <= 1.) {
            return Err(OptionsError::VelocityBlend(self.velocity_blend));
        }

        if !(0. ..=360.).contains(&self.field_of_vision_deg) {
            return Err(OptionsError::FieldOfVision(self.field_of_vision_deg));
        }

        if self.sample_rate == 0 {
            return Err(OptionsError::SampleRate);
        }

        Ok(())
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        let init_boids = 75;
        let init_width = 800;
        let init_height = 600;

        let max_speed = 10.;
        let min_speed = Some(2.);

        RunOptions {
            init_boids,
            window: get_window_size(init_width, init_height),
            init_speed_min: 1.,
            init_speed_max: 5.,
            seed: None,
            update_order: UpdateOrder::Snapshot,
            turn_factor: 1.2,
            max_fatigue: 50.,
            fatigue_rate: 0.5,
            max_speed,
            min_speed,
            velocity_blend: 0.3,
            separation_distance: 20.,
            alignment_distance: 25.,
            cohesion_distance: 25.,
            fatigue_distance: 50.,
            wall_margin: 20.,
            separation_coefficient: 1.5,
            alignment_coefficient: 1.2,
            cohesion_coefficient: 1.2,
            wall_coefficient: 2.,
            fatigue_coefficient: 1.,
            separation_on: true,
            alignment_on: true,
            cohesion_on: true,
            wall_avoidance_on: true,
            field_of_vision_on: true,
            field_of_vision_deg: 120.,
            fatigue_on: true,
            fatigue_neighbour_threshold: 4,
            fatigue_drag: 0.03,
            sample_rate: 1,
            save_options: SaveOptions {
                save_locations: false,
                save_locations_path: Some("./".to_owned()),
                save_locations_timestamp: true,
            },
        }
    }
}

pub fn get_window_size(init_width: u32, init_height: u32) -> WindowSize {
    WindowSize {
        width: init_width as f32,
        height: init_height as f32,
    }
}

/// Viewport in world units, x grows right and y grows down from the origin at the top left
/// corner.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f32,
    pub height: f32,
}

/// How neighbour state is read within one tick.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
// {"type": "Snapshot"}
pub enum UpdateOrder {
    /// every boid reads the population as it stood at the start of the tick
    Snapshot,
    /// boids are stepped in place, later boids see already updated earlier ones
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOptions {
    pub save_locations: bool,
    pub save_locations_path: Option<String>,
    pub save_locations_timestamp: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum OptionsError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("min_speed {min} must lie within [0, max_speed = {max}]")]
    SpeedRange { min: f32, max: f32 },
    #[error("initial speed range [{min}, {max}] is empty")]
    InitSpeedRange { min: f32, max: f32 },
    #[error("velocity_blend must lie within (0, 1], got {0}")]
    VelocityBlend(f32),
    #[error("field of vision must lie within [0, 360] degrees, got {0}")]
    FieldOfVision(f32),
    #[error("sample_rate must be at least 1")]
    SampleRate,
}
