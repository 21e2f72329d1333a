// https://docs.rs/clap-serde/latest/clap_serde/#
use clap_serde_derive::{
    clap::{self, Parser},
    serde::Serialize,
    ClapSerde,
};
use murmuration_lib::options::{self, RunOptions, SaveOptions, UpdateOrder};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Headless flocking simulation with a fatigue model.
pub struct Args {
    /// Config file, `.toml`, `.json` or YAML
    #[arg(short, long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Serialize)]
/// Programatic configuration
///
/// Uses defaults, which can be overwritten by the config file, which in turn can be
/// overwritten by command line options
pub struct Config {
    #[default(75)]
    #[arg(short = 'n', long)]
    /// number of boids
    pub no_boids: usize,

    #[default(600)]
    #[arg(short = 'k', long)]
    /// number of ticks to simulate
    pub ticks: u64,

    #[default(60.)]
    #[arg(long)]
    /// ticks per second when running in real time
    pub tick_rate: f64,

    #[default(false)]
    #[arg(long)]
    /// pace the ticks at `tick_rate` instead of running as fast as possible
    pub realtime: bool,

    #[default(60)]
    #[arg(long)]
    /// log flock statistics every n ticks, 0 disables
    pub report_every: u64,

    #[default(4)]
    #[arg(short = 'r', long)]
    /// ratio of ticks/samples, e.g. 4 = sample every 4th tick
    pub sample_rate: u64,

    #[default(false)]
    #[arg(short = 's', long)]
    /// write the sampled trace as CSV
    pub save: bool,

    #[default(false)]
    #[arg(short = 't', long)]
    /// timestamp the trace file name instead of overwriting
    pub save_timestamp: bool,

    #[default("./".to_owned())]
    #[arg(long)]
    pub save_path: String,

    #[default(800)]
    #[arg(short = 'x', long)]
    pub init_width: u32,

    #[default(600)]
    #[arg(short = 'y', long)]
    pub init_height: u32,

    #[default(0)]
    #[arg(long)]
    pub seed: u64,

    #[default(false)]
    #[arg(long)]
    /// ignore `seed` and seed from entropy
    pub random: bool,

    #[default(false)]
    #[arg(long)]
    /// start from the classic preset: no fatigue, no field of vision, no smoothing
    pub classic: bool,

    #[default(false)]
    #[arg(long)]
    /// update boids in place, later boids see earlier boids' new state
    pub sequential: bool,

    #[default(1.2)]
    #[arg(long)]
    pub turn_factor: f32,

    #[default(10.)]
    #[arg(long)]
    pub max_speed: f32,

    #[default(2.)]
    #[arg(long)]
    /// 0 disables the speed floor, ignored with --classic
    pub min_speed: f32,

    #[default(0.3)]
    #[arg(long)]
    /// share of the steered velocity taken each tick, ignored with --classic
    pub blend: f32,

    #[default(1.5)]
    #[arg(long = "sep_coef")]
    pub separation_coefficient: f32,
    #[default(1.2)]
    #[arg(long = "ali_coef")]
    pub alignment_coefficient: f32,
    #[default(1.2)]
    #[arg(long = "coh_coef")]
    pub cohesion_coefficient: f32,
    #[default(2.)]
    #[arg(long = "wall_coef")]
    pub wall_coefficient: f32,

    #[default(20.)]
    #[arg(long = "sep_dist")]
    pub separation_distance: f32,
    #[default(25.)]
    #[arg(long = "ali_dist")]
    pub alignment_distance: f32,
    #[default(25.)]
    #[arg(long = "coh_dist")]
    pub cohesion_distance: f32,
    #[default(20.)]
    #[arg(long = "margin")]
    pub wall_margin: f32,

    #[default(120.)]
    #[arg(long = "fov")]
    /// field of vision in degrees
    pub field_of_vision: f32,

    #[default(50.)]
    #[arg(long)]
    pub max_fatigue: f32,
    #[default(0.5)]
    #[arg(long)]
    pub fatigue_rate: f32,

    #[default(false)]
    #[arg(short = 'v', long)]
    /// debug logging, `RUST_LOG` takes precedence
    pub verbose: bool,
}

impl Config {
    pub fn run_options(&self) -> RunOptions {
        let mut run_options = if self.classic {
            RunOptions::classic()
        } else {
            RunOptions {
                min_speed: (self.min_speed > 0.).then_some(self.min_speed),
                velocity_blend: self.blend,
                field_of_vision_deg: self.field_of_vision,
                ..Default::default()
            }
        };

        run_options.init_boids = self.no_boids;
        run_options.window = options::get_window_size(self.init_width, self.init_height);
        run_options.seed = (!self.random).then_some(self.seed);
        run_options.update_order = if self.sequential {
            UpdateOrder::Sequential
        } else {
            UpdateOrder::Snapshot
        };

        run_options.turn_factor = self.turn_factor;
        run_options.max_speed = self.max_speed;
        run_options.max_fatigue = self.max_fatigue;
        run_options.fatigue_rate = self.fatigue_rate;

        run_options.separation_coefficient = self.separation_coefficient;
        run_options.alignment_coefficient = self.alignment_coefficient;
        run_options.cohesion_coefficient = self.cohesion_coefficient;
        run_options.wall_coefficient = self.wall_coefficient;

        run_options.separation_distance = self.separation_distance;
        run_options.alignment_distance = self.alignment_distance;
        run_options.cohesion_distance = self.cohesion_distance;
        run_options.wall_margin = self.wall_margin;

        run_options.sample_rate = self.sample_rate;
        run_options.save_options = SaveOptions {
            save_locations: self.save,
            save_locations_path: Some(self.save_path.clone()),
            save_locations_timestamp: self.save_timestamp,
        };

        run_options
    }
}
