use std::{
    fs, io,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use clap_serde_derive::{clap::Parser, ClapSerde};
use log::{debug, info, LevelFilter};
use murmuration_lib::{birdwatcher::Birdwatcher, flock::Flock};

mod cliargs;
use cliargs::{Args, Config, DEFAULT_CONFIG_PATH};

fn main() -> anyhow::Result<()> {
    // Parse whole args with clap
    let mut args = Args::parse();
    let (config, from_file) = load_config(&mut args)?;

    env_logger::Builder::new()
        .filter_level(if config.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match from_file {
        true => info!("configuration read from {}", args.config_path.display()),
        false => debug!("no config file at {}", args.config_path.display()),
    }
    debug!("effective configuration:\n{}", serde_yaml::to_string(&config)?);

    if !(config.tick_rate.is_finite() && config.tick_rate > 0.) {
        bail!("tick rate has to be positive, got {}", config.tick_rate);
    }

    let run_options = config.run_options();
    let mut flock = Flock::new(&run_options).context("invalid run options")?;
    let mut bird_watcher = Birdwatcher::new(run_options.sample_rate);
    let tick = Duration::from_secs_f64(1. / config.tick_rate);

    info!(
        "simulating {} boids for {} ticks in a {}x{} window",
        run_options.init_boids, config.ticks, run_options.window.width, run_options.window.height
    );

    let started = Instant::now();
    for _ in 0..config.ticks {
        let tick_started = Instant::now();

        flock.update(&run_options);
        bird_watcher.watch(&flock);

        if config.report_every > 0 && flock.ticks() % config.report_every == 0 {
            let stats = flock.stats();
            info!(
                "tick {}: mean speed {:.2}, mean fatigue {:.2}, rested/tired/fatigued {}/{}/{}",
                flock.ticks(),
                stats.mean_speed,
                stats.mean_fatigue,
                stats.rested,
                stats.tired,
                stats.fatigued
            );
        }

        if config.realtime {
            if let Some(rest) = tick.checked_sub(tick_started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }

    let elapsed = started.elapsed();
    info!(
        "finished {} ticks in {:.3}s ({:.1} ticks/s)",
        flock.ticks(),
        elapsed.as_secs_f64(),
        flock.ticks() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    let data = bird_watcher
        .pop_data_save(&run_options.save_options)
        .context("saving the trace failed")?;
    info!("collected {} samples", data.len());

    Ok(())
}

/// Merges the config file, if there is one, under the command line options.
fn load_config(args: &mut Args) -> anyhow::Result<(Config, bool)> {
    let path = args.config_path.clone();
    let Some(content) = read_config_file(&path)? else {
        return Ok((Config::from(&mut args.config), false));
    };

    let file = parse_config(&path, &content)
        .with_context(|| format!("error in configuration file {}", path.display()))?;

    Ok((Config::from(file).merge(&mut args.config), true))
}

/// Only a missing file at the default location counts as "no config file".
fn read_config_file(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err)
            if err.kind() == io::ErrorKind::NotFound && path == Path::new(DEFAULT_CONFIG_PATH) =>
        {
            Ok(None)
        }
        Err(err) => {
            Err(err).with_context(|| format!("can't read configuration file {}", path.display()))
        }
    }
}

fn parse_config(path: &Path, content: &str) -> anyhow::Result<<Config as ClapSerde>::Opt> {
    let opt = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(content)?,
        Some("json") => serde_json::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };

    Ok(opt)
}
