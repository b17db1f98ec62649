use anyhow::Result;
use clap::Parser;
use hindsight::{
    record::LogRecorder,
    run::{load_yaml, run_dqn, run_pg, save_yaml, DqnRunConfig, PgRunConfig},
};
use log::info;
use std::path::PathBuf;

/// Train an agent in the corridor environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file of the run configuration, defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Train a policy-gradient agent instead of DQN
    #[arg(long, default_value_t = false)]
    pg: bool,

    /// Render the environment during evaluation
    #[arg(short, long, default_value_t = false)]
    render: bool,

    /// Write the configuration to this YAML file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn dqn(args: &Args) -> Result<()> {
    let config: DqnRunConfig = match &args.config {
        Some(path) => load_yaml(path)?,
        None => DqnRunConfig::default(),
    };
    if let Some(path) = &args.save_config {
        save_yaml(&config, path)?;
        info!("Saved configuration to {:?}", path);
        return Ok(());
    }

    let mut recorder = LogRecorder::new();
    let (state, record) = run_dqn(&config, &mut recorder, args.render)?;
    info!(
        "Finished after {} steps and {} episodes, evaluation return = {}",
        state.step,
        state.episodes,
        record.get_scalar("episode_return")?
    );
    Ok(())
}

fn pg(args: &Args) -> Result<()> {
    let config: PgRunConfig = match &args.config {
        Some(path) => load_yaml(path)?,
        None => PgRunConfig::default(),
    };
    if let Some(path) = &args.save_config {
        save_yaml(&config, path)?;
        info!("Saved configuration to {:?}", path);
        return Ok(());
    }

    let mut recorder = LogRecorder::new();
    let state = run_pg(&config, &mut recorder)?;
    info!(
        "Finished after {} iterations, {} episodes and {} steps",
        state.iters, state.episodes, state.env_steps
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.pg {
        pg(&args)
    } else {
        dqn(&args)
    }
}
