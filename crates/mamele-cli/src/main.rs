//! mamele random player
//!
//! Launches MAME on a game and mashes keys at random for a number of games.

mod player;

use anyhow::Result;
use clap::Parser;
use mamele_driver::{DriverConfig, DriverSession, MameLauncher};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mamele-random-player")]
#[command(about = "Gentle keymasher for MAME games")]
#[command(version)]
struct Args {
    /// Game to play
    game: String,
    /// Number of games to play. 0 for never-ending.
    #[arg(short, long, default_value_t = 3)]
    number: u32,
    /// Verbosity. Repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// JSON file with restart timings and the connect timeout
    #[arg(long)]
    config: Option<PathBuf>,
    /// mamele build directory holding mame64 and learning_environment
    #[arg(long, default_value = "mamele_real")]
    mame_dir: PathBuf,
    /// ROM directory. Default: ~/.le/roms
    #[arg(long)]
    rom_path: Option<PathBuf>,
    /// Show the game window and play at normal speed
    #[arg(long)]
    watch: bool,
    /// Print the game's action space as JSON and exit
    #[arg(long)]
    describe: bool,
    /// Seed for reproducible play
    #[arg(long)]
    seed: Option<u64>,
}

fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.verbose))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => DriverConfig::from_json_file(path)?,
        None => DriverConfig::default(),
    };

    let mut launcher = MameLauncher::new(&args.mame_dir).watch(args.watch);
    if let Some(rom_path) = args.rom_path {
        launcher = launcher.with_rom_path(rom_path);
    }

    let mut session = DriverSession::start(&args.game, &launcher, &config).await?;
    info!(
        "Playing {} on a {} screen",
        args.game,
        session.screen_dimensions()
    );

    if args.describe {
        println!(
            "{}",
            serde_json::to_string_pretty(session.minimal_action_set())?
        );
        session.quit().await?;
        return Ok(());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let stats = player::play(&mut session, args.number, &mut rng).await?;
    info!(
        "Played {} games over {} frames, total reward {}",
        stats.games, stats.frames, stats.total_reward
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["mamele-random-player", "pong"]);
        assert_eq!(args.game, "pong");
        assert_eq!(args.number, 3);
        assert_eq!(args.verbose, 0);
        assert!(!args.watch);
        assert!(!args.describe);
    }

    #[test]
    fn test_args_verbosity() {
        let args = Args::parse_from(["mamele-random-player", "-vv", "-n", "0", "galaxian"]);
        assert_eq!(args.number, 0);
        assert_eq!(log_level(args.verbose), Level::TRACE);
    }
}
