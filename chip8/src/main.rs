use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use simple_logger::SimpleLogger;

use emu8_core::{Chip8, Config, Quirks, CLOCK_SPEED};

mod display;
#[cfg(feature = "sdl")]
mod keymap;
mod run;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(clap::Parser, Debug)]
#[command(name = "emu8", version, about = "Run a Chip-8 program")]
struct Args {
    /// Program image to load at 0x200.
    rom: PathBuf,

    /// Instructions executed per second.
    #[arg(long, default_value_t = 1_000_000_000 / CLOCK_SPEED)]
    hz: u64,

    /// Number of instructions to execute before printing the screen and exiting.
    #[arg(long, default_value_t = 5_000)]
    cycles: u64,

    /// Don't sleep between instructions.
    #[arg(long, default_value_t = false)]
    unthrottled: bool,

    /// Seed for RND; runs with the same seed are repeatable.
    #[arg(long)]
    seed: Option<u64>,

    /// 8xy6/8xyE shift Vy into Vx instead of shifting Vx in place.
    #[arg(long, default_value_t = false)]
    shift_vy: bool,

    /// Sprites are cut off at the screen edge instead of wrapping.
    #[arg(long, default_value_t = false)]
    clip: bool,

    /// Tick the timers at 60Hz instead of once per instruction.
    #[arg(long, default_value_t = false)]
    decoupled_timers: bool,

    /// Open a window and run until it's closed.
    #[cfg(feature = "sdl")]
    #[arg(long, default_value_t = false)]
    window: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            quirks: Quirks {
                shift_reads_vy: self.shift_vy,
                clip_sprites: self.clip,
            },
            timers_in_step: !self.decoupled_timers,
        }
    }

    fn pacer(&self) -> anyhow::Result<run::Pacer> {
        if self.hz == 0 {
            return Err(anyhow!("--hz must be at least 1"));
        }
        Ok(run::Pacer::new(self.hz, !self.unthrottled))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    SimpleLogger::new()
        .with_level(args.log_level.into())
        .init()
        .map_err(|e| anyhow!("unable to install logger: {}", e))?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut chip8 = Chip8::with_rng(args.config(), rng);

    let file = File::open(&args.rom)
        .with_context(|| format!("unable to open {}", args.rom.display()))?;
    let mut reader = BufReader::new(file);
    chip8
        .load_rom_from(&mut reader)
        .with_context(|| format!("unable to load {}", args.rom.display()))?;
    info!("loaded {}", args.rom.display());

    let pacer = args.pacer()?;

    #[cfg(feature = "sdl")]
    if args.window {
        return run::run_windowed(&mut chip8, pacer);
    }

    run::run_headless(&mut chip8, pacer, args.cycles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["emu8", "game.ch8"]);
        assert_eq!(args.rom, PathBuf::from("game.ch8"));
        assert_eq!(args.hz, 500);
        assert_eq!(args.seed, None);
        assert_eq!(args.log_level, LogLevel::Warn);
        assert_eq!(args.config(), Config::default());
    }

    #[test]
    fn test_quirk_flags() {
        let args = Args::parse_from([
            "emu8",
            "game.ch8",
            "--shift-vy",
            "--clip",
            "--decoupled-timers",
            "--seed",
            "7",
        ]);
        let config = args.config();
        assert!(config.quirks.shift_reads_vy);
        assert!(config.quirks.clip_sprites);
        assert!(!config.timers_in_step);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn test_zero_hz_rejected() {
        let args = Args::parse_from(["emu8", "game.ch8", "--hz", "0"]);
        assert!(args.pacer().is_err());
    }
}
