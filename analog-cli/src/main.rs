mod keymap;
mod replay;
mod resolve;
mod trace;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::keymap::{DemoKeymap, Options, CHANNELS};

#[derive(Parser)]
#[command(name = "analog-cli")]
#[command(about = "Replay recorded Hall-effect samples through an analog keymap")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone, Copy)]
struct KeymapArgs {
    /// Use one hysteresis band for every key
    #[arg(long)]
    sensitivity: Option<u16>,
    /// Invert every filter, for sensors mounted the other way up
    #[arg(long)]
    invert: bool,
}

impl From<KeymapArgs> for Options {
    fn from(args: KeymapArgs) -> Self {
        Options {
            sensitivity: args.sensitivity,
            invert: args.invert,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Replay a sample trace through the demo keymap and print key transitions
    Replay {
        /// Trace file: one `<ms> <raw0> .. <raw7>` line per tick
        trace: PathBuf,
        #[command(flatten)]
        keymap: KeymapArgs,
        /// Don't draw a progress bar
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the resolved demo keymap
    Resolve {
        #[command(flatten)]
        keymap: KeymapArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Replay {
            trace: path,
            keymap: args,
            quiet,
        } => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let ticks = trace::parse_trace::<CHANNELS>(&contents)
                .with_context(|| format!("parsing {}", path.display()))?;

            let (keymap, report) = DemoKeymap::resolve(&keymap::config(args.into()));
            for row in report.rows() {
                warn!("{}", row);
            }
            info!("replaying {} ticks", ticks.len());

            let pb = if quiet {
                ProgressBar::hidden()
            } else {
                let pb = ProgressBar::new(ticks.len() as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ticks")
                        .context("building progress bar style")?
                        .progress_chars("=> "),
                );
                pb.set_message("Replaying");
                pb
            };

            let outcome = replay::replay(keymap, &ticks, &pb);
            pb.finish_and_clear();

            for transition in &outcome.transitions {
                let sign = if transition.pressed { '+' } else { '-' };
                println!("t={:>8}ms  {}{:?}", transition.now, sign, transition.key);
            }
            println!(
                "{} ticks, {} dispatches, {} key transitions, {} handler faults",
                outcome.ticks,
                outcome.dispatched,
                outcome.transitions.len(),
                outcome.faults
            );
        }
        Command::Resolve { keymap: args } => {
            let (keymap, report) = DemoKeymap::resolve(&keymap::config(args.into()));
            print!("{}", resolve::render(&keymap, &report));
        }
    }

    Ok(())
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
