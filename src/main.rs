mod display;
mod input;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use rechess_core::{Color, StandardOracle};
use rechess_game::{Controller, Event, Notification, SessionConfig, TICK_INTERVAL, spawn_ticker};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Play and analyze chess against a UCI engine from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a UCI engine executable
    engine: Option<PathBuf>,

    /// Base time per side in seconds
    #[arg(short, long)]
    time: Option<u64>,

    /// Increment per move in seconds
    #[arg(short, long)]
    increment: Option<u64>,

    /// Let the engine play White
    #[arg(long)]
    engine_white: bool,

    /// Let the engine ponder on the opponent's time
    #[arg(long)]
    ponder: bool,

    /// Start from this FEN instead of the standard position
    #[arg(long)]
    fen: Option<String>,

    /// Extra setting as key=value, e.g. engine.depth=20 (repeatable)
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    settings: Vec<String>,
}

impl Args {
    fn config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::default();
        for pair in &self.settings {
            config
                .set_pair(pair)
                .with_context(|| format!("invalid setting \"{pair}\""))?;
        }
        if let Some(time) = self.time {
            config.clock_time = time;
        }
        if let Some(increment) = self.increment {
            config.clock_increment = increment;
        }
        if self.engine_white {
            config.engine_color = Color::White;
        }
        if self.ponder {
            config.engine.ponder = true;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config()?;
    info!(?config, "rechess starting");

    let (tx, rx) = mpsc::channel();
    let mut controller = Controller::new(config.clone(), Arc::new(StandardOracle), tx.clone());

    if let Some(fen) = args.fen {
        let notes = controller.dispatch(Event::SetFen(fen));
        print_notes(&controller, &notes);
    }
    if let Some(path) = args.engine {
        let notes = controller.dispatch(Event::LoadEngine(path));
        print_notes(&controller, &notes);
    }

    input::spawn_reader(tx.clone(), config);
    spawn_ticker(tx, TICK_INTERVAL);
    println!("{}", input::HELP);
    println!("{}", display::render(&controller));

    controller.run(&rx, print_notes);
    Ok(())
}

fn print_notes(controller: &Controller, notes: &[Notification]) {
    for note in notes {
        if let Some(text) = display::describe(note) {
            println!("{text}");
        }
    }
    if display::needs_board(notes) {
        println!("{}", display::render(controller));
    }
}
