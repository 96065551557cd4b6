#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Pursuit encounter headlessly.

mod board;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pursuit_core::{Event, TurnStatus};
use pursuit_system_turn::Encounter;
use pursuit_world::{query, World};
use tracing_subscriber::EnvFilter;

/// Runs a pursuer against an evader on a grid until one of them wins.
#[derive(Debug, Parser)]
#[command(name = "pursuit", version)]
struct CliArgs {
    /// TOML file describing the encounter. Defaults to the divided field.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for apple placement, overriding the configured one.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of turns after which the encounter is abandoned.
    #[arg(long, default_value_t = 10_000)]
    max_turns: u32,
    /// Print the board every N turns. Zero disables the board.
    #[arg(long, value_name = "N", default_value_t = 0)]
    render_every: u32,
    /// Log planner and world decisions.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Pursuit command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let mut game = config::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        game.seed = Some(seed);
    }
    tracing::info!(
        width = game.width,
        height = game.height,
        seed = ?game.seed,
        order = ?game.resolution_order,
        "starting encounter"
    );

    let mut spawned = Vec::new();
    let mut world = World::with_events(game, &mut spawned).context("failed to build the world")?;
    report(&spawned);
    let mut encounter = Encounter::for_world(&world);
    println!("{}", query::welcome_banner(&world));

    let status = run(&mut world, &mut encounter, &args);
    match status.reason() {
        Some(reason) => println!("Game over after {} turns: {reason}.", query::tick_index(&world)),
        None => println!("No winner after {} turns.", args.max_turns),
    }

    Ok(())
}

fn run(world: &mut World, encounter: &mut Encounter, args: &CliArgs) -> TurnStatus {
    let mut status = TurnStatus::Continuing;
    let mut events = Vec::new();

    for turn in 1..=args.max_turns {
        events.clear();
        status = encounter.play_turn(world, &mut events);
        report(&events);

        if args.render_every > 0 && (turn % args.render_every == 0 || status.is_terminal()) {
            println!("turn {turn}");
            print!("{}", board::render(world));
        }
        if status.is_terminal() {
            break;
        }
    }

    status
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::AppleConsumed {
                role,
                position,
                score,
            } => println!("The {role} ate the apple at {position}. Score: {score}"),
            Event::AppleSpawned {
                position,
                remaining_life,
            } => tracing::debug!(%position, remaining_life, "apple placed"),
            Event::MoveRejected { role, to, reason } => {
                tracing::warn!(%role, %to, %reason, "move rejected");
            }
            _ => {}
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
