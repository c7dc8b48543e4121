//! `dynemitc` — emit the two-routine scenario, run it, or list it.
//!
//! Usage:
//!   dynemitc [run] [--arg N] [--constant K] [--pause]
//!   dynemitc inspect [--constant K]
//!
//! `run` prints A(N) followed by the opaque entry identifiers of A and B.
//! With `--pause` the process waits for Enter before exiting, leaving time to
//! attach a debugger and look at the printed identifiers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dynemit::{
    scenario::{self, Pair, DEFAULT_CONSTANT},
    Val,
};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "dynemitc",
    about = "Emit two linked routines at runtime, invoke one, and print their entry identifiers.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invoke MethodA and print the result plus both identifiers (default)
    Run(RunArgs),
    /// Print signatures, identifiers and instruction listings
    Inspect {
        /// Constant MethodA passes to MethodB
        #[arg(
            long,
            value_name = "K",
            default_value_t = DEFAULT_CONSTANT,
            allow_negative_numbers = true
        )]
        constant: i32,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Argument passed to MethodA
    #[arg(long, value_name = "N", default_value_t = 5, allow_negative_numbers = true)]
    arg: i32,

    /// Constant MethodA passes to MethodB
    #[arg(
        long,
        value_name = "K",
        default_value_t = DEFAULT_CONSTANT,
        allow_negative_numbers = true
    )]
    constant: i32,

    /// Wait for Enter before exiting
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pause: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Run(args)) => cmd_run(&args),
        Some(Command::Inspect { constant }) => cmd_inspect(constant),
        None => cmd_run(&cli.run),
    }
}

fn emit(constant: i32) -> Result<Pair> {
    let pair = scenario::emit(constant).context("emitting MethodA/MethodB")?;
    info!(
        "emitted {} [{:016x}] and {} [{:016x}]",
        pair.a.name(),
        pair.a.opaque_identifier(),
        pair.b.name(),
        pair.b.opaque_identifier()
    );
    Ok(pair)
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let pair = emit(args.constant)?;

    let result = pair
        .a
        .invoke(&[Val::I32(args.arg)])
        .with_context(|| format!("invoking {}({})", pair.a.name(), args.arg))?;

    let mut out = io::stdout().lock();
    writeln!(out, "{result}")?;
    writeln!(out, "PointerA: {:016x}", pair.a.opaque_identifier())?;
    writeln!(out, "PointerB: {:016x}", pair.b.opaque_identifier())?;
    out.flush()?;

    if args.pause {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("waiting for Enter")?;
    }
    Ok(())
}

fn cmd_inspect(constant: i32) -> Result<()> {
    let pair = emit(constant)?;

    println!("=== dynemit scenario (constant {constant}) ===");
    for routine in [&pair.b, &pair.a] {
        println!(
            "{} : {} ({} instructions)",
            routine.name(),
            routine.signature(),
            routine.definition().body.len()
        );
        print!("{routine}");
    }
    Ok(())
}
