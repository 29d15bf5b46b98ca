//! ucontainer CLI - exercise scheduler and memory containers

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ucontainer::cli::{Args, SubCommand};
use ucontainer::workload::{run_memory, run_schedule, MemoryOptions, ScheduleOptions};
use ucontainer::{format_output, Limits, MemoryManager, OutputFormat, Report};

fn main() {
    let args = Args::parse();
    ucontainer::logging::init(args.verbose);

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the workload checked out
fn run(args: Args) -> anyhow::Result<bool> {
    let limits = match &args.limits {
        Some(path) => Limits::from_json_file(path)
            .with_context(|| format!("loading limits from {}", path.display()))?,
        None => Limits::default(),
    };
    let format = if args.json { OutputFormat::Json } else { OutputFormat::Human };

    let report = match args.command {
        SubCommand::Schedule { containers, threads, switches } => {
            let options = ScheduleOptions { containers, threads, switches };
            Report::Schedule(run_schedule(&options).context("schedule workload failed")?)
        }

        SubCommand::Memory { containers, threads, objects, iterations, object_size } => {
            let stop = Arc::new(AtomicBool::new(false));
            let s = stop.clone();

            // Ctrl+C stops the workers between increments
            ctrlc::set_handler(move || {
                s.store(true, Ordering::SeqCst);
            })
            .context("failed to set Ctrl+C handler")?;

            let options = MemoryOptions { containers, threads, objects, iterations, object_size };
            let manager = Arc::new(MemoryManager::with_limits(limits));
            Report::Memory(run_memory(manager, &options, stop).context("memory workload failed")?)
        }
    };

    let text = format_output(&report, &format);
    match &args.output {
        Some(path) => fs::write(path, format!("{}\n", text))
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{}", text),
    }

    if args.verbose {
        eprintln!("\n--- Workload {} ---", if report.passed() { "passed" } else { "FAILED" });
    }

    Ok(report.passed())
}
