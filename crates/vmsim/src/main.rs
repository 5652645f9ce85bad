use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use vmm::{
    BackingStoreConfig, CsvTrace, DEFAULT_PRESSURE_THRESHOLD, HumanSize, MemoryStats, NullTrace,
    PressureAction, TraceSink, VirtualMemory, VmConfig,
};

use crate::console::Console;

mod console;
mod workload;

#[derive(Parser)]
#[command(name = "vmsim")]
#[command(about = "Demand-paged virtual memory emulator")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Write the access trace as CSV to this file instead of stdout
    #[arg(short, long, global = true)]
    trace: Option<PathBuf>,

    /// Do not write an access trace
    #[arg(long, global = true, conflicts_with = "trace")]
    no_trace: bool,

    /// Number of swapped pages after which backing store growth is reported
    #[arg(long, global = true, default_value_t = DEFAULT_PRESSURE_THRESHOLD)]
    swap_threshold: usize,

    /// Do not report backing store growth
    #[arg(long, global = true)]
    quiet_swap: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Touch consecutive pages, one i32 per page
    Fill {
        /// Number of pages to touch
        #[arg(short, long, default_value_t = 65)]
        pages: usize,
    },
    /// Check that a value survives eviction and reload
    Sentinel {
        /// Value written and read back
        #[arg(long, default_value_t = 0x5EED, allow_negative_numbers = true)]
        value: i32,
    },
    /// Fill an i32 array with its indices and verify it repeatedly
    Sweep {
        /// Number of elements in the array
        #[arg(short, long, default_value_t = 131_072)]
        elements: usize,

        /// Number of verification passes
        #[arg(short, long, default_value_t = 2)]
        passes: usize,
    },
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn config(&self) -> VmConfig {
        let action = if self.quiet_swap {
            PressureAction::Ignore
        } else {
            PressureAction::Log(log::Level::Warn)
        };
        VmConfig::default().with_backing_store(
            BackingStoreConfig::default()
                .with_pressure_threshold(self.swap_threshold)
                .with_pressure_action(action),
        )
    }

    fn trace_writer(&self) -> Result<Box<dyn Write>> {
        Ok(match &self.trace {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create trace file {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout().lock())),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    Console::init(args.log_level())
        .map_err(|err| anyhow!("failed to install logger: {err}"))?;

    let summary = if args.no_trace {
        run(&args.command, &VirtualMemory::with_trace(args.config(), NullTrace))?
    } else {
        let trace =
            CsvTrace::new(args.trace_writer()?).context("failed to write trace header")?;
        run(&args.command, &VirtualMemory::with_trace(args.config(), trace))?
    };
    report(&summary);
    Ok(())
}

/// Runs `command` against `vm`, flushes the trace and returns the final stats.
fn run<S: TraceSink>(command: &Command, vm: &VirtualMemory<S>) -> Result<Report> {
    log::info!("running {:?}", command);
    match *command {
        Command::Fill { pages } => workload::fill(vm, pages)?,
        Command::Sentinel { value } => workload::sentinel(vm, value)?,
        Command::Sweep { elements, passes } => workload::sweep(vm, elements, passes)?,
    }

    vm.flush_trace().context("failed to flush trace")?;
    Ok(Report {
        stats: vm.stats()?,
        allocated: vm.allocated_bytes()?,
    })
}

struct Report {
    stats: MemoryStats,
    allocated: u64,
}

fn report(report: &Report) {
    let stats = &report.stats;
    eprintln!("allocated:     {}", HumanSize(report.allocated as usize));
    eprintln!("translations:  {}", stats.translations);
    eprintln!(
        "faults:        {} ({} first touch, {} swap-in)",
        stats.faults, stats.first_touches, stats.swap_ins
    );
    eprintln!("evictions:     {}", stats.evictions);
    eprintln!("directories:   {}", stats.directories);
    eprintln!(
        "frames:        {} resident, {} free",
        stats.resident_pages, stats.free_frames
    );
    eprintln!("swapped pages: {}", stats.swapped_pages);
}
