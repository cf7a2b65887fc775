//! `ssd`: command-line runner for the SSD template-matching accelerator.
//!
//! ```text
//! USAGE:
//!   ssd classify                 Hardware pass, software check, perf report
//!   ssd reference                Software pass only
//!   ssd trace <template-id>      One simulated handshake, bus transactions printed
//!   ssd bench [--iterations N]   Pass latency statistics
//!
//! GLOBAL:
//!   --config <file.toml>         Window, vector and template table
//!   --backend sim|auto|mmio      Register backend (default sim)
//!   --max-polls <N>              Give up on DONE after N status polls
//! ```

mod perf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use perf::{LatencyStats, PerfMonitor, Section};
use ssd_driver::backends::BusEvent;
use ssd_driver::{
    compare, hardware_pass, select_backend, software_pass, Agreement, BackendSelection,
    ClassifierConfig, HardwareLink, RegisterBus, SimulatedAccelerator, TemplateId,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const DEFAULT_ITERATIONS: usize = 1000;
const WARMUP_ITERATIONS: usize = 20;
const RULE: &str = "=========================================================";
const THIN_RULE: &str = "---------------------------------------------------------";

#[derive(Parser)]
#[command(name = "ssd", about = "SSD template-matching accelerator runner", version)]
struct Cli {
    /// TOML configuration; the reference table and window are used if omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Register backend. The accelerator is only touched when asked for.
    #[arg(long, value_enum, default_value_t = BackendArg::Sim, global = true)]
    backend: BackendArg,

    /// Fail with a timeout after this many status polls instead of waiting forever.
    #[arg(long, global = true)]
    max_polls: Option<u64>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Mapped accelerator if the config names a device, else the model
    Auto,
    /// Mapped accelerator only
    Mmio,
    /// In-memory model
    #[value(alias = "simulated")]
    Sim,
}

impl From<BackendArg> for BackendSelection {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Self::Auto,
            BackendArg::Mmio => Self::Mmio,
            BackendArg::Sim => Self::Simulated,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Classify the captured vector on the accelerator and check it in software.
    Classify,
    /// Classify the captured vector with the software reference only.
    Reference,
    /// Run one handshake against the model and print every register access.
    Trace {
        /// Template ID to select.
        template_id: u8,
    },
    /// Repeat both passes and report latency statistics.
    Bench {
        /// Timed iterations per pass.
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.max_polls)?;
    let selection = BackendSelection::from(cli.backend);

    match cli.command {
        Cmd::Classify => cmd_classify(&config, selection)?,
        Cmd::Reference => cmd_reference(&config)?,
        Cmd::Trace { template_id } => cmd_trace(&config, TemplateId::new(template_id))?,
        Cmd::Bench { iterations } => cmd_bench(&config, selection, iterations)?,
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>, max_polls: Option<u64>) -> Result<ClassifierConfig> {
    let config = match path {
        Some(path) => ClassifierConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClassifierConfig::reference(),
    };
    // The flag only overrides; it never clears a bound set in the file.
    match max_polls {
        Some(n) => Ok(config.with_max_polls(Some(n))?),
        None => Ok(config),
    }
}

fn print_header(config: &ClassifierConfig, backend: &str) {
    println!(
        "Classifying captured vector {:?} against {} templates ({backend})",
        config.vector().samples(),
        config.templates().len()
    );
    println!("{RULE}");
}

fn cmd_classify(config: &ClassifierConfig, selection: BackendSelection) -> Result<()> {
    let mut perf = PerfMonitor::new();
    perf.begin(Section::Total);

    let bus = select_backend(selection, config)?;
    print_header(config, &format!("{} backend", bus.backend_type()));
    let mut link = HardwareLink::from_config(bus, config);

    perf.begin(Section::Hardware);
    let hw = hardware_pass(&mut link, config.vector(), config.templates(), |r| {
        println!(
            ">> SSD (captured vs {} [ID {}]): {}",
            r.label, r.template_id, r.distance
        );
    });
    perf.end(Section::Hardware);
    let hw = hw?;

    println!();
    println!("{RULE}");
    println!("FINAL CLASSIFICATION (HARDWARE):");
    println!("Closest template     : {}", hw.label());
    println!("Minimum SSD          : {}", hw.distance());
    println!("{THIN_RULE}");

    perf.begin(Section::Software);
    let sw = software_pass(config.vector(), config.templates(), |_| {});
    perf.end(Section::Software);
    let sw = sw?;

    println!("Minimum SSD (SOFTWARE): {} ({})", sw.distance(), sw.label());
    let agreement = compare(&hw, &sw);
    match &agreement {
        Agreement::Match => println!("Hardware/software    : agree"),
        Agreement::Mismatch { hardware, software } => println!(
            "Hardware/software    : DISAGREE (hw {:?} {} vs sw {:?} {})",
            hardware.0.map(TemplateId::get),
            hardware.1,
            software.0.map(TemplateId::get),
            software.1
        ),
    }
    println!("{THIN_RULE}");

    perf.end(Section::Total);
    println!();
    print!("{perf}");

    if !agreement.is_match() {
        bail!("hardware result does not match the software reference");
    }
    Ok(())
}

fn cmd_reference(config: &ClassifierConfig) -> Result<()> {
    print_header(config, "software reference");
    let sw = software_pass(config.vector(), config.templates(), |r| {
        println!(
            ">> SSD (captured vs {} [ID {}]): {}",
            r.label, r.template_id, r.distance
        );
    })?;
    println!("{RULE}");
    println!("Closest template     : {}", sw.label());
    println!("Minimum SSD          : {}", sw.distance());
    Ok(())
}

fn cmd_trace(config: &ClassifierConfig, template_id: TemplateId) -> Result<()> {
    let sim = SimulatedAccelerator::new(config.templates().clone(), config.layout());
    let mut link = HardwareLink::from_config(sim, config);
    let distance = link.run_handshake(config.vector(), template_id);

    let sim = link.bus();
    for (i, event) in sim.trace().iter().enumerate() {
        match *event {
            BusEvent::Write { reg, value } => println!("{i:>4}  W {reg:<10} {value:#010x}"),
            BusEvent::Read { reg, value } => println!("{i:>4}  R {reg:<10} {value:#010x}"),
        }
    }
    for v in sim.violations() {
        println!("violation at {}: {}", v.event, v.reason);
    }

    let distance = distance?;
    let template = config.templates().get(template_id)?;
    println!("{THIN_RULE}");
    println!(
        "SSD (captured vs {} [ID {}]): {distance}",
        template.label(),
        template_id
    );
    Ok(())
}

fn cmd_bench(
    config: &ClassifierConfig,
    selection: BackendSelection,
    iterations: usize,
) -> Result<()> {
    if iterations == 0 {
        bail!("--iterations must be at least 1");
    }

    let bus = select_backend(selection, config)?;
    println!("SSD pass latency benchmark");
    println!("==========================");
    println!("Backend    : {}", bus.backend_type());
    println!("Templates  : {}", config.templates().len());
    println!("Samples    : {}", config.vector().len());
    println!("Iterations : {iterations}");
    println!();

    let mut link = HardwareLink::from_config(bus, config);
    let vector = config.vector();
    let table = config.templates();

    for _ in 0..WARMUP_ITERATIONS {
        hardware_pass(&mut link, vector, table, |_| {})?;
        software_pass(vector, table, |_| {})?;
    }

    let mut hw_samples = Vec::with_capacity(iterations);
    let mut sw_samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let t0 = Instant::now();
        let hw = hardware_pass(&mut link, vector, table, |_| {})?;
        hw_samples.push(t0.elapsed());

        let t0 = Instant::now();
        let sw = software_pass(vector, table, |_| {})?;
        sw_samples.push(t0.elapsed());

        if !compare(&hw, &sw).is_match() {
            bail!("hardware result diverged from the software reference");
        }
    }

    if let Some(stats) = LatencyStats::from_samples(hw_samples) {
        println!("Hardware pass  {stats}");
    }
    if let Some(stats) = LatencyStats::from_samples(sw_samples) {
        println!("Software pass  {stats}");
    }
    Ok(())
}
