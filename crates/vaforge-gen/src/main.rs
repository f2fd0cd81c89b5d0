use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use console::Style;
use fern::Dispatch;
use log::{Level, LevelFilter, debug, info};
use miette::{IntoDiagnostic, Result, bail};
use vaforge::ModuleOptions;

mod bench;

const CONFIG_FILE: &str = "vaforge.toml";

#[derive(Parser)]
#[command(name = "vaforge-gen", version, about = "Generate Verilog-A stimulus benches")]
struct Opt {
    /// Debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Warnings and errors only
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Options file; defaults to `vaforge.toml` in the working directory when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled benches
    List,
    /// Build benches and write their files
    Build(OptBuild),
}

#[derive(Args)]
struct OptBuild {
    /// Bench names, see `list`
    #[arg(required = true)]
    benches: Vec<String>,

    /// Output directory for .va and marker files
    #[arg(long, default_value = "generated")]
    out_dir: PathBuf,

    /// Print a JSON summary to stdout
    #[arg(long)]
    json: bool,
}

fn init_logging(opt: &Opt) -> Result<()> {
    let level = if opt.verbose {
        LevelFilter::Debug
    } else if opt.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    Dispatch::new()
        .format(|out, message, record| {
            let style = match record.level() {
                Level::Error => Style::new().red().bright(),
                Level::Warn => Style::new().yellow().bright(),
                Level::Info => Style::new().green().bright(),
                Level::Debug => Style::new().cyan().bright(),
                Level::Trace => Style::new().magenta().bright(),
            };
            out.finish(format_args!(
                "{} {}",
                style.apply_to(format!("[{:<5}]", record.level())),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .into_diagnostic()
}

fn load_options(config: Option<&Path>) -> Result<ModuleOptions> {
    match config {
        Some(path) => ModuleOptions::load(path).into_diagnostic(),
        None if Path::new(CONFIG_FILE).exists() => {
            debug!("Using {CONFIG_FILE} from the working directory");
            ModuleOptions::load(CONFIG_FILE).into_diagnostic()
        }
        None => Ok(ModuleOptions::default()),
    }
}

fn cmd_list() {
    for bench in bench::BENCHES {
        println!("{:<14} {}", bench.name, bench.description);
    }
}

fn cmd_build(opt: &OptBuild, options: &ModuleOptions) -> Result<()> {
    let mut summaries = Vec::new();
    for name in &opt.benches {
        let Some(bench) = bench::find(name) else {
            let known: Vec<&str> = bench::BENCHES.iter().map(|b| b.name).collect();
            bail!("Unknown bench `{name}` (expected one of: {})", known.join(", "));
        };
        let generated = bench.build(options).into_diagnostic()?;
        summaries.push(bench::write_outputs(name, &generated, &opt.out_dir)?);
    }

    if opt.json {
        let json = serde_json::to_string_pretty(&summaries).into_diagnostic()?;
        println!("{json}");
    }
    info!(
        "Done: {} module(s) written to {}",
        summaries.len(),
        opt.out_dir.display()
    );
    Ok(())
}

fn main() -> Result<ExitCode> {
    let opt = Opt::parse();
    init_logging(&opt)?;

    let now = Instant::now();
    let options = load_options(opt.config.as_deref())?;

    match &opt.command {
        Commands::List => cmd_list(),
        Commands::Build(x) => cmd_build(x, &options)?,
    }

    debug!("Elapsed time ({} milliseconds)", now.elapsed().as_millis());
    Ok(ExitCode::SUCCESS)
}
