//! Bootstrap Ignition CLI
//!
//! Usage:
//!   bootstrap-ignition render [OPTIONS] <DESCRIPTOR>
//!   bootstrap-ignition check [--strict] <CLC>

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use bootstrap_ignition::api::v1alpha4::ContainerLinuxConfig;
use bootstrap_ignition::{
    build_ignition, convert, render, BootstrapDescriptor, ConvertError, RenderConfig, Skeleton,
};

#[derive(Parser)]
#[command(name = "bootstrap-ignition")]
#[command(about = "Render kubeadm bootstrap data as Ignition config")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a bootstrap descriptor (TOML) to Ignition JSON
    Render {
        descriptor: PathBuf,

        /// Container Linux Config fragment merged after the generated config
        #[arg(short, long)]
        additional: Option<PathBuf>,

        /// Fail on any diagnostic from the additional fragment
        #[arg(long)]
        strict: bool,

        #[arg(long, value_enum, default_value_t = SkeletonArg::Minimal)]
        skeleton: SkeletonArg,

        /// Spaces before embedded file contents
        #[arg(long, default_value_t = 8)]
        content_indent: usize,

        /// Print the generated Container Linux Config instead of Ignition
        #[arg(long)]
        clc_only: bool,
    },

    /// Convert a Container Linux Config and print its diagnostics
    Check {
        input: PathBuf,

        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SkeletonArg {
    Minimal,
    CoreosMetadata,
}

impl From<SkeletonArg> for Skeleton {
    fn from(arg: SkeletonArg) -> Self {
        match arg {
            SkeletonArg::Minimal => Skeleton::Minimal,
            SkeletonArg::CoreosMetadata => Skeleton::CoreosMetadata,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render {
            descriptor,
            additional,
            strict,
            skeleton,
            content_indent,
            clc_only,
        } => run_render(
            &descriptor,
            additional.as_deref(),
            strict,
            RenderConfig::new()
                .with_skeleton(skeleton.into())
                .with_content_indent(content_indent),
            clc_only,
        ),
        Command::Check { input, strict } => run_check(&input, strict),
    };

    if let Err(message) = result {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("reading '{}': {}", path.display(), e))
}

fn run_render(
    descriptor: &Path,
    additional: Option<&Path>,
    strict: bool,
    config: RenderConfig,
    clc_only: bool,
) -> Result<(), String> {
    let loaded = BootstrapDescriptor::from_file(descriptor)
        .map_err(|e| format!("loading descriptor '{}': {}", descriptor.display(), e))?;
    let base_clc = render(&loaded, &config).map_err(|e| e.to_string())?;

    if clc_only {
        print!("{}", base_clc);
        return Ok(());
    }

    let clc = ContainerLinuxConfig {
        additional_config: additional.map(read).transpose()?.unwrap_or_default(),
        strict,
    };
    let rendered = build_ignition(&base_clc, &clc).map_err(|e| e.to_string())?;
    if !rendered.warnings.is_empty() {
        eprint!("{}", rendered.warnings);
    }

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&rendered.ignition)
        .and_then(|()| writeln!(stdout))
        .map_err(|e| format!("writing output: {}", e))
}

fn run_check(input: &Path, strict: bool) -> Result<(), String> {
    let source = read(input)?;
    let filename = input.display().to_string();

    match convert(&source, strict) {
        Ok((config, report)) => {
            eprint!("{}", report.format(&source, &filename));
            println!(
                "{}: ok ({} files, {} units, {} diagnostics)",
                filename,
                config.files().len(),
                config.units().len(),
                report.len()
            );
            Ok(())
        }
        Err(err) => {
            if let Some(report) = err.report() {
                eprint!("{}", report.format(&source, &filename));
            }
            Err(match err {
                ConvertError::Empty => format!("{}: {}", filename, err),
                ConvertError::Parse(_) => format!("{}: Container Linux Config did not parse", filename),
                ConvertError::Translate(_) => {
                    format!("{}: Container Linux Config did not convert", filename)
                }
            })
        }
    }
}
