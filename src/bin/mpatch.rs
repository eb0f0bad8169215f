//! mpatch - Inject patches into rendered manifests
//!
//! Reads a multi-document YAML stream (for example `helm template` output),
//! runs the mutation pipeline over it, and prints either the registered JSON
//! Patches or the patched manifests.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use manifest_patch::materialize::{Materializer, TypeRegistry, TypedMaterializer, UntypedMaterializer};
use manifest_patch::mutation::MutationConfig;
use manifest_patch::object::RenderedObject;
use manifest_patch::pipeline::{Pipeline, Report};
use manifest_patch::value;

/// Inject patches into rendered Kubernetes manifests
#[derive(Parser, Debug)]
#[command(name = "mpatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the JSON Patch registered for each object
    Patches(RunArgs),
    /// Print the manifests with their patches applied
    Apply(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Multi-document YAML file of rendered manifests ('-' for stdin)
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// How objects are projected before the rules run
    #[arg(long, value_enum, default_value_t = Strategy::Untyped)]
    strategy: Strategy,

    /// YAML file with the annotations and env entry to inject
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    /// Generic tree, any kind
    Untyped,
    /// k8s-openapi structs for registered kinds
    Typed,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let (args, apply) = match cli.command {
        Command::Patches(args) => (args, false),
        Command::Apply(args) => (args, true),
    };

    match run(&args, apply) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &RunArgs, apply: bool) -> Result<(), Box<dyn std::error::Error>> {
    let content = if args.file.as_os_str() == "-" {
        io::read_to_string(io::stdin())?
    } else {
        fs::read_to_string(&args.file)
            .map_err(|e| format!("Failed to read manifests {:?}: {}", args.file, e))?
    };
    let objects = RenderedObject::from_yaml_stream(&content)
        .map_err(|e| format!("Failed to parse manifests: {}", e))?;

    let config = match &args.config {
        Some(path) => MutationConfig::from_file(path)?,
        None => MutationConfig::default(),
    };

    let registry = TypeRegistry::kubernetes();
    let report = match args.strategy {
        Strategy::Untyped => mutate(UntypedMaterializer, &config, &objects)?,
        Strategy::Typed => mutate(TypedMaterializer::new(&registry), &config, &objects)?,
    };
    info!(
        objects = objects.len(),
        patches = report.registrations.patch_count(),
        skipped = report.skipped.len(),
        "Mutation complete"
    );

    let mut output: Box<dyn Write> = if args.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&args.output)
                .map_err(|e| format!("Failed to create output file {:?}: {}", args.output, e))?,
        )
    };

    if apply {
        write_manifests(&objects, &report, &mut output)
    } else {
        write_patches(&report, &mut output)
    }
}

fn mutate<M: Materializer>(
    materializer: M,
    config: &MutationConfig,
    objects: &[RenderedObject],
) -> Result<Report, Box<dyn std::error::Error>> {
    Ok(Pipeline::new(materializer, config).run(objects)?)
}

fn write_patches(report: &Report, output: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    for registration in report.registrations.iter() {
        if registration.patches.is_empty() {
            continue;
        }
        writeln!(output, "# {}", registration.identity)?;
        writeln!(output, "{}", serde_json::to_string_pretty(&registration.patches)?)?;
    }
    Ok(())
}

fn write_manifests(
    objects: &[RenderedObject],
    report: &Report,
    output: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    for object in objects {
        let patched = report
            .registrations
            .apply(object)
            .map_err(|e| format!("{}: failed to apply patches: {}", object.identity(), e))?;
        writeln!(output, "---")?;
        write!(output, "{}", value::to_yaml(&patched)?)?;
    }
    Ok(())
}
