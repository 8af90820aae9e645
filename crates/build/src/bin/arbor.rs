use arbor_build::{
    Build, BuildError, BuildOptions, Builder, ConfigSource, NoRouteConfigs, SourceExportScanner, StaticRouteConfigs,
};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Compiles a routes directory into a route table and manifest.
#[derive(Parser, Debug)]
#[command(name = "arbor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the routes directory and write the JSON manifest.
    Manifest {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the manifest here instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Also write the import module.
        #[arg(long, value_name = "FILE")]
        module: Option<PathBuf>,
    },
    /// Print the flattened route table in match order.
    Routes {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// The routes directory.
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Build options in TOML.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-route overrides keyed by handler path, JSON or TOML.
    #[arg(long, value_name = "FILE")]
    overrides: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Manifest { source, out, module } => {
            let build = build(&source)?;
            let manifest = build.manifest();
            let json = manifest.to_json()?;
            match out {
                Some(path) => write(&path, &json)?,
                None => print!("{json}"),
            }
            if let Some(path) = module {
                write(&path, &manifest.render_module()?)?;
            }
        }
        Command::Routes { source } => {
            let build = build(&source)?;
            print!("{}", route_table(&build));
        }
    }
    Ok(())
}

fn build(args: &SourceArgs) -> Result<Build, BuildError> {
    let options = match &args.config {
        Some(path) => BuildOptions::load(path)?,
        None => BuildOptions::default(),
    };
    let overrides = args.overrides.as_deref().map(StaticRouteConfigs::load).transpose()?;
    let configs: &dyn ConfigSource = match &overrides {
        Some(overrides) => overrides,
        None => &NoRouteConfigs,
    };

    Builder::new(&options).with_configs(configs).with_exports(&SourceExportScanner).build(&args.root)
}

fn route_table(build: &Build) -> String {
    let width = build.routes().iter().map(|route| route.pattern().to_string().len()).max().unwrap_or_default();

    let mut table = String::new();
    for route in build.routes() {
        let chain: Vec<&str> = route
            .middleware()
            .iter()
            .chain(route.effective_layouts().iter())
            .map(|link| build.file(link.file).relative_path())
            .chain([build.file(route.handler()).relative_path()])
            .collect();
        table.push_str(&format!("{:<width$}  {}\n", route.pattern().to_string(), chain.join(" > ")));
    }
    table
}

fn write(path: &Path, content: &str) -> Result<(), CliError> {
    fs::write(path, content).map_err(|source| CliError::Write { path: path.to_path_buf(), source })
}
