//! Packsmith CLI - scaffold policy packs from templates

use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use packsmith_core::{
    build_registry, IntegrationStatus, ProductConfig, Runtime, RuntimeCheck, ScaffoldError,
    ScaffoldOptions, ScaffoldReport, ScaffoldWorkflow, Settings,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter
const LOG_ENV: &str = "PACKSMITH_LOG";

/// Exit status after Ctrl+C or a timeout
const EXIT_CANCELLED: i32 = 130;

/// Packsmith product configuration
#[derive(Clone)]
pub struct PacksmithConfig;

impl ProductConfig for PacksmithConfig {
    fn name(&self) -> &'static str {
        "packsmith"
    }

    fn display_name(&self) -> &'static str {
        "Packsmith"
    }

    fn default_registry_url(&self) -> &'static str {
        "https://raw.githubusercontent.com/packsmith/packsmith/main/templates/policy"
    }

    fn registry_url_env(&self) -> &'static str {
        "PACKSMITH_TEMPLATE_URL"
    }

    fn template_dir_env(&self) -> &'static str {
        "PACKSMITH_TEMPLATE_DIR"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install packsmith-tools --force"
    }

    fn next_steps(&self, dir: &Path, runtime: Option<Runtime>) -> Vec<String> {
        let mut steps = Vec::new();

        if packsmith_core::workdir::current_dir().ok().as_deref() != Some(dir) {
            steps.push(format!("cd {}", dir.display()));
        }

        match runtime {
            Some(Runtime::NodeJs) => steps.push("npm install".to_string()),
            Some(Runtime::Python) => steps.push(
                "Set up Python environment:\n\
                      python3 -m venv venv && venv/bin/pip install -r requirements.txt"
                    .to_string(),
            ),
            None => {}
        }

        steps.push("Edit the policies, then publish the pack".to_string());
        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "packsmith")]
#[command(about = "CLI for scaffolding policy packs from templates")]
#[command(version)]
pub struct Args {
    /// Enable debug logging (overridden by PACKSMITH_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new policy pack from a template
    New(NewArgs),
    /// Build zip files for all templates in a registry directory (for development use)
    BuildRegistry(BuildRegistryArgs),
}

#[derive(ClapArgs, Debug)]
pub struct NewArgs {
    /// Template to use: a local directory, a URL, or a registry template name
    pub template: String,

    /// Project directory to create (defaults to a fresh temporary directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Only use local templates; never touch the network
    #[arg(long)]
    pub offline: bool,

    /// Write the project files and skip the runtime check
    #[arg(long = "generate-only", short = 'g')]
    pub generate_only: bool,

    /// Project name (defaults to the directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Project description
    #[arg(long)]
    pub description: Option<String>,

    /// Template variable, repeatable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl From<NewArgs> for ScaffoldOptions {
    fn from(args: NewArgs) -> Self {
        ScaffoldOptions {
            offline: args.offline,
            generate_only: args.generate_only,
            destination: args.dir,
            base_dir: None,
            name: args.name,
            description: args.description,
            variables: args.vars.into_iter().collect::<BTreeMap<_, _>>(),
            timeout: args.timeout.map(Duration::from_secs),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct BuildRegistryArgs {
    /// Registry directory containing template.yaml and one folder per template
    #[arg(long = "template-dir", default_value = "templates/policy")]
    pub template_dir: PathBuf,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl+C; never resolves if the handler can't be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run_new(config: &PacksmithConfig, args: NewArgs) -> Result<()> {
    let settings = Settings::from_config(config, CLI_VERSION)?;
    let workflow = ScaffoldWorkflow::new(settings).with_integration(Arc::new(RuntimeCheck));

    let template = args.template.clone();
    let options = ScaffoldOptions::from(args);

    let report = match workflow.run_until(&template, &options, interrupted()).await {
        Ok(report) => report,
        Err(ScaffoldError::Cancelled) => {
            eprintln!("{}", format!("{} cancelled.", config.display_name()).yellow());
            std::process::exit(EXIT_CANCELLED);
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to create project from '{}'", template))
        }
    };

    print_report(config, &report);
    Ok(())
}

fn print_report(config: &PacksmithConfig, report: &ScaffoldReport) {
    println!(
        "{} Created {} from template {}",
        "✓".green(),
        report.destination.display().to_string().bold(),
        report.template_name.cyan()
    );
    if let Some(description) = &report.template_description {
        println!("  {}", description.dimmed());
    }
    println!("  {} file(s) written", report.files.len());

    if report.integration == IntegrationStatus::Skipped {
        return;
    }

    println!("\n{}", "Next steps:".bold());
    for (i, step) in config
        .next_steps(&report.destination, report.runtime)
        .iter()
        .enumerate()
    {
        println!("  {}. {}", i + 1, step);
    }
}

fn run_build_registry(args: BuildRegistryArgs) -> Result<()> {
    println!("Building zip files for templates in {}...\n", args.template_dir.display());

    let built = build_registry(&args.template_dir)?;
    if built.is_empty() {
        return Err(anyhow!(
            "no templates were built from {}",
            args.template_dir.display()
        ));
    }

    for archive in &built {
        println!(
            "  {} {} ({} bytes)",
            "✓".green(),
            archive.path.display(),
            archive.size
        );
    }
    println!("\n{} {} template(s)", "Built".green().bold(), built.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = PacksmithConfig;

    match args.command {
        Command::New(new_args) => run_new(&config, new_args).await,
        Command::BuildRegistry(build_args) => run_build_registry(build_args),
    }
}
