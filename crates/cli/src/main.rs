use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deploy_import::{BundleManifest, ImportSession, TextIntrospector, TextRewriter};
use settings::Overrides;
use std::path::PathBuf;

mod catalog;
mod settings;

#[derive(Parser)]
#[command(name = "deploy-plan")]
#[command(about = "Plan the import of an asset bundle", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Order a bundle for import and compute relocated identities
    Plan(PlanArgs),

    /// Print the JSON schema of the import plan
    Schema,
}

#[derive(Args)]
struct PlanArgs {
    /// Bundle manifest (JSON)
    manifest: PathBuf,

    /// Re-root relocatable assets under this folder ("/" for the top level)
    #[arg(long)]
    target_folder: Option<String>,

    /// New owner for user-scoped assets
    #[arg(long)]
    target_owner: Option<String>,

    /// Import configuration (TOML); flags take precedence
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Identifiers already present in the target repository, one per line
    #[arg(long)]
    existing: Option<PathBuf>,

    /// Rewrite references in the bundle's asset files
    #[arg(long)]
    apply: bool,

    /// Pretty-print the plan
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Plan(args) => run_plan(args)?,
        Commands::Schema => run_schema()?,
    }

    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let config = settings::resolve_config(
        args.config.as_deref(),
        Overrides {
            target_folder: args.target_folder,
            target_owner: args.target_owner,
        },
    )?;
    let manifest = BundleManifest::load(&args.manifest)
        .with_context(|| format!("Failed to load bundle {}", args.manifest.display()))?;
    let existing = match &args.existing {
        Some(path) => catalog::load_existing(path)?,
        None => Default::default(),
    };

    let mut session = ImportSession::new(config, &TextIntrospector)?;
    if args.existing.is_some() {
        session = session.with_catalog(&existing);
    }

    let mut rewriter = if args.apply {
        TextRewriter::new()
    } else {
        TextRewriter::dry_run()
    };
    let plan = session.plan_manifest(&manifest, &mut rewriter)?;

    let touched = rewriter.rewrites().iter().filter(|r| r.replacements > 0).count();
    if args.apply {
        log::info!("Rewrote references in {touched} asset files");
    } else if touched > 0 {
        log::info!("{touched} asset files reference renamed assets; rerun with --apply to rewrite them");
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&plan)?
    } else {
        serde_json::to_string(&plan)?
    };
    println!("{json}");
    Ok(())
}

fn run_schema() -> Result<()> {
    let schema = deploy_protocol::plan_schema()?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
