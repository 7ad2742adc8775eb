//! Command implementations. Each returns the process exit code on success.

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use dedup_core::declarations::{project_environment, project_sandbox};
use dedup_core::{EnvironmentSpec, SandboxSpec};
use dedup_executor::{
    discover_suites, export_to_path, fetch_index, version_roots, CommandBackend, ExecutorError,
    Harvester, ProcessBackend, ReviewSweep, SuiteRunner, TestOrchestrator,
};
use dedup_nix::{render_environment, render_sandbox, validate_profile_script, NixProvisioner, Provisioner};

use crate::cli::{
    Command, DownloadArgs, EnterArgs, EnvCommand, Format, RenderArgs, ReviewArgs, SandboxCommand, SpecArgs,
    TestArgs,
};
use crate::report::{results_table, review_report, spawn_progress_reporter};
use crate::CliError;

/// Dispatch a parsed command.
///
/// # Errors
/// Propagates the error of the selected command.
pub async fn run(command: Command) -> Result<u8, CliError> {
    match command {
        Command::Env(EnvCommand::Render(args)) => env_render(&args).await,
        Command::Env(EnvCommand::Enter(args)) => env_enter(&args).await,
        Command::Sandbox(SandboxCommand::Render(args)) => sandbox_render(&args).await,
        Command::Sandbox(SandboxCommand::Check(args)) => sandbox_check(&args).await,
        Command::Sandbox(SandboxCommand::Enter(args)) => sandbox_enter(&args).await,
        Command::Download(args) => download(&args).await,
        Command::Test(args) => test(&args).await,
        Command::Review(args) => review(&args).await,
    }
}

async fn read_spec(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path).await.map_err(|source| CliError::ReadSpec {
        path: path.to_owned(),
        source,
    })
}

async fn load_environment(args: &SpecArgs) -> Result<EnvironmentSpec, CliError> {
    match &args.spec {
        Some(path) => Ok(EnvironmentSpec::from_json(&read_spec(path).await?)?),
        None => Ok(project_environment()),
    }
}

async fn load_sandbox(args: &SpecArgs) -> Result<SandboxSpec, CliError> {
    match &args.spec {
        Some(path) => Ok(SandboxSpec::from_json(&read_spec(path).await?)?),
        None => Ok(project_sandbox()),
    }
}

async fn env_render(args: &RenderArgs) -> Result<u8, CliError> {
    let env = load_environment(&args.spec).await?;
    match args.format {
        Format::Nix => print!("{}", render_environment(&env)),
        Format::Json => println!("{}", env.to_canonical_json()?),
    }
    Ok(0)
}

async fn sandbox_render(args: &RenderArgs) -> Result<u8, CliError> {
    let spec = load_sandbox(&args.spec).await?;
    match args.format {
        Format::Nix => print!("{}", render_sandbox(&spec)),
        Format::Json => println!("{}", spec.describe().to_canonical_json()?),
    }
    Ok(0)
}

async fn sandbox_check(args: &SpecArgs) -> Result<u8, CliError> {
    let spec = load_sandbox(args).await?;
    validate_profile_script(&spec.profile_script).await?;
    let description = spec.describe();
    println!("{}", description.to_canonical_json()?);
    println!("digest {}", description.digest()?);
    Ok(0)
}

async fn env_enter(args: &EnterArgs) -> Result<u8, CliError> {
    let env = load_environment(&args.spec).await?;
    let provisioner = NixProvisioner::new(args.state_dir.clone());
    let materialized = provisioner.materialize_environment(&env).await?;
    enter(&provisioner, &materialized, args.dry_run).await
}

async fn sandbox_enter(args: &EnterArgs) -> Result<u8, CliError> {
    let spec = load_sandbox(&args.spec).await?;
    let provisioner = NixProvisioner::new(args.state_dir.clone());
    if !args.dry_run {
        provisioner.health_check().await?;
    }
    let materialized = provisioner.materialize_sandbox(&spec).await?;
    enter(&provisioner, &materialized, args.dry_run).await
}

async fn enter(
    provisioner: &impl Provisioner,
    materialized: &dedup_nix::Materialized,
    dry_run: bool,
) -> Result<u8, CliError> {
    if dry_run {
        println!("{}", materialized.entry);
        return Ok(0);
    }
    let code = provisioner.enter(materialized).await?;
    Ok(u8::try_from(code).unwrap_or(crate::error::EXIT_FAILURE))
}

async fn download(args: &DownloadArgs) -> Result<u8, CliError> {
    let config = args.config();
    let backend = ProcessBackend::new();
    backend.health_check("git").await?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("elm-dedup/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ExecutorError::from)?;
    let packages = fetch_index(&client, &config.index_url).await?;

    let harvester = Arc::new(Harvester::new(backend, config));
    let summary = harvester.clone_all(packages).await?;
    println!("{summary}");
    Ok(0)
}

async fn test(args: &TestArgs) -> Result<u8, CliError> {
    let config = args.config();
    let runner = SuiteRunner::new(ProcessBackend::new(), &config);
    let orchestrator = TestOrchestrator::new(runner, config.concurrency);

    let stop = orchestrator.stop_flag();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing suites in progress");
            stop.store(true, Ordering::Release);
        }
    });

    let suites = discover_suites(&config.repos_root, &orchestrator.stop_flag()).await?;
    tracing::info!(count = suites.len(), root = %config.repos_root.display(), "suites discovered");

    let interval = Duration::from_secs(args.progress_interval.max(1));
    let reporter = spawn_progress_reporter(orchestrator.board(), interval);
    let result = orchestrator.run(suites).await;
    reporter.abort();
    ctrl_c.abort();
    let reports = result?;

    tracing::info!("{}", orchestrator.board().summary());
    print!("{}", results_table(&reports));

    if let Some(path) = &args.export {
        let rows = export_to_path(path, &reports)?;
        println!("Exported {rows} suites to {}", path.display());
    }
    Ok(0)
}

async fn review(args: &ReviewArgs) -> Result<u8, CliError> {
    let config = args.config();
    let backend = ProcessBackend::new();
    backend.health_check("elm-review").await?;

    tracing::info!(root = %config.repos_root.display(), "listing checkouts");
    let paths = version_roots(&config.repos_root).await?;
    tracing::info!(count = paths.len(), config = %config.review_config.display(), "running elm-review");

    let sweep = Arc::new(ReviewSweep::new(backend, config));
    let summary = sweep.run(paths).await?;
    print!("{}", review_report(&summary));
    Ok(0)
}
