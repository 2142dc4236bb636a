use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use runwatch::config::{AppConfig, Overrides};
use runwatch::platform::github::GitHubPlatform;
use runwatch::report::write_step_output;
use runwatch::runner;

#[derive(Parser)]
#[command(
    name = "runwatch",
    about = "Wait for GitHub check runs or workflow runs and report their conclusion"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// GitHub token (defaults to GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Repository owner
    #[arg(long)]
    owner: Option<String>,

    /// Repository name
    #[arg(long)]
    repo: Option<String>,

    /// Commit SHA or ref to inspect
    #[arg(long = "ref")]
    git_ref: Option<String>,

    /// Check name(s), one per line or as `[a, b]`
    #[arg(long, conflicts_with = "workflow_name")]
    check_name: Option<String>,

    /// Workflow name(s), polled in order, one per line or as `[a, b]`
    #[arg(long)]
    workflow_name: Option<String>,

    /// Total time budget in seconds
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Pause between attempts in seconds
    #[arg(long)]
    interval_seconds: Option<u64>,

    /// How long "nothing found" is tolerated, in seconds
    #[arg(long)]
    warmup_seconds: Option<u64>,

    /// Accepted conclusions, e.g. `success|skipped` or `anyOf(success)`
    #[arg(long)]
    success_conclusions: Option<String>,

    /// Cancel the enclosing workflow run when the conclusion is not a success
    #[arg(long)]
    cancel_on_failure: bool,

    /// Workflow run to cancel (defaults to GITHUB_RUN_ID)
    #[arg(long)]
    run_id: Option<u64>,

    /// Repository `--run-id` belongs to, as `owner/repo` (defaults to GITHUB_REPOSITORY)
    #[arg(long)]
    run_repository: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            token: self.token.clone(),
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            git_ref: self.git_ref.clone(),
            check_name: self.check_name.clone(),
            workflow_name: self.workflow_name.clone(),
            timeout_seconds: self.timeout_seconds,
            interval_seconds: self.interval_seconds,
            warmup_seconds: self.warmup_seconds,
            success_conclusions: self.success_conclusions.clone(),
            cancel_on_failure: self.cancel_on_failure.then_some(true),
            run_id: self.run_id,
            run_repository: self.run_repository.clone(),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "runwatch failed");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref(), &cli.overrides())?;
    let settings = config.settings()?;
    let platform = GitHubPlatform::new(&config.github)?;

    let outcome = runner::execute(&platform, &settings).await?;

    println!("{}", outcome.conclusion);
    if let Some(path) = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from) {
        write_step_output(&path, &outcome.conclusion)?;
    }

    Ok(if outcome.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
