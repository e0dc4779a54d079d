mod annotator;
mod config;
mod github;
mod pr;
mod report;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use annotator::mapping::{self, MappingCheck};
use annotator::{AnnotateError, Annotator};
use github::GitHubClient;
use pr::PullRequestContext;
use report::WorkflowReporter;

/// AsyncAction Notice: pull request hook that warns authors about the database
/// indexes new or remapped AsyncActions need before they are deployed.
#[derive(Parser, Debug)]
#[command(name = "asyncaction-notice", version, about)]
struct Cli {
    /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
    ///
    /// When omitted, the PR is read from the GitHub Actions environment
    /// (GITHUB_REPOSITORY and GITHUB_EVENT_PATH).
    pr_url: Option<String>,

    /// Config file path (defaults to .asyncaction-notice.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Decide and log, but never post comments
    #[arg(long)]
    dry_run: bool,

    /// Which check to run
    #[arg(long, value_enum, default_value_t = Check::All)]
    check: Check,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Check {
    /// Warn when a PR adds a new `*AsyncAction.groovy` file
    NewAsyncAction,
    /// Checklist when a BaseAsyncAction switches to `applyBaseMappingWithIndex`
    IndexMapping,
    /// Both checks
    All,
}

impl Check {
    fn includes(self, other: Check) -> bool {
        self == Check::All || self == other
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reporter = WorkflowReporter::from_env();

    let (config, ctx, client) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(err) => {
            annotator::report_error(&reporter, &err);
            return ExitCode::FAILURE;
        }
    };

    let span = info_span!("asyncaction_notice", owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number);
    let mut failed = false;

    if cli.check.includes(Check::NewAsyncAction) {
        let annotator =
            Annotator::new(&client, &client, &client, config.docs_url()).dry_run(cli.dry_run);
        match annotator::run_and_report(&annotator, &ctx, &reporter)
            .instrument(span.clone())
            .await
        {
            Some(outcome) => info!(check = "new-async-action", outcome = %outcome, "done"),
            None => failed = true,
        }
    }

    if cli.check.includes(Check::IndexMapping) {
        let check = MappingCheck::new(&client, &client, &client, &client).dry_run(cli.dry_run);
        match mapping::run_and_report(&check, &ctx, &reporter)
            .instrument(span)
            .await
        {
            Some(outcome) => info!(check = "index-mapping", outcome = %outcome, "done"),
            None => failed = true,
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve config, PR coordinates and the API client. Any failure here is
/// reported the same way as a failure of the run itself.
fn prepare(cli: &Cli) -> Result<(config::Config, PullRequestContext, GitHubClient), AnnotateError> {
    let config = match &cli.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load()?,
    };

    let ctx = match cli.pr_url.as_deref() {
        Some(url) => pr::parse_pr_url(url)?,
        None => PullRequestContext::from_actions_env()?,
    };
    debug!(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number, "resolved pull request");

    let client = GitHubClient::from_config(&config)?;
    Ok((config, ctx, client))
}
