pub mod mapping;

#[cfg(test)]
mod fakes;

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::ConfigError;
use crate::github::{CommentReader, CommentWriter, FileLister, GitHubError};
use crate::pr::{ChangedFile, FileStatus, PrError, PullRequestContext};
use crate::report::notice::{self, MARKER};
use crate::report::FailureReporter;

/// Filename suffix that identifies an AsyncAction definition. Case-sensitive.
pub const ASYNC_ACTION_SUFFIX: &str = "AsyncAction.groovy";

/// Prefix of every failure message handed to the reporter.
pub const FAILURE_PREFIX: &str = "ERRO: Falha ao verificar a criação de AsyncAction: ";

#[derive(Debug, Error)]
pub enum AnnotateError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Context(#[from] PrError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid source pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// How a successful invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A comment with the marker already exists; nothing was fetched or posted.
    AlreadyAnnotated,
    /// No added file matches the AsyncAction suffix.
    NoNewAsyncAction,
    /// The advisory was posted because of `filename`.
    Annotated { filename: String },
    /// The advisory would have been posted, but dry-run was on.
    DryRun { filename: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::AlreadyAnnotated => write!(f, "already annotated"),
            Outcome::NoNewAsyncAction => write!(f, "no new AsyncAction"),
            Outcome::Annotated { filename } => write!(f, "annotated ({filename})"),
            Outcome::DryRun { filename } => write!(f, "dry run ({filename})"),
        }
    }
}

/// True for a file the PR adds whose name ends with `AsyncAction.groovy`.
pub fn is_new_async_action(file: &ChangedFile) -> bool {
    file.status == FileStatus::Added && file.filename.ends_with(ASYNC_ACTION_SUFFIX)
}

/// Posts the AsyncAction indexing advisory on a pull request, at most once.
pub struct Annotator<'a> {
    comments: &'a dyn CommentReader,
    files: &'a dyn FileLister,
    writer: &'a dyn CommentWriter,
    docs_url: String,
    dry_run: bool,
}

impl<'a> Annotator<'a> {
    pub fn new(
        comments: &'a dyn CommentReader,
        files: &'a dyn FileLister,
        writer: &'a dyn CommentWriter,
        docs_url: impl Into<String>,
    ) -> Self {
        Self {
            comments,
            files,
            writer,
            docs_url: docs_url.into(),
            dry_run: false,
        }
    }

    /// Log the comment instead of posting it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check the PR and post the advisory if it adds an AsyncAction and
    /// does not carry the advisory yet.
    ///
    /// Two invocations racing on the same PR can both pass the marker check
    /// and post twice. There is no lock on the platform side.
    #[instrument(skip(self), fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number))]
    pub async fn run(&self, ctx: &PullRequestContext) -> Result<Outcome, AnnotateError> {
        let comments = self.comments.list_comments(ctx).await?;
        info!(comments = comments.len(), "fetched existing comments");

        if comments.iter().any(|comment| comment.body.contains(MARKER)) {
            info!("advisory already posted, skipping");
            return Ok(Outcome::AlreadyAnnotated);
        }

        let files = self.files.list_changed_files(ctx).await?;
        info!(files = files.len(), "fetched changed files");

        let Some(file) = files.iter().find(|file| is_new_async_action(file)) else {
            info!("no new AsyncAction in this PR");
            return Ok(Outcome::NoNewAsyncAction);
        };
        let filename = file.filename.clone();
        debug!(filename = %filename, "found new AsyncAction");

        let body = notice::render(&self.docs_url);
        if self.dry_run {
            info!(filename = %filename, "dry run, not posting advisory");
            debug!(body = %body, "advisory body");
            return Ok(Outcome::DryRun { filename });
        }

        self.writer.create_comment(ctx, &body).await?;
        info!(filename = %filename, "advisory posted");
        Ok(Outcome::Annotated { filename })
    }
}

/// Hand `err` to the reporter with the fixed failure prefix.
pub fn report_error(reporter: &dyn FailureReporter, err: &AnnotateError) {
    reporter.report_failure(&format!("{FAILURE_PREFIX}{err}"));
}

/// Turn a check result into an `Option`, reporting the error once under
/// `prefix`. Nothing is re-raised.
pub fn contain<T>(
    result: Result<T, AnnotateError>,
    prefix: &str,
    reporter: &dyn FailureReporter,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            reporter.report_failure(&format!("{prefix}{err}"));
            None
        }
    }
}

/// Run the annotator and contain any error.
pub async fn run_and_report(
    annotator: &Annotator<'_>,
    ctx: &PullRequestContext,
    reporter: &dyn FailureReporter,
) -> Option<Outcome> {
    contain(annotator.run(ctx).await, FAILURE_PREFIX, reporter)
}
