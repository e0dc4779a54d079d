//! Pre-deploy checklist for BaseAsyncAction classes that switch from
//! `applyBaseMapping` to `applyBaseMappingWithIndex`.
//!
//! The switch makes the ORM expect indexes that must already exist in the
//! database, so the PR gets a checklist asking for a DBA pre-deploy script.

use std::fmt;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use super::{contain, AnnotateError};
use crate::github::{CommentReader, CommentWriter, ContentReader, FileLister};
use crate::pr::{ChangedFile, FileStatus, PullRequestContext};
use crate::report::notice;
use crate::report::FailureReporter;

/// Prefix of failure messages from this check.
pub const FAILURE_PREFIX: &str = "ERRO: Falha ao verificar a troca para applyBaseMappingWithIndex: ";

/// Source patterns the check looks for in Groovy files.
pub struct MappingPatterns {
    extends_base: Regex,
    base_mapping: Regex,
    base_mapping_with_index: Regex,
}

impl MappingPatterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            extends_base: Regex::new(r"class\s+(\w+)\s+extends\s+BaseAsyncAction")?,
            base_mapping: Regex::new(r"\bapplyBaseMapping\b")?,
            base_mapping_with_index: Regex::new(r"\bapplyBaseMappingWithIndex\b")?,
        })
    }

    /// Name of the first class in `source` declared as `extends BaseAsyncAction`.
    pub fn base_async_action_class<'s>(&self, source: &'s str) -> Option<&'s str> {
        self.extends_base
            .captures(source)
            .and_then(|caps| caps.get(1))
            .map(|name| name.as_str())
    }

    /// Decide whether a file migrated to `applyBaseMappingWithIndex`.
    ///
    /// `after` must declare a BaseAsyncAction and use the indexed mapping,
    /// `before` must use the plain one. With a patch, the patch itself must
    /// remove a plain-mapping line and add an indexed one. Without a patch,
    /// `after` must no longer mention the plain mapping.
    ///
    /// Returns the class name when it did.
    pub fn detect_migration(
        &self,
        before: &str,
        after: &str,
        patch: Option<&str>,
    ) -> Option<String> {
        let class_name = self.base_async_action_class(after)?;

        if !(self.base_mapping_with_index.is_match(after) && self.base_mapping.is_match(before)) {
            return None;
        }

        let migrated = match patch.filter(|patch| !patch.is_empty()) {
            Some(patch) => {
                let removed = patch
                    .lines()
                    .any(|line| line.starts_with('-') && self.base_mapping.is_match(line));
                let added = patch
                    .lines()
                    .any(|line| line.starts_with('+') && self.base_mapping_with_index.is_match(line));
                removed && added
            }
            None => !self.base_mapping.is_match(after),
        };

        migrated.then(|| class_name.to_string())
    }
}

/// A BaseAsyncAction that moved to the indexed mapping in this PR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub class_name: String,
    pub filename: String,
}

/// What the check found, split by what happened to each checklist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOutcome {
    /// Checklists posted by this run
    pub posted: Vec<Migration>,
    /// Migrations whose checklist is already on the PR
    pub already_commented: Vec<Migration>,
    /// Checklists that would have been posted with dry-run off
    pub dry_run: Vec<Migration>,
}

impl fmt::Display for MappingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posted, {} already commented, {} dry run",
            self.posted.len(),
            self.already_commented.len(),
            self.dry_run.len()
        )
    }
}

fn is_modified_groovy(file: &ChangedFile) -> bool {
    file.status == FileStatus::Modified && file.filename.ends_with(".groovy")
}

/// Posts one checklist per migrated BaseAsyncAction, skipping files whose
/// checklist is already on the PR.
pub struct MappingCheck<'a> {
    comments: &'a dyn CommentReader,
    files: &'a dyn FileLister,
    contents: &'a dyn ContentReader,
    writer: &'a dyn CommentWriter,
    dry_run: bool,
}

impl<'a> MappingCheck<'a> {
    pub fn new(
        comments: &'a dyn CommentReader,
        files: &'a dyn FileLister,
        contents: &'a dyn ContentReader,
        writer: &'a dyn CommentWriter,
    ) -> Self {
        Self {
            comments,
            files,
            contents,
            writer,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(skip(self), fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number))]
    pub async fn run(&self, ctx: &PullRequestContext) -> Result<MappingOutcome, AnnotateError> {
        let patterns = MappingPatterns::new()?;
        let mut outcome = MappingOutcome::default();

        let files = self.files.list_changed_files(ctx).await?;
        let candidates: Vec<&ChangedFile> = files.iter().filter(|file| is_modified_groovy(file)).collect();
        info!(files = files.len(), candidates = candidates.len(), "fetched changed files");
        if candidates.is_empty() {
            return Ok(outcome);
        }

        let refs = self.contents.pull_request_refs(ctx).await?;
        let comments = self.comments.list_comments(ctx).await?;

        for file in candidates {
            let after = self.contents_at(ctx, &file.filename, &refs.head_sha).await;
            let before = self.contents_at(ctx, &file.filename, &refs.base_sha).await;
            let (Some(before), Some(after)) = (before, after) else {
                debug!(filename = %file.filename, "contents missing at head or base, skipping");
                continue;
            };
            if before.is_empty() || after.is_empty() {
                continue;
            }

            let Some(class_name) = patterns.detect_migration(&before, &after, file.patch.as_deref())
            else {
                debug!(filename = %file.filename, "no indexed mapping migration");
                continue;
            };
            let migration = Migration {
                class_name,
                filename: file.filename.clone(),
            };

            let key = notice::mapping_checklist_key(&migration.class_name, &migration.filename);
            if comments.iter().any(|comment| comment.body.contains(&key)) {
                info!(filename = %migration.filename, "checklist already posted, skipping");
                outcome.already_commented.push(migration);
                continue;
            }

            if self.dry_run {
                info!(class = %migration.class_name, filename = %migration.filename, "dry run, not posting checklist");
                outcome.dry_run.push(migration);
                continue;
            }

            let body = notice::render_mapping_checklist(&migration.class_name, &migration.filename);
            self.writer.create_comment(ctx, &body).await?;
            info!(class = %migration.class_name, filename = %migration.filename, "checklist posted");
            outcome.posted.push(migration);
        }

        Ok(outcome)
    }

    /// A file that cannot be read at one of the refs is skipped, not fatal.
    async fn contents_at(&self, ctx: &PullRequestContext, path: &str, sha: &str) -> Option<String> {
        match self.contents.file_contents(ctx, path, sha).await {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path, sha = %sha, error = %err, "could not read file contents");
                None
            }
        }
    }
}

/// Run the check and contain any error.
pub async fn run_and_report(
    check: &MappingCheck<'_>,
    ctx: &PullRequestContext,
    reporter: &dyn FailureReporter,
) -> Option<MappingOutcome> {
    contain(check.run(ctx).await, FAILURE_PREFIX, reporter)
}
