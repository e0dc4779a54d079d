pub mod types;

pub use types::{ChangedFile, Comment, FileStatus, PullRequestContext, PullRequestRefs};

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Missing pull request context: {0}")]
    MissingContext(String),

    #[error("Failed to read event payload: {0}")]
    EventRead(#[from] std::io::Error),

    #[error("Failed to parse event payload: {0}")]
    EventParse(#[from] serde_json::Error),
}

/// Parse a GitHub PR URL into its component parts.
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
pub fn parse_pr_url(url: &str) -> Result<PullRequestContext, PrError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| PrError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(PrError::InvalidUrl(url.to_string()));
    }

    let pr_number = segments[3]
        .parse::<u64>()
        .map_err(|_| PrError::InvalidUrl(url.to_string()))?;

    Ok(PullRequestContext {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

#[derive(Deserialize)]
struct NumberRef {
    number: u64,
}

/// The slice of a webhook payload that carries the PR number.
#[derive(Deserialize)]
struct EventPayload {
    number: Option<u64>,
    pull_request: Option<NumberRef>,
    issue: Option<NumberRef>,
}

impl PullRequestContext {
    /// Build the context from `"owner/repo"` and a webhook event payload.
    ///
    /// The PR number comes from `pull_request.number`, then the top-level
    /// `number`, then `issue.number`, in that order.
    pub fn from_event(repository: &str, event_json: &str) -> Result<Self, PrError> {
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| {
                PrError::MissingContext(format!("repository must be owner/repo, got {repository:?}"))
            })?;

        let payload: EventPayload = serde_json::from_str(event_json)?;
        let pr_number = payload
            .pull_request
            .map(|pr| pr.number)
            .or(payload.number)
            .or(payload.issue.map(|issue| issue.number))
            .ok_or_else(|| {
                PrError::MissingContext("event payload has no pull request number".to_string())
            })?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number,
        })
    }

    /// Read the context the way a GitHub Actions step sees it:
    /// `GITHUB_REPOSITORY` plus the JSON file at `GITHUB_EVENT_PATH`.
    pub fn from_actions_env() -> Result<Self, PrError> {
        let repository = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| PrError::MissingContext("GITHUB_REPOSITORY is not set".to_string()))?;
        let event_path = std::env::var("GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .map_err(|_| PrError::MissingContext("GITHUB_EVENT_PATH is not set".to_string()))?;

        debug!(repository = %repository, event_path = %event_path.display(), "reading actions event");
        let event_json = std::fs::read_to_string(&event_path)?;
        Self::from_event(&repository, &event_json)
    }
}
