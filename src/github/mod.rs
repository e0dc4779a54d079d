pub mod client;

pub use client::GitHubClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::pr::{ChangedFile, Comment, PullRequestContext, PullRequestRefs};

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GitHub token not found in config or environment")]
    MissingToken,

    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(String),
}

/// Reads the comments already posted on a pull request.
#[async_trait]
pub trait CommentReader: Send + Sync {
    async fn list_comments(&self, ctx: &PullRequestContext) -> Result<Vec<Comment>, GitHubError>;
}

/// Lists every file changed by a pull request.
/// Implementations hide pagination: the caller always gets the full list.
#[async_trait]
pub trait FileLister: Send + Sync {
    async fn list_changed_files(
        &self,
        ctx: &PullRequestContext,
    ) -> Result<Vec<ChangedFile>, GitHubError>;
}

/// Posts a new comment on a pull request.
#[async_trait]
pub trait CommentWriter: Send + Sync {
    async fn create_comment(&self, ctx: &PullRequestContext, body: &str) -> Result<(), GitHubError>;
}

/// Reads file contents at the commits a pull request compares.
#[async_trait]
pub trait ContentReader: Send + Sync {
    async fn pull_request_refs(&self, ctx: &PullRequestContext)
        -> Result<PullRequestRefs, GitHubError>;

    /// Contents of `path` at `git_ref`, or `None` when the file does not exist there.
    async fn file_contents(
        &self,
        ctx: &PullRequestContext,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>, GitHubError>;
}
