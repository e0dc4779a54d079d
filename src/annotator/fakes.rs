//! In-memory platform and reporter shared by the check tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::github::{CommentReader, CommentWriter, ContentReader, FileLister, GitHubError};
use crate::pr::{ChangedFile, Comment, FileStatus, PullRequestContext, PullRequestRefs};
use crate::report::FailureReporter;

pub const HEAD_SHA: &str = "h34d";
pub const BASE_SHA: &str = "b45e";

/// Stand-in for the platform. Files are served as pages and flattened, the
/// way the real client follows pagination. Contents are keyed by (path, sha).
#[derive(Default)]
pub struct FakePlatform {
    pub comments: Vec<Comment>,
    pub pages: Vec<Vec<ChangedFile>>,
    pub contents: HashMap<(String, String), String>,
    pub fail_comments: Option<String>,
    pub fail_files: Option<String>,
    pub fail_create: Option<String>,
    pub fail_contents: Option<String>,
    pub file_calls: AtomicUsize,
    pub ref_calls: AtomicUsize,
    pub created: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn with(comments: &[&str], files: &[(&str, FileStatus)]) -> Self {
        Self {
            comments: comments.iter().map(|body| comment(body)).collect(),
            pages: vec![files.iter().map(|(name, status)| file(name, *status)).collect()],
            ..Default::default()
        }
    }

    /// Register `path` as modified with `patch`, holding `before` at the base
    /// commit and `after` at the head commit.
    pub fn modify(&mut self, path: &str, patch: Option<&str>, before: &str, after: &str) {
        let changed = ChangedFile {
            patch: patch.map(str::to_string),
            ..file(path, FileStatus::Modified)
        };
        match self.pages.last_mut() {
            Some(page) => page.push(changed),
            None => self.pages.push(vec![changed]),
        }
        self.contents
            .insert((path.to_string(), BASE_SHA.to_string()), before.to_string());
        self.contents
            .insert((path.to_string(), HEAD_SHA.to_string()), after.to_string());
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

fn api_error(message: &str) -> GitHubError {
    GitHubError::Api {
        status: 504,
        message: message.to_string(),
    }
}

#[async_trait]
impl CommentReader for FakePlatform {
    async fn list_comments(&self, _: &PullRequestContext) -> Result<Vec<Comment>, GitHubError> {
        match &self.fail_comments {
            Some(message) => Err(api_error(message)),
            None => Ok(self.comments.clone()),
        }
    }
}

#[async_trait]
impl FileLister for FakePlatform {
    async fn list_changed_files(
        &self,
        _: &PullRequestContext,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_files {
            Some(message) => Err(api_error(message)),
            None => Ok(self.pages.iter().flatten().cloned().collect()),
        }
    }
}

#[async_trait]
impl CommentWriter for FakePlatform {
    async fn create_comment(&self, _: &PullRequestContext, body: &str) -> Result<(), GitHubError> {
        if let Some(message) = &self.fail_create {
            return Err(api_error(message));
        }
        self.created.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

#[async_trait]
impl ContentReader for FakePlatform {
    async fn pull_request_refs(
        &self,
        _: &PullRequestContext,
    ) -> Result<PullRequestRefs, GitHubError> {
        self.ref_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequestRefs {
            head_sha: HEAD_SHA.to_string(),
            base_sha: BASE_SHA.to_string(),
        })
    }

    async fn file_contents(
        &self,
        _: &PullRequestContext,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>, GitHubError> {
        if let Some(message) = &self.fail_contents {
            return Err(api_error(message));
        }
        Ok(self
            .contents
            .get(&(path.to_string(), git_ref.to_string()))
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl FailureReporter for RecordingReporter {
    fn report_failure(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub fn comment(body: &str) -> Comment {
    Comment {
        body: body.to_string(),
    }
}

pub fn file(name: &str, status: FileStatus) -> ChangedFile {
    ChangedFile {
        filename: name.to_string(),
        status,
        patch: None,
    }
}

pub fn ctx() -> PullRequestContext {
    PullRequestContext {
        owner: "acme".to_string(),
        repo: "payments".to_string(),
        pr_number: 7,
    }
}
