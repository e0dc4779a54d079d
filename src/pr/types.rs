use serde::{Deserialize, Deserializer};

/// Coordinates of the pull request an invocation works on.
/// Derived once per run, either from the CI event or from a PR URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

/// An existing comment on the pull request. Only the body is read.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    /// Comment text. GitHub may send `null` here; it is read as "".
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

/// A file touched by the pull request, as listed by `GET /pulls/{n}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root (e.g., "billing/ChargebackAsyncAction.groovy")
    pub filename: String,
    /// How the file differs from the base branch
    pub status: FileStatus,
    /// Unified diff hunk text. GitHub omits it for binary or very large diffs.
    #[serde(default)]
    pub patch: Option<String>,
}

/// Commits a pull request compares: the PR branch tip and the base it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRefs {
    pub head_sha: String,
    pub base_sha: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    #[serde(other)]
    Unknown,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_file_from_api_json() {
        let json = r#"{"sha":"abc","filename":"billing/ChargebackAsyncAction.groovy","status":"added","additions":40}"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "billing/ChargebackAsyncAction.groovy");
        assert_eq!(file.status, FileStatus::Added);
        assert!(file.patch.is_none());
    }

    #[test]
    fn test_changed_file_keeps_patch() {
        let json = r#"{"filename":"a.groovy","status":"modified","patch":"@@ -1 +1 @@\n-old\n+new"}"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.patch.as_deref(), Some("@@ -1 +1 @@\n-old\n+new"));
    }

    #[test]
    fn test_unknown_status_is_not_an_error() {
        let file: ChangedFile =
            serde_json::from_str(r#"{"filename":"a.groovy","status":"archived"}"#).unwrap();
        assert_eq!(file.status, FileStatus::Unknown);
    }

    #[test]
    fn test_null_comment_body() {
        let comment: Comment = serde_json::from_str(r#"{"id":1,"body":null}"#).unwrap();
        assert_eq!(comment.body, "");
        let comment: Comment = serde_json::from_str(r#"{"id":2}"#).unwrap();
        assert_eq!(comment.body, "");
    }
}
