use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{CommentReader, CommentWriter, ContentReader, FileLister, GitHubError};
use crate::config::Config;
use crate::pr::{ChangedFile, Comment, PullRequestContext, PullRequestRefs};

const PER_PAGE: u32 = 100;
const API_VERSION: &str = "2022-11-28";
const JSON_CONTENT: &str = "application/vnd.github+json";
const RAW_CONTENT: &str = "application/vnd.github.raw+json";

/// REST client for the three calls the hook makes.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, GitHubError> {
        let token = config.github_token().ok_or(GitHubError::MissingToken)?;
        Ok(Self::new(config.api_url(), token))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.request_accepting(method, url, JSON_CONTENT)
    }

    fn request_accepting(&self, method: Method, url: &str, accept: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(USER_AGENT, "asyncaction-notice")
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(&self.token)
    }

    fn repo_url(&self, ctx: &PullRequestContext, rest: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, ctx.owner, ctx.repo, rest)
    }

    /// GET every page of a list endpoint, following `Link: rel="next"`.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, GitHubError> {
        let mut next = Some(format!("{url}?per_page={PER_PAGE}&page=1"));
        let mut items = Vec::new();
        let mut page = 0;

        while let Some(url) = next.take() {
            page += 1;
            let response = check_status(self.request(Method::GET, &url).send().await?).await?;
            next = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_next_link);

            let mut batch: Vec<T> = response.json().await?;
            debug!(page, items = batch.len(), has_next = next.is_some(), "fetched page");
            items.append(&mut batch);
        }

        Ok(items)
    }
}

#[async_trait]
impl CommentReader for GitHubClient {
    #[instrument(skip(self), fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number))]
    async fn list_comments(&self, ctx: &PullRequestContext) -> Result<Vec<Comment>, GitHubError> {
        let url = self.repo_url(ctx, &format!("issues/{}/comments", ctx.pr_number));
        self.get_all_pages(&url).await
    }
}

#[async_trait]
impl FileLister for GitHubClient {
    #[instrument(skip(self), fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number))]
    async fn list_changed_files(
        &self,
        ctx: &PullRequestContext,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        let url = self.repo_url(ctx, &format!("pulls/{}/files", ctx.pr_number));
        self.get_all_pages(&url).await
    }
}

#[async_trait]
impl CommentWriter for GitHubClient {
    #[instrument(skip(self, body), fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number))]
    async fn create_comment(&self, ctx: &PullRequestContext, body: &str) -> Result<(), GitHubError> {
        let url = self.repo_url(ctx, &format!("issues/{}/comments", ctx.pr_number));
        let response = self
            .request(Method::POST, &url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;
        check_status(response).await?;
        debug!(body_bytes = body.len(), "comment created");
        Ok(())
    }
}

#[async_trait]
impl ContentReader for GitHubClient {
    #[instrument(skip(self), fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.pr_number))]
    async fn pull_request_refs(
        &self,
        ctx: &PullRequestContext,
    ) -> Result<PullRequestRefs, GitHubError> {
        #[derive(Deserialize)]
        struct Ref {
            sha: String,
        }

        #[derive(Deserialize)]
        struct PullResponse {
            head: Ref,
            base: Ref,
        }

        let url = self.repo_url(ctx, &format!("pulls/{}", ctx.pr_number));
        let response = check_status(self.request(Method::GET, &url).send().await?).await?;
        let pull = response.json::<PullResponse>().await?;
        debug!(head = %pull.head.sha, base = %pull.base.sha, "resolved pull request refs");

        Ok(PullRequestRefs {
            head_sha: pull.head.sha,
            base_sha: pull.base.sha,
        })
    }

    #[instrument(skip(self, ctx), fields(owner = %ctx.owner, repo = %ctx.repo))]
    async fn file_contents(
        &self,
        ctx: &PullRequestContext,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<String>, GitHubError> {
        let base = self.repo_url(ctx, "contents");
        let mut url = Url::parse(&base).map_err(|_| GitHubError::InvalidUrl(base.clone()))?;
        url.path_segments_mut()
            .map_err(|_| GitHubError::InvalidUrl(base.clone()))?
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        url.query_pairs_mut().append_pair("ref", git_ref);

        let response = self
            .request_accepting(Method::GET, url.as_str(), RAW_CONTENT)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("file not present at ref");
            return Ok(None);
        }

        let text = check_status(response).await?.text().await?;
        debug!(bytes = text.len(), "fetched file contents");
        Ok(Some(text))
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turn a non-2xx response into `GitHubError::Api`, keeping GitHub's `message`.
async fn check_status(response: Response) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                text
            }
        });

    Err(GitHubError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extract the `rel="next"` target from a `Link` header, if any.
///
/// `<https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"`
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';').map(str::trim);
        let target = parts.next()?.strip_prefix('<')?.strip_suffix('>')?;
        parts
            .any(|param| param == r#"rel="next""# || param == "rel=next")
            .then(|| target.to_string())
    })
}
