/// GitHub pull request view
///
/// Searches the pull requests a user is involved in within one repository,
/// then checks which of them are merged. The merge checks run concurrently
/// and share a single deadline; a check that misses it counts as not merged
/// so a slow GitHub never holds up the response.
///
/// The HTTP side sits behind [`PullRequestSource`] so handlers can be driven
/// by an in-memory source in tests.

pub mod client;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

pub use client::GitHubClient;

/// Maximum characters of PR body kept in the response
pub const BODY_LIMIT: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// A repository in `owner/repo` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parses a stored or user-entered project
    ///
    /// Accepts `owner/repo` or a `https://github.com/owner/repo` URL. Both
    /// parts may only contain ASCII letters, digits, `_`, `.` and `-`.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let path = ["https://github.com/", "http://github.com/"]
            .iter()
            .find_map(|prefix| strip_prefix_ignore_case(trimmed, prefix))
            .unwrap_or(trimmed);

        let (owner, repo) = path.split_once('/')?;
        if !is_github_name(owner) || !is_github_name(repo) {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// "See all" link on github.com filtered to `username`'s involvement
    pub fn see_all_url(&self, username: &str) -> String {
        format!(
            "https://github.com/{}/{}/pulls?q=is%3Apr+involves%3A{}",
            self.owner, self.repo, username
        )
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &value[prefix.len()..])
}

fn is_github_name(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Normalizes a GitHub handle: trims and drops a leading `@`
///
/// Returns `None` for blank handles or ones with characters GitHub never
/// allows, which keeps the handle safe to splice into URLs and queries.
pub fn normalize_username(input: &str) -> Option<String> {
    let handle = input.trim();
    let handle = handle.strip_prefix('@').unwrap_or(handle);
    is_github_name(handle).then(|| handle.to_string())
}

/// Issue search hit, reduced to what the view needs
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub state: String,
    pub user: Option<SearchUser>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchUser {
    pub login: String,
    pub avatar_url: String,
    pub html_url: String,
}

/// One rendered pull request
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestView {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub merged: bool,
    pub author_login: Option<String>,
    pub author_avatar_url: Option<String>,
    pub author_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub body: String,
}

impl PullRequestView {
    fn from_item(item: SearchItem, merged: bool) -> Self {
        let (author_login, author_avatar_url, author_url) = match item.user {
            Some(u) => (Some(u.login), Some(u.avatar_url), Some(u.html_url)),
            None => (None, None, None),
        };

        Self {
            number: item.number,
            title: item.title,
            url: item.html_url,
            state: item.state,
            merged,
            author_login,
            author_avatar_url,
            author_url,
            created_at: item.created_at,
            body: truncate_body(item.body.as_deref(), BODY_LIMIT),
        }
    }
}

/// Source of pull request data
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Most recently updated PRs in `repo` that involve `username`
    async fn search_pull_requests(
        &self,
        repo: &RepoRef,
        username: &str,
        limit: u32,
    ) -> Result<Vec<SearchItem>, GitHubError>;

    /// Whether PR `number` has been merged
    async fn is_merged(&self, repo: &RepoRef, number: u64) -> Result<bool, GitHubError>;
}

/// Cuts `body` to `limit` characters, appending `…` when anything was cut
pub fn truncate_body(body: Option<&str>, limit: usize) -> String {
    let Some(body) = body else {
        return String::new();
    };

    match body.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

/// Checks merge status for every PR number concurrently
///
/// All checks race the same deadline `budget` from now. Results that arrive
/// in time are kept; errors and late checks read as not merged, and late
/// requests are dropped.
pub async fn merge_flags(
    source: &dyn PullRequestSource,
    repo: &RepoRef,
    numbers: &[u64],
    budget: Duration,
) -> Vec<bool> {
    let deadline = Instant::now() + budget;

    let checks = numbers.iter().map(|&number| async move {
        match tokio::time::timeout_at(deadline, source.is_merged(repo, number)).await {
            Ok(Ok(merged)) => merged,
            Ok(Err(e)) => {
                tracing::debug!(repo = %repo, number, error = %e, "Merge check failed");
                false
            }
            Err(_) => {
                tracing::debug!(repo = %repo, number, "Merge check timed out");
                false
            }
        }
    });

    join_all(checks).await
}

/// Searches PRs and enriches them with merge status
///
/// # Errors
///
/// Fails only if the search itself fails; merge checks never fail the call.
pub async fn latest_pull_requests(
    source: &dyn PullRequestSource,
    repo: &RepoRef,
    username: &str,
    limit: u32,
    merge_budget: Duration,
) -> Result<Vec<PullRequestView>, GitHubError> {
    let items = source.search_pull_requests(repo, username, limit).await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let numbers: Vec<u64> = items.iter().map(|item| item.number).collect();
    let merged = merge_flags(source, repo, &numbers, merge_budget).await;

    Ok(items
        .into_iter()
        .zip(merged)
        .map(|(item, merged)| PullRequestView::from_item(item, merged))
        .collect())
}
