/// GitHub REST client
///
/// Talks to `/search/issues` and `/repos/{owner}/{repo}/pulls/{n}/merge`.
/// The token is optional; without it GitHub applies its anonymous rate
/// limits.

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{GitHubError, PullRequestSource, RepoRef, SearchItem};
use crate::config::GitHubConfig;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT));
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("standup/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        tracing::info!(
            api_url = %config.api_url,
            authenticated = config.token.is_some(),
            "Initialized GitHub client"
        );

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(format!("{}{}", self.api_url, path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn search_pull_requests(
        &self,
        repo: &RepoRef,
        username: &str,
        limit: u32,
    ) -> Result<Vec<SearchItem>, GitHubError> {
        let query = format!("repo:{} is:pr involves:{}", repo, username);
        let per_page = limit.to_string();

        let response = self
            .get("/search/issues")
            .query(&[
                ("q", query.as_str()),
                ("sort", "updated"),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GitHubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        tracing::debug!(repo = %repo, username, count = body.items.len(), "GitHub search finished");

        Ok(body.items)
    }

    async fn is_merged(&self, repo: &RepoRef, number: u64) -> Result<bool, GitHubError> {
        let response = self
            .get(&format!(
                "/repos/{}/{}/pulls/{}/merge",
                repo.owner, repo.repo, number
            ))
            .send()
            .await?;

        // 204 = merged, 404 = not merged; anything else is not merged either
        Ok(response.status() == StatusCode::NO_CONTENT)
    }
}
